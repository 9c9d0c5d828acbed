use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::StartupError;

use super::input::ActionSource;
use super::metrics::{TickSample, TickWindow};
use super::scene::{SceneCommand, SceneError, SceneMachine};
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_ticks: Option<u64>,
    pub realtime: bool,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks: None,
            realtime: false,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("scene transition failed: {0}")]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    TickLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub exit_reason: ExitReason,
}

/// Drives the active scene at a fixed tick without a window.
///
/// Each tick drains the action source, routes every action to the active scene,
/// then updates it. A `Quit` command from either step ends the run after the
/// current tick. Scenes are left loaded so callers can inspect the final world.
pub fn run_headless(
    config: &LoopConfig,
    scenes: &mut SceneMachine,
    actions: &mut dyn ActionSource,
    metrics_handle: &MetricsHandle,
) -> Result<RunSummary, AppError> {
    let target_tps = config.target_tps.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));

    scenes.load_active();
    let loaded = scenes.active_world_mut().take_flush_stats();
    info!(
        scene = %scenes.active_scene(),
        entity_count = scenes.active_world().len(),
        admitted = loaded.admitted,
        "scene_loaded"
    );
    info!(
        target_tps,
        max_ticks = ?config.max_ticks,
        realtime = config.realtime,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    let mut window = TickWindow::open(metrics_log_interval, Instant::now());
    let mut next_deadline = Instant::now();
    let mut tick: u64 = 0;

    let exit_reason = loop {
        if config.max_ticks.is_some_and(|limit| tick >= limit) {
            break ExitReason::TickLimit;
        }

        let tick_start = Instant::now();
        let mut quit_requested = false;
        for action in actions.actions_for_tick(tick) {
            let command = scenes.handle_action_active(&action);
            quit_requested |= apply_command(scenes, command)?;
        }
        let command = scenes.update_active();
        window.record(TickSample {
            busy: tick_start.elapsed(),
            flush: scenes.active_world_mut().take_flush_stats(),
            systems_run: scenes.systems_last_tick_active(),
        });
        quit_requested |= apply_command(scenes, command)?;

        tick = tick.saturating_add(1);
        if let Some(metrics) = window.close_if_due(Instant::now(), scenes.active_world().len()) {
            metrics_handle.publish(metrics);
            info!(
                ticks = metrics.total_ticks,
                tps = metrics.tps,
                tick_time_ms = metrics.tick_time_ms,
                live_entities = metrics.live_entities,
                admitted = metrics.admitted,
                swept = metrics.swept,
                systems_per_tick = metrics.systems_per_tick,
                idle_ticks = metrics.idle_ticks,
                scene = %scenes.active_scene(),
                "loop_metrics"
            );
        }

        if quit_requested {
            info!(reason = "quit_action", tick, "shutdown_requested");
            break ExitReason::Quit;
        }

        if config.realtime {
            next_deadline += fixed_dt;
            let sleep_for = compute_pacing_sleep(Instant::now(), next_deadline);
            if sleep_for > Duration::ZERO {
                thread::sleep(sleep_for);
            } else {
                // Fell behind; restart pacing from now instead of bursting.
                next_deadline = Instant::now();
            }
        }
    };

    metrics_handle.publish(window.close(Instant::now(), scenes.active_world().len()));

    Ok(RunSummary {
        ticks: tick,
        exit_reason,
    })
}

/// Applies a scene command; returns whether the run should stop.
fn apply_command(scenes: &mut SceneMachine, command: SceneCommand) -> Result<bool, AppError> {
    let switched = match command {
        SceneCommand::None => false,
        SceneCommand::Quit => return Ok(true),
        SceneCommand::SwitchTo(next_scene) => scenes.switch_to(next_scene)?,
        SceneCommand::HardResetTo(next_scene) => {
            scenes.hard_reset_to(next_scene)?;
            true
        }
    };
    if switched {
        info!(
            scene = %scenes.active_scene(),
            entity_count = scenes.active_world().len(),
            "scene_switched"
        );
    } else if command != SceneCommand::None {
        debug!(?command, "scene_command_ignored");
    }
    Ok(false)
}

fn compute_pacing_sleep(now: Instant, deadline: Instant) -> Duration {
    deadline.saturating_duration_since(now)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::{Action, ActionPhase, NoActions};
    use crate::app::scene::{Scene, SceneKey};
    use crate::ecs::EntityManager;

    struct CountingScene {
        quit_on_tick: Option<u64>,
        ticks: u64,
    }

    impl Scene for CountingScene {
        fn load(&mut self, world: &mut EntityManager) {
            world.create("Tile");
        }

        fn handle_action(&mut self, action: &Action, _world: &mut EntityManager) -> SceneCommand {
            if action.name == "QUIT" {
                SceneCommand::Quit
            } else {
                SceneCommand::None
            }
        }

        fn update(&mut self, world: &mut EntityManager) -> SceneCommand {
            world.flush();
            self.ticks += 1;
            if self.quit_on_tick == Some(self.ticks) {
                SceneCommand::Quit
            } else {
                SceneCommand::None
            }
        }

        fn unload(&mut self, _world: &mut EntityManager) {}

        fn systems_last_tick(&self) -> usize {
            2
        }
    }

    /// Each tick retires the previous spark and buffers a new one.
    struct SparkScene;

    impl Scene for SparkScene {
        fn load(&mut self, _world: &mut EntityManager) {}

        fn handle_action(&mut self, _action: &Action, _world: &mut EntityManager) -> SceneCommand {
            SceneCommand::None
        }

        fn update(&mut self, world: &mut EntityManager) -> SceneCommand {
            world.flush();
            for spark in world.entities_mut() {
                spark.destroy();
            }
            world.create("Spark");
            SceneCommand::None
        }

        fn unload(&mut self, _world: &mut EntityManager) {}
    }

    struct QuitAt(u64);

    impl ActionSource for QuitAt {
        fn actions_for_tick(&mut self, tick: u64) -> Vec<Action> {
            if tick == self.0 {
                vec![Action::new("QUIT", ActionPhase::Start)]
            } else {
                Vec::new()
            }
        }
    }

    fn machine(quit_on_tick: Option<u64>) -> SceneMachine {
        SceneMachine::new(
            SceneKey("counting"),
            Box::new(CountingScene {
                quit_on_tick,
                ticks: 0,
            }),
        )
    }

    #[test]
    fn tick_limit_stops_run_and_publishes_metrics() {
        let mut scenes = machine(None);
        let metrics = MetricsHandle::default();
        let config = LoopConfig {
            max_ticks: Some(25),
            ..LoopConfig::default()
        };

        let summary = run_headless(&config, &mut scenes, &mut NoActions, &metrics).expect("run");
        assert_eq!(
            summary,
            RunSummary {
                ticks: 25,
                exit_reason: ExitReason::TickLimit
            }
        );
        let latest = metrics.latest();
        assert_eq!(latest.total_ticks, 25);
        assert_eq!(latest.live_entities, 1);
        assert_eq!(latest.systems_per_tick, 2.0);
        assert_eq!(latest.idle_ticks, 0);
    }

    #[test]
    fn metrics_count_flushed_entities_and_idle_ticks() {
        let mut scenes = SceneMachine::new(SceneKey("sparks"), Box::new(SparkScene));
        let metrics = MetricsHandle::default();
        let config = LoopConfig {
            max_ticks: Some(5),
            ..LoopConfig::default()
        };

        run_headless(&config, &mut scenes, &mut NoActions, &metrics).expect("run");
        let latest = metrics.latest();
        assert_eq!(latest.admitted, 4);
        assert_eq!(latest.swept, 3);
        assert_eq!(latest.idle_ticks, 5);
        assert_eq!(latest.live_entities, 1);
    }

    #[test]
    fn quit_action_stops_after_current_tick() {
        let mut scenes = machine(None);
        let config = LoopConfig {
            max_ticks: Some(100),
            ..LoopConfig::default()
        };
        let summary = run_headless(&config, &mut scenes, &mut QuitAt(4), &MetricsHandle::default())
            .expect("run");
        assert_eq!(summary.exit_reason, ExitReason::Quit);
        assert_eq!(summary.ticks, 5);
    }

    #[test]
    fn quit_command_from_update_stops_run() {
        let mut scenes = machine(Some(3));
        let summary = run_headless(
            &LoopConfig::default(),
            &mut scenes,
            &mut NoActions,
            &MetricsHandle::default(),
        )
        .expect("run");
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.exit_reason, ExitReason::Quit);
    }

    #[test]
    fn switch_to_unregistered_scene_is_an_error() {
        let mut scenes = machine(None);
        let err = apply_command(&mut scenes, SceneCommand::SwitchTo(SceneKey("missing")))
            .expect_err("unregistered");
        assert!(matches!(err, AppError::Scene(SceneError::NotRegistered { .. })));
    }

    #[test]
    fn pacing_sleep_is_zero_once_deadline_passed() {
        let now = Instant::now();
        assert_eq!(compute_pacing_sleep(now + Duration::from_millis(5), now), Duration::ZERO);
        assert_eq!(
            compute_pacing_sleep(now, now + Duration::from_millis(5)),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn zero_metrics_interval_falls_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
    }
}
