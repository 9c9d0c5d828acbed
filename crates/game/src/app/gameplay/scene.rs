use std::sync::Arc;

use engine::{Action, Assets, EntityManager, Scene, SceneCommand, SceneKey};
use tracing::info;

use super::config::SimConfig;
use super::level::{LevelBlueprint, LevelRecord};
use super::spawn::{spawn_level, spawn_player};
use super::systems::{
    ai, animation, collision, movement, status, SimSystemId, SIM_SYSTEM_ORDER,
};

pub(crate) const HOME_MAP: SceneKey = SceneKey("home_map");

/// Flags the renderer would read; the simulation only toggles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DebugView {
    pub(crate) draw_textures: bool,
    pub(crate) draw_collision: bool,
    pub(crate) draw_grid: bool,
}

impl Default for DebugView {
    fn default() -> Self {
        Self {
            draw_textures: true,
            draw_collision: false,
            draw_grid: false,
        }
    }
}

pub(crate) struct HomeMapScene {
    pub(super) assets: Arc<dyn Assets>,
    pub(super) level: LevelBlueprint,
    pub(super) config: SimConfig,
    pub(super) frame: u64,
    pub(super) paused: bool,
    pub(super) view: DebugView,
    pub(super) last_tick_order: Vec<SimSystemId>,
}

impl HomeMapScene {
    pub(crate) fn new(assets: Arc<dyn Assets>, level: LevelBlueprint, config: SimConfig) -> Self {
        Self {
            assets,
            level,
            config,
            frame: 0,
            paused: false,
            view: DebugView::default(),
            last_tick_order: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn frame(&self) -> u64 {
        self.frame
    }

    fn run_system(&mut self, system: SimSystemId, world: &mut EntityManager) {
        match system {
            SimSystemId::Ai => ai::run(world, &self.config),
            SimSystemId::Movement => movement::run(world, self.level.player.speed),
            SimSystemId::Status => status::run(world),
            SimSystemId::Collision => {
                if collision::run(world, &self.config).player_died {
                    let player = spawn_player(
                        world,
                        &self.level.player,
                        &self.level.hand_animation,
                        &self.config,
                    );
                    info!(entity_id = player.0, frame = self.frame, "player_respawned");
                }
            }
            SimSystemId::Animation => animation::run(world, self.assets.as_ref()),
        }
    }
}

impl Scene for HomeMapScene {
    fn load(&mut self, world: &mut EntityManager) {
        self.frame = 0;
        self.paused = false;
        spawn_level(world, &self.level, &self.config);
        info!(
            scene = %HOME_MAP,
            tiles = self.level.count(|record| matches!(record, LevelRecord::Tile(_))),
            decorations = self.level.count(|record| matches!(record, LevelRecord::Decoration(_))),
            enemies = self.level.count(|record| matches!(record, LevelRecord::Enemy(_))),
            buffered = world.pending_len(),
            "level_spawned"
        );
    }

    fn handle_action(&mut self, action: &Action, world: &mut EntityManager) -> SceneCommand {
        self.dispatch(action, world)
    }

    fn update(&mut self, world: &mut EntityManager) -> SceneCommand {
        world.flush();
        self.last_tick_order.clear();
        if self.paused {
            return SceneCommand::None;
        }

        self.frame += 1;
        for system in SIM_SYSTEM_ORDER {
            self.last_tick_order.push(system);
            self.run_system(system, world);
        }
        SceneCommand::None
    }

    fn unload(&mut self, world: &mut EntityManager) {
        info!(scene = %HOME_MAP, frame = self.frame, entity_count = world.len(), "scene_unloaded");
    }

    fn systems_last_tick(&self) -> usize {
        self.last_tick_order.len()
    }

    fn debug_title(&self, world: &EntityManager) -> Option<String> {
        let paused = if self.paused { " (paused)" } else { "" };
        Some(format!(
            "{HOME_MAP} | frame {} | {} entities{paused}",
            self.frame,
            world.len()
        ))
    }
}
