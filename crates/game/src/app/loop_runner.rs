use std::process::ExitCode;

use engine::{run_headless, MetricsHandle};
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::gameplay::{write_snapshot, WorldSnapshot};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        loop_config,
        mut scenes,
        mut actions,
        snapshot_path,
    } = app;
    let metrics = MetricsHandle::default();

    let summary = match run_headless(&loop_config, &mut scenes, actions.as_mut(), &metrics) {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "run_failed");
            return ExitCode::FAILURE;
        }
    };

    let snapshot = WorldSnapshot::capture(scenes.active_scene(), summary.ticks, scenes.active_world());
    let mut code = ExitCode::SUCCESS;
    match write_snapshot(&snapshot_path, &snapshot) {
        Ok(()) => info!(
            path = %snapshot_path.display(),
            entity_count = snapshot.entity_count,
            "snapshot_written"
        ),
        Err(err) => {
            error!(error = %err, "snapshot_failed");
            code = ExitCode::FAILURE;
        }
    }

    let last = metrics.latest();
    scenes.shutdown_all();
    info!(
        ticks = summary.ticks,
        live_entities = last.live_entities,
        exit_reason = ?summary.exit_reason,
        "shutdown"
    );
    code
}
