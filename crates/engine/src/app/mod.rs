mod input;
mod loop_runner;
mod metrics;
mod scene;

pub use input::{Action, ActionPhase, ActionSource, InputAction, NoActions};
pub use loop_runner::{run_headless, AppError, ExitReason, LoopConfig, RunSummary};
pub use metrics::{MetricsHandle, SimMetrics};
pub use scene::{Scene, SceneCommand, SceneError, SceneKey, SceneMachine};
