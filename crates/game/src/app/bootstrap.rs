use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine::{
    compile_def_database, resolve_app_paths, ActionSource, ContentCompileError, LoopConfig,
    NoActions, SceneMachine, StartupError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{
    load_level, load_sim_config, ConfigError, HomeMapScene, LevelError, ScriptError,
    ScriptedActions, HOME_MAP, SIM_CONFIG_FILE,
};

const LEVEL_ENV_VAR: &str = "RIMLIKE_LEVEL";
const DEFAULT_LEVEL_FILE: &str = "home_map.txt";
const SNAPSHOT_FILE: &str = "last_run.json";
const DEFAULT_HEADLESS_TICKS: u64 = 600;

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) scenes: SceneMachine,
    pub(crate) actions: Box<dyn ActionSource>,
    pub(crate) snapshot_path: PathBuf,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("content compile failed: {0}")]
    Content(#[from] ContentCompileError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("{0}\nusage: rimlike [LEVEL] [--ticks N] [--actions FILE] [--realtime]")]
    Usage(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CliArgs {
    level: Option<PathBuf>,
    ticks: Option<u64>,
    actions: Option<PathBuf>,
    realtime: bool,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Rimlike Startup ===");

    let args = parse_args(std::env::args().skip(1))?;
    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "app_paths_resolved");

    let assets = compile_def_database(&paths.base_content_dir)?;
    info!(
        content_dir = %paths.base_content_dir.display(),
        animations = assets.animation_defs().len(),
        fonts = assets.font_count(),
        "content_compiled"
    );

    let config = load_sim_config(&paths.config_dir.join(SIM_CONFIG_FILE))?;
    let level_path = args
        .level
        .clone()
        .or_else(|| std::env::var_os(LEVEL_ENV_VAR).map(PathBuf::from))
        .unwrap_or_else(|| paths.levels_dir.join(DEFAULT_LEVEL_FILE));
    let level = load_level(&level_path, &assets, &config)?;
    info!(
        level = %level_path.display(),
        records = level.records.len(),
        "level_loaded"
    );

    let actions: Box<dyn ActionSource> = match &args.actions {
        Some(path) => Box::new(load_script(path)?),
        None => Box::new(NoActions),
    };

    let scene = HomeMapScene::new(Arc::new(assets), level, config);
    Ok(AppWiring {
        loop_config: loop_config_for(&args),
        scenes: SceneMachine::new(HOME_MAP, Box::new(scene)),
        actions,
        snapshot_path: paths.cache_dir.join(SNAPSHOT_FILE),
    })
}

fn load_script(path: &Path) -> Result<ScriptedActions, ScriptError> {
    let script = ScriptedActions::load(path)?;
    info!(path = %path.display(), actions = script.len(), "action_script_loaded");
    Ok(script)
}

/// Real-time runs go until quit unless a tick limit is given; headless runs
/// always stop.
fn loop_config_for(args: &CliArgs) -> LoopConfig {
    let max_ticks = match (args.ticks, args.realtime) {
        (Some(ticks), _) => Some(ticks),
        (None, true) => None,
        (None, false) => Some(DEFAULT_HEADLESS_TICKS),
    };
    LoopConfig {
        max_ticks,
        realtime: args.realtime,
        ..LoopConfig::default()
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs, BootstrapError> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ticks" => {
                let raw = args
                    .next()
                    .ok_or_else(|| BootstrapError::Usage("--ticks needs a value".to_string()))?;
                let ticks = raw.parse::<u64>().map_err(|_| {
                    BootstrapError::Usage(format!("--ticks expects a tick count, got '{raw}'"))
                })?;
                parsed.ticks = Some(ticks);
            }
            "--actions" => {
                let path = args
                    .next()
                    .ok_or_else(|| BootstrapError::Usage("--actions needs a file".to_string()))?;
                parsed.actions = Some(PathBuf::from(path));
            }
            "--realtime" => parsed.realtime = true,
            flag if flag.starts_with("--") => {
                return Err(BootstrapError::Usage(format!("unknown flag '{flag}'")));
            }
            level => {
                if parsed.level.is_some() {
                    return Err(BootstrapError::Usage(format!(
                        "only one level path may be given, got extra '{level}'"
                    )));
                }
                parsed.level = Some(PathBuf::from(level));
            }
        }
    }
    Ok(parsed)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
