use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod animation;
pub mod app;
pub mod content;
pub mod ecs;
pub mod geometry;
pub mod physics;

pub use animation::Animation;
pub use app::{
    run_headless, Action, ActionPhase, ActionSource, AppError, ExitReason, InputAction,
    LoopConfig, MetricsHandle, NoActions, RunSummary, Scene, SceneCommand, SceneError, SceneKey,
    SceneMachine, SimMetrics,
};
pub use content::{
    compile_def_database, AnimationDef, AnimationDefId, AssetError, Assets, ContentCompileError,
    DefDatabase, DefProblem, FontDef,
};
pub use ecs::{
    ActorState, AnimationState, BoundingBox, Component, ComponentKind, Damage, Direction,
    Draggable, Entity, EntityId, EntityManager, FlushStats, FollowBehavior, HandLink, Health,
    Input, Invincibility, Lifespan, PatrolBehavior, Pose, RegistryError, StateTag, Transform,
};
pub use geometry::Vec2;

/// Overrides where the game looks for its `assets/` tree.
pub const ROOT_ENV_VAR: &str = "RIMLIKE_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub base_content_dir: PathBuf,
    pub levels_dir: PathBuf,
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot read the working directory: {0}")]
    WorkingDir(#[source] io::Error),
    #[error("RIMLIKE_ROOT={path} has no assets/base directory")]
    RootWithoutAssets { path: PathBuf },
    #[error(
        "no assets/base directory in {start} or any parent; \
run from the game checkout or set RIMLIKE_ROOT"
    )]
    AssetsNotFound { start: PathBuf },
    #[error("cannot create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Picks the game root from `RIMLIKE_ROOT`, else the nearest directory at or
/// above the working directory that ships `assets/base`.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env::var_os(ROOT_ENV_VAR) {
        Some(raw) => {
            let path = PathBuf::from(raw);
            if !ships_assets(&path) {
                return Err(StartupError::RootWithoutAssets { path });
            }
            path
        }
        None => {
            let start = env::current_dir().map_err(StartupError::WorkingDir)?;
            match find_root(&start) {
                Some(root) => root,
                None => return Err(StartupError::AssetsNotFound { start }),
            }
        }
    };
    app_paths_under(root)
}

/// Lays out the asset and cache directories under `root`, creating the cache
/// directory if it does not exist yet.
pub fn app_paths_under(root: PathBuf) -> Result<AppPaths, StartupError> {
    let assets = root.join("assets");
    let cache_dir = root.join("cache");
    fs::create_dir_all(&cache_dir).map_err(|source| StartupError::CacheDir {
        path: cache_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        base_content_dir: assets.join("base"),
        levels_dir: assets.join("levels"),
        config_dir: assets.join("config"),
        cache_dir,
        root,
    })
}

fn find_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| ships_assets(dir))
        .map(Path::to_path_buf)
}

fn ships_assets(dir: &Path) -> bool {
    dir.join("assets").join("base").is_dir()
}
