mod actions;
mod config;
mod level;
mod scene;
mod scripted;
mod snapshot;
mod spawn;
mod systems;

#[cfg(test)]
mod test_support;

pub(crate) use config::{load_sim_config, ConfigError, SimConfig, SIM_CONFIG_FILE};
pub(crate) use level::{load_level, LevelError};
pub(crate) use scene::{HomeMapScene, HOME_MAP};
pub(crate) use scripted::{ScriptError, ScriptedActions};
pub(crate) use snapshot::{write_snapshot, SnapshotError, WorldSnapshot};
