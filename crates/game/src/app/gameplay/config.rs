use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::Vec2;
use serde::Deserialize;
use thiserror::Error;

pub(crate) const SIM_CONFIG_FILE: &str = "sim.json";

/// Tuning values for the home-map simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimConfig {
    pub(crate) tile_size: Vec2,
    /// Player speed used when the level's Player record gives 0.
    pub(crate) player_step: f32,
    pub(crate) patrol_arrival_threshold: f32,
    pub(crate) invincibility_frames: i32,
    pub(crate) hazard_animations: Vec<String>,
    pub(crate) hazard_damage: i32,
    /// Hand offset for a right-facing character.
    pub(crate) hand_offset: Vec2,
    pub(crate) hand_animation: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tile_size: Vec2::new(64.0, 64.0),
            player_step: 3.0,
            patrol_arrival_threshold: 5.0,
            invincibility_frames: 60,
            hazard_animations: vec!["FloorTrap".to_string(), "FloorCampfire".to_string()],
            hazard_damage: 1,
            hand_offset: Vec2::new(20.0, 8.0),
            hand_animation: "Hand".to_string(),
        }
    }
}

impl SimConfig {
    pub(crate) fn grid_to_pixel(&self, grid_x: i32, grid_y: i32) -> Vec2 {
        Vec2::new(
            grid_x as f32 * self.tile_size.x + self.tile_size.x / 2.0,
            grid_y as f32 * self.tile_size.y + self.tile_size.y / 2.0,
        )
    }

    pub(crate) fn is_hazard(&self, animation_name: &str) -> bool {
        self.hazard_animations
            .iter()
            .any(|hazard| hazard == animation_name)
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.tile_size.x > 0.0 && self.tile_size.y > 0.0) {
            return Err("tile_size must be positive on both axes".to_string());
        }
        if !self.player_step.is_finite() || self.player_step < 0.0 {
            return Err("player_step must be finite and >= 0".to_string());
        }
        if !self.patrol_arrival_threshold.is_finite() || self.patrol_arrival_threshold <= 0.0 {
            return Err("patrol_arrival_threshold must be finite and > 0".to_string());
        }
        if self.invincibility_frames <= 0 {
            return Err("invincibility_frames must be > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config '{path}' at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config '{path}': {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Reads the simulation config, falling back to defaults when the file is absent.
pub(crate) fn load_sim_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(SimConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_sim_config(path, &raw)
}

pub(crate) fn parse_sim_config(path: &Path, raw: &str) -> Result<SimConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: SimConfig =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let json_path = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        })?;
    config.validate().map_err(|message| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(config)
}
