use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{ComponentKind, EntityManager, Health, SceneKey, Transform, Vec2};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum SnapshotError {
    #[error("failed to serialize world snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write world snapshot '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EntitySnapshot {
    pub(crate) id: u64,
    pub(crate) tag: String,
    pub(crate) active: bool,
    pub(crate) position: Option<Vec2>,
    pub(crate) health: Option<HealthSnapshot>,
    pub(crate) components: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct HealthSnapshot {
    pub(crate) current: i32,
    pub(crate) max: i32,
}

/// Final state of one scene's registry, written at shutdown.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct WorldSnapshot {
    pub(crate) scene: String,
    pub(crate) ticks: u64,
    pub(crate) entity_count: usize,
    pub(crate) entities: Vec<EntitySnapshot>,
}

impl WorldSnapshot {
    pub(crate) fn capture(scene: SceneKey, ticks: u64, world: &EntityManager) -> Self {
        let entities = world
            .entities()
            .iter()
            .map(|entity| EntitySnapshot {
                id: entity.id().0,
                tag: entity.tag().to_string(),
                active: entity.is_active(),
                position: entity.get::<Transform>().map(|transform| transform.pos),
                health: entity.get::<Health>().map(|health| HealthSnapshot {
                    current: health.current,
                    max: health.max,
                }),
                components: entity
                    .component_kinds()
                    .into_iter()
                    .map(ComponentKind::name)
                    .collect(),
            })
            .collect::<Vec<_>>();
        Self {
            scene: scene.to_string(),
            ticks,
            entity_count: entities.len(),
            entities,
        }
    }
}

/// Writes through a sibling temp file so a crash never leaves half a snapshot.
pub(crate) fn write_snapshot(path: &Path, snapshot: &WorldSnapshot) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(snapshot).map_err(SnapshotError::Serialize)?;
    let write_error = |source| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, json).map_err(write_error)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_error(error));
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("snapshot.json");
    path.with_file_name(format!("{file_name}.tmp"))
}
