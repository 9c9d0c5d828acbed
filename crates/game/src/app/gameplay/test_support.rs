use std::path::PathBuf;
use std::sync::Arc;

use engine::{AnimationDef, AnimationDefId, DefDatabase, EntityManager, FontDef};

use super::config::SimConfig;
use super::level::{parse_level, LevelBlueprint};
use super::scene::HomeMapScene;
use super::spawn::spawn_level;

pub(crate) const WEAPONS: &str = "\
Weapon Sword SwordSwing 24 0 32 16 1 20
Weapon EnemyBlade EnemySword 20 0 24 12 1 0
";

fn def(name: &str, frame_count: u32, speed: u32, size: f32) -> AnimationDef {
    AnimationDef {
        id: AnimationDefId(0),
        def_name: name.to_string(),
        texture: name.to_string(),
        frame_count,
        speed,
        width: size,
        height: size,
    }
}

pub(crate) fn test_assets() -> DefDatabase {
    let mut defs = vec![
        def("GrassTile", 1, 0, 64.0),
        def("StoneWall", 1, 0, 64.0),
        def("FloorTrap", 1, 0, 64.0),
        def("FloorCampfire", 4, 8, 64.0),
        def("Bush", 1, 0, 64.0),
        def("Hand", 1, 0, 16.0),
        def("SwordSwing", 4, 3, 48.0),
        def("EnemySword", 1, 0, 40.0),
    ];
    for sprite in ["GreenCharacter", "RedCharacter"] {
        defs.push(def(sprite, 1, 0, 48.0));
        for pose in ["Stand", "Run", "Atk"] {
            for direction in ["Up", "Down", "Left", "Right"] {
                defs.push(def(&format!("{sprite}{pose}{direction}"), 4, 6, 48.0));
            }
        }
    }
    DefDatabase::from_defs(
        defs,
        vec![FontDef {
            def_name: "Tech".to_string(),
            path: PathBuf::from("fonts/tech.ttf"),
        }],
    )
}

pub(crate) fn test_level(source: &str) -> LevelBlueprint {
    parse_level(source, &test_assets(), &SimConfig::default()).expect("test level")
}

/// Spawns `source` into a fresh registry and admits everything.
pub(crate) fn spawned_world(source: &str) -> EntityManager {
    let level = test_level(source);
    let mut world = EntityManager::new();
    spawn_level(&mut world, &level, &SimConfig::default());
    world.flush();
    world
}

pub(crate) fn home_scene(source: &str) -> HomeMapScene {
    HomeMapScene::new(
        Arc::new(test_assets()),
        test_level(source),
        SimConfig::default(),
    )
}
