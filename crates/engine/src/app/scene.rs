use std::fmt;

use thiserror::Error;

use super::input::Action;
use crate::ecs::EntityManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneKey(pub &'static str);

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
    SwitchTo(SceneKey),
    HardResetTo(SceneKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("scene '{key}' is not registered")]
    NotRegistered { key: SceneKey },
    #[error("scene '{key}' is registered twice")]
    DuplicateKey { key: SceneKey },
}

/// A scene owns no entities itself; the machine hands it its registry.
pub trait Scene {
    fn load(&mut self, world: &mut EntityManager);
    fn handle_action(&mut self, action: &Action, world: &mut EntityManager) -> SceneCommand;
    fn update(&mut self, world: &mut EntityManager) -> SceneCommand;
    fn unload(&mut self, world: &mut EntityManager);
    fn debug_title(&self, _world: &EntityManager) -> Option<String> {
        None
    }
    /// How many simulation systems the latest `update` ran; zero while paused.
    fn systems_last_tick(&self) -> usize {
        0
    }
}

struct SceneRuntime {
    key: SceneKey,
    scene: Box<dyn Scene>,
    world: EntityManager,
    is_loaded: bool,
}

impl SceneRuntime {
    fn load(&mut self) {
        let (scene, world) = (&mut self.scene, &mut self.world);
        scene.load(world);
        self.world.flush();
        self.is_loaded = true;
    }

    fn unload(&mut self) {
        let (scene, world) = (&mut self.scene, &mut self.world);
        scene.unload(world);
        self.world.clear();
        self.is_loaded = false;
    }
}

/// Keyed set of scenes, each with its own entity registry. Scenes load lazily
/// on first activation and keep their state while inactive.
pub struct SceneMachine {
    runtimes: Vec<SceneRuntime>,
    active_scene: SceneKey,
}

impl SceneMachine {
    pub fn new(key: SceneKey, scene: Box<dyn Scene>) -> Self {
        Self {
            runtimes: vec![SceneRuntime {
                key,
                scene,
                world: EntityManager::new(),
                is_loaded: false,
            }],
            active_scene: key,
        }
    }

    pub fn register(&mut self, key: SceneKey, scene: Box<dyn Scene>) -> Result<(), SceneError> {
        if self.index_of(key).is_some() {
            return Err(SceneError::DuplicateKey { key });
        }
        self.runtimes.push(SceneRuntime {
            key,
            scene,
            world: EntityManager::new(),
            is_loaded: false,
        });
        Ok(())
    }

    pub fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub fn load_active(&mut self) {
        let runtime = self.active_runtime_mut();
        if !runtime.is_loaded {
            runtime.load();
        }
    }

    pub fn handle_action_active(&mut self, action: &Action) -> SceneCommand {
        let runtime = self.active_runtime_mut();
        let (scene, world) = (&mut runtime.scene, &mut runtime.world);
        scene.handle_action(action, world)
    }

    pub fn update_active(&mut self) -> SceneCommand {
        let runtime = self.active_runtime_mut();
        let (scene, world) = (&mut runtime.scene, &mut runtime.world);
        scene.update(world)
    }

    pub fn active_world(&self) -> &EntityManager {
        &self.active_runtime_ref().world
    }

    pub fn active_world_mut(&mut self) -> &mut EntityManager {
        &mut self.active_runtime_mut().world
    }

    pub fn systems_last_tick_active(&self) -> usize {
        self.active_runtime_ref().scene.systems_last_tick()
    }

    pub fn debug_title_active(&self) -> Option<String> {
        let runtime = self.active_runtime_ref();
        runtime.scene.debug_title(&runtime.world)
    }

    /// Activates `next_scene`, loading it first if needed. Returns whether the
    /// active scene changed.
    pub fn switch_to(&mut self, next_scene: SceneKey) -> Result<bool, SceneError> {
        let index = self
            .index_of(next_scene)
            .ok_or(SceneError::NotRegistered { key: next_scene })?;
        if self.active_scene == next_scene {
            return Ok(false);
        }

        let runtime = &mut self.runtimes[index];
        if !runtime.is_loaded {
            runtime.load();
        }
        self.active_scene = next_scene;
        Ok(true)
    }

    /// Unloads (if loaded) and reloads `next_scene` from scratch, then activates it.
    pub fn hard_reset_to(&mut self, next_scene: SceneKey) -> Result<bool, SceneError> {
        let index = self
            .index_of(next_scene)
            .ok_or(SceneError::NotRegistered { key: next_scene })?;
        let runtime = &mut self.runtimes[index];
        if runtime.is_loaded {
            runtime.unload();
        }
        runtime.load();

        let changed = self.active_scene != next_scene;
        self.active_scene = next_scene;
        Ok(changed)
    }

    pub fn shutdown_all(&mut self) {
        for runtime in &mut self.runtimes {
            if runtime.is_loaded {
                runtime.unload();
            }
        }
    }

    fn index_of(&self, key: SceneKey) -> Option<usize> {
        self.runtimes.iter().position(|runtime| runtime.key == key)
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        let index = self.active_index();
        &mut self.runtimes[index]
    }

    fn active_runtime_ref(&self) -> &SceneRuntime {
        &self.runtimes[self.active_index()]
    }

    fn active_index(&self) -> usize {
        // The active key is only ever set to a registered key.
        self.index_of(self.active_scene).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::input::ActionPhase;
    use crate::ecs::{Transform, Health};
    use crate::geometry::Vec2;

    const SCENE_A: SceneKey = SceneKey("a");
    const SCENE_B: SceneKey = SceneKey("b");

    struct TestScene {
        spawn_count: usize,
        events: Rc<RefCell<Vec<String>>>,
    }

    impl TestScene {
        fn boxed(spawn_count: usize, events: &Rc<RefCell<Vec<String>>>) -> Box<dyn Scene> {
            Box::new(Self {
                spawn_count,
                events: Rc::clone(events),
            })
        }
    }

    impl Scene for TestScene {
        fn load(&mut self, world: &mut EntityManager) {
            self.events.borrow_mut().push("load".to_string());
            for index in 0..self.spawn_count {
                let entity = world.create("Tile");
                entity.add(Transform::at(Vec2::new(index as f32, 0.0)));
            }
        }

        fn handle_action(&mut self, action: &Action, _world: &mut EntityManager) -> SceneCommand {
            self.events.borrow_mut().push(format!("action:{}", action.name));
            match action.name.as_str() {
                "QUIT" => SceneCommand::Quit,
                _ => SceneCommand::None,
            }
        }

        fn update(&mut self, world: &mut EntityManager) -> SceneCommand {
            world.flush();
            for entity in world.entities_mut() {
                if let Some(transform) = entity.get_mut::<Transform>() {
                    transform.pos.y += 1.0;
                }
            }
            SceneCommand::None
        }

        fn unload(&mut self, _world: &mut EntityManager) {
            self.events.borrow_mut().push("unload".to_string());
        }

        fn debug_title(&self, world: &EntityManager) -> Option<String> {
            Some(format!("test ({} entities)", world.len()))
        }
    }

    fn machine(events: &Rc<RefCell<Vec<String>>>) -> SceneMachine {
        let mut machine = SceneMachine::new(SCENE_A, TestScene::boxed(2, events));
        machine
            .register(SCENE_B, TestScene::boxed(3, events))
            .expect("register b");
        machine
    }

    #[test]
    fn load_active_flushes_spawned_entities() {
        let events = Rc::default();
        let mut machine = machine(&events);
        machine.load_active();
        assert_eq!(machine.active_world().len(), 2);
        assert_eq!(machine.debug_title_active().as_deref(), Some("test (2 entities)"));
    }

    #[test]
    fn switch_away_and_back_preserves_scene_state() {
        let events = Rc::default();
        let mut machine = machine(&events);
        machine.load_active();
        machine.update_active();

        assert!(machine.switch_to(SCENE_B).expect("switch"));
        assert_eq!(machine.active_world().len(), 3);
        assert!(machine.switch_to(SCENE_A).expect("switch back"));

        let moved = machine.active_world().entities()[0]
            .get::<Transform>()
            .expect("transform")
            .pos;
        assert_eq!(moved, Vec2::new(0.0, 1.0));
        assert!(!machine.switch_to(SCENE_A).expect("same scene"));
    }

    #[test]
    fn inactive_scene_does_not_advance() {
        let events = Rc::default();
        let mut machine = machine(&events);
        machine.load_active();
        machine.switch_to(SCENE_B).expect("switch");
        machine.update_active();
        machine.update_active();
        machine.switch_to(SCENE_A).expect("switch back");

        let pos = machine.active_world().entities()[0]
            .get::<Transform>()
            .expect("transform")
            .pos;
        assert_eq!(pos, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn hard_reset_recreates_scene_with_fresh_entities() {
        let events: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut machine = machine(&events);
        machine.load_active();
        let first_ids = machine.active_world().ids();
        machine
            .active_world_mut()
            .get_mut(first_ids[0])
            .expect("tile")
            .add(Health::full(5));

        machine.hard_reset_to(SCENE_A).expect("reset");
        let second_ids = machine.active_world().ids();
        assert_eq!(second_ids.len(), 2);
        assert!(second_ids.iter().all(|id| !first_ids.contains(id)));
        assert_eq!(
            events.borrow().as_slice(),
            &["load".to_string(), "unload".to_string(), "load".to_string()]
        );
    }

    #[test]
    fn actions_route_to_active_scene_and_quit_propagates() {
        let events: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut machine = machine(&events);
        machine.load_active();
        let command = machine.handle_action_active(&Action::new("QUIT", ActionPhase::Start));
        assert_eq!(command, SceneCommand::Quit);
        assert!(events.borrow().contains(&"action:QUIT".to_string()));
    }

    #[test]
    fn unknown_and_duplicate_keys_are_rejected() {
        let events = Rc::default();
        let mut machine = machine(&events);
        assert_eq!(
            machine.switch_to(SceneKey("menu")),
            Err(SceneError::NotRegistered {
                key: SceneKey("menu")
            })
        );
        assert!(matches!(
            machine.register(SCENE_B, TestScene::boxed(0, &events)),
            Err(SceneError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn shutdown_unloads_every_loaded_scene() {
        let events: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut machine = machine(&events);
        machine.load_active();
        machine.switch_to(SCENE_B).expect("switch");
        machine.shutdown_all();
        let unloads = events
            .borrow()
            .iter()
            .filter(|event| event.as_str() == "unload")
            .count();
        assert_eq!(unloads, 2);
        assert!(machine.active_world().is_empty());
    }
}
