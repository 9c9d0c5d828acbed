use engine::physics::point_in_box;
use engine::{
    Action, ActionPhase, BoundingBox, ComponentKind, Draggable, Entity, EntityId, EntityManager,
    Input, InputAction, SceneCommand, Transform, Vec2,
};
use tracing::{debug, info};

use super::scene::HomeMapScene;
use super::spawn::spawn_player_weapon;
use super::systems::player_id;

impl HomeMapScene {
    pub(super) fn dispatch(&mut self, action: &Action, world: &mut EntityManager) -> SceneCommand {
        let Some(kind) = action.known() else {
            debug!(action = %action.name, phase = ?action.phase, "action_ignored");
            return SceneCommand::None;
        };
        let start = action.phase == ActionPhase::Start;
        // Releases still land while paused so no flag stays held on resume.
        if start && self.paused && drives_player(kind) {
            debug!(action = %action.name, frame = self.frame, "action_ignored_while_paused");
            return SceneCommand::None;
        }

        match kind {
            InputAction::Up => set_input(world, |input| input.up = start),
            InputAction::Down => set_input(world, |input| input.down = start),
            InputAction::Left => set_input(world, |input| input.left = start),
            InputAction::Right => set_input(world, |input| input.right = start),
            InputAction::Attack => {
                set_input(world, |input| input.attack = start);
                if start {
                    self.start_attack(world);
                }
            }
            InputAction::Pause if start => {
                self.paused = !self.paused;
                info!(paused = self.paused, frame = self.frame, "pause_toggled");
            }
            InputAction::Quit if start => return SceneCommand::Quit,
            InputAction::ToggleTexture if start => {
                self.view.draw_textures = !self.view.draw_textures;
            }
            InputAction::ToggleCollision if start => {
                self.view.draw_collision = !self.view.draw_collision;
            }
            InputAction::ToggleGrid if start => {
                self.view.draw_grid = !self.view.draw_grid;
            }
            InputAction::LeftClick if start => {
                if let Some(pos) = action.pos {
                    toggle_drag(world, pos);
                }
            }
            InputAction::RightClick if start => {
                if let Some(pos) = action.pos {
                    inspect(world, pos);
                }
            }
            InputAction::MouseMove => {
                if let Some(pos) = action.pos {
                    drag_to(world, pos);
                }
            }
            _ => {}
        }
        SceneCommand::None
    }

    fn start_attack(&mut self, world: &mut EntityManager) {
        let player = player_id(world);
        if let Some(weapon) =
            spawn_player_weapon(world, player, &self.level.player.weapon, self.frame)
        {
            info!(
                entity_id = weapon.0,
                weapon = %self.level.player.weapon.name,
                frame = self.frame,
                "weapon_spawned"
            );
        }
    }
}

fn drives_player(kind: InputAction) -> bool {
    matches!(
        kind,
        InputAction::Up
            | InputAction::Down
            | InputAction::Left
            | InputAction::Right
            | InputAction::Attack
    )
}

fn set_input(world: &mut EntityManager, apply: impl FnOnce(&mut Input)) {
    let player = player_id(world);
    if let Some(input) = world
        .get_mut(player)
        .ok()
        .and_then(|entity| entity.get_mut::<Input>())
    {
        apply(input);
    }
}

/// Later entities draw on top, so the last hit wins.
fn topmost_under(
    world: &EntityManager,
    pos: Vec2,
    accept: impl Fn(&Entity) -> bool,
) -> Option<EntityId> {
    world
        .entities()
        .iter()
        .rev()
        .find(|entity| entity.is_active() && accept(entity) && point_in_box(pos, entity))
        .map(|entity| entity.id())
}

fn toggle_drag(world: &mut EntityManager, pos: Vec2) {
    let Some(id) = topmost_under(world, pos, |entity| entity.has::<Draggable>()) else {
        return;
    };
    if let Some(draggable) = world
        .get_mut(id)
        .ok()
        .and_then(|entity| entity.get_mut::<Draggable>())
    {
        draggable.dragging = !draggable.dragging;
        debug!(entity_id = id.0, dragging = draggable.dragging, "drag_toggled");
    }
}

fn drag_to(world: &mut EntityManager, pos: Vec2) {
    for entity in world.entities_mut() {
        if !entity.get::<Draggable>().is_some_and(|drag| drag.dragging) {
            continue;
        }
        if let Some(transform) = entity.get_mut::<Transform>() {
            transform.pos = pos;
        }
        if let Some(bbox) = entity.get_mut::<BoundingBox>() {
            bbox.sync_to(pos);
        }
    }
}

fn inspect(world: &EntityManager, pos: Vec2) {
    let Some(id) = topmost_under(world, pos, |_| true) else {
        return;
    };
    let Ok(entity) = world.get(id) else {
        return;
    };
    let components = entity
        .component_kinds()
        .into_iter()
        .map(ComponentKind::name)
        .collect::<Vec<_>>();
    info!(
        entity_id = id.0,
        tag = entity.tag(),
        components = ?components,
        "entity_inspected"
    );
}

#[cfg(test)]
mod tests {
    use engine::Scene;

    use super::*;
    use crate::app::gameplay::systems::{hand_of, held_weapon, DECORATION_TAG};
    use crate::app::gameplay::test_support::{home_scene, WEAPONS};

    const LEVEL: &str = "\
Player GreenCharacter 1 1 0 0 32 32 0 3 Sword
Decoration Bush 4 4
Decoration Bush 4 4
";

    fn loaded() -> (HomeMapScene, EntityManager) {
        let mut scene = home_scene(&format!("{WEAPONS}{LEVEL}"));
        let mut world = EntityManager::new();
        scene.load(&mut world);
        world.flush();
        (scene, world)
    }

    fn input(world: &EntityManager) -> Input {
        *world
            .get(player_id(world))
            .expect("player")
            .get::<Input>()
            .expect("input")
    }

    #[test]
    fn movement_actions_set_and_clear_flags() {
        let (mut scene, mut world) = loaded();
        scene.handle_action(&Action::new("LEFT", ActionPhase::Start), &mut world);
        scene.handle_action(&Action::new("UP", ActionPhase::Start), &mut world);
        assert!(input(&world).left);
        assert!(input(&world).up);
        scene.handle_action(&Action::new("LEFT", ActionPhase::End), &mut world);
        assert!(!input(&world).left);
        assert!(input(&world).up);
    }

    #[test]
    fn attack_spawns_one_weapon_until_released() {
        let (mut scene, mut world) = loaded();
        scene.handle_action(&Action::new("ATTACK", ActionPhase::Start), &mut world);
        scene.handle_action(&Action::new("ATTACK", ActionPhase::Start), &mut world);
        assert_eq!(world.pending_len(), 1);
        assert!(input(&world).attack);
        assert!(!input(&world).can_attack);

        world.flush();
        let hand = hand_of(&world, player_id(&world)).expect("hand");
        assert!(held_weapon(&world, hand).is_some());
        scene.handle_action(&Action::new("ATTACK", ActionPhase::End), &mut world);
        assert!(!input(&world).attack);
    }

    #[test]
    fn paused_scene_ignores_attack_and_movement_presses() {
        let (mut scene, mut world) = loaded();
        scene.handle_action(&Action::new("RIGHT", ActionPhase::Start), &mut world);
        scene.handle_action(&Action::new("PAUSE", ActionPhase::Start), &mut world);

        scene.handle_action(&Action::new("ATTACK", ActionPhase::Start), &mut world);
        scene.handle_action(&Action::new("UP", ActionPhase::Start), &mut world);
        assert_eq!(world.pending_len(), 0);
        assert!(!input(&world).attack);
        assert!(!input(&world).up);
        assert!(input(&world).can_attack);

        scene.handle_action(&Action::new("RIGHT", ActionPhase::End), &mut world);
        assert!(!input(&world).right);

        scene.handle_action(&Action::new("PAUSE", ActionPhase::Start), &mut world);
        scene.handle_action(&Action::new("ATTACK", ActionPhase::Start), &mut world);
        assert_eq!(world.pending_len(), 1);
    }

    #[test]
    fn quit_and_toggles() {
        let (mut scene, mut world) = loaded();
        assert_eq!(
            scene.handle_action(&Action::new("QUIT", ActionPhase::Start), &mut world),
            SceneCommand::Quit
        );
        scene.handle_action(&Action::new("TOGGLE_GRID", ActionPhase::Start), &mut world);
        scene.handle_action(&Action::new("TOGGLE_TEXTURE", ActionPhase::Start), &mut world);
        scene.handle_action(&Action::new("TOGGLE_COLLISION", ActionPhase::End), &mut world);
        assert!(scene.view.draw_grid);
        assert!(!scene.view.draw_textures);
        assert!(!scene.view.draw_collision);
    }

    #[test]
    fn unknown_action_is_ignored() {
        let (mut scene, mut world) = loaded();
        let before = input(&world);
        assert_eq!(
            scene.handle_action(&Action::new("JUMP", ActionPhase::Start), &mut world),
            SceneCommand::None
        );
        assert_eq!(input(&world), before);
    }

    fn position(world: &EntityManager, id: EntityId) -> Vec2 {
        world
            .get(id)
            .expect("decoration")
            .get::<Transform>()
            .expect("transform")
            .pos
    }

    #[test]
    fn click_drags_topmost_decoration_only() {
        let (mut scene, mut world) = loaded();
        let decorations: Vec<EntityId> = world.by_tag(DECORATION_TAG).to_vec();
        let bush = Vec2::new(288.0, 288.0);

        scene.handle_action(
            &Action::at("LEFT_CLICK", ActionPhase::Start, bush),
            &mut world,
        );
        scene.handle_action(
            &Action::at("MOUSE_MOVE", ActionPhase::Start, Vec2::new(10.0, 20.0)),
            &mut world,
        );

        assert_eq!(position(&world, decorations[0]), bush);
        assert_eq!(position(&world, decorations[1]), Vec2::new(10.0, 20.0));

        scene.handle_action(
            &Action::at("LEFT_CLICK", ActionPhase::Start, Vec2::new(10.0, 20.0)),
            &mut world,
        );
        scene.handle_action(
            &Action::at("MOUSE_MOVE", ActionPhase::Start, Vec2::new(500.0, 500.0)),
            &mut world,
        );
        assert_eq!(position(&world, decorations[1]), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn click_without_cursor_does_nothing() {
        let (mut scene, mut world) = loaded();
        scene.handle_action(&Action::new("LEFT_CLICK", ActionPhase::Start), &mut world);
        scene.handle_action(&Action::new("RIGHT_CLICK", ActionPhase::Start), &mut world);
        assert!(world
            .entities()
            .iter()
            .filter_map(|entity| entity.get::<Draggable>())
            .all(|drag| !drag.dragging));
    }
}
