pub(crate) mod ai;
pub(crate) mod animation;
pub(crate) mod collision;
pub(crate) mod movement;
pub(crate) mod status;

use engine::{BoundingBox, EntityId, EntityManager, HandLink, Input, Transform, Vec2};
use tracing::debug;

pub(crate) const PLAYER_TAG: &str = "Player";
pub(crate) const ENEMY_TAG: &str = "Enemy";
pub(crate) const HAND_TAG: &str = "Hand";
pub(crate) const WEAPON_TAG: &str = "Weapon";
pub(crate) const TILE_TAG: &str = "Tile";
pub(crate) const DECORATION_TAG: &str = "Decoration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SimSystemId {
    Ai,
    Movement,
    Status,
    Collision,
    Animation,
}

impl SimSystemId {
    #[cfg(test)]
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Ai => "AI",
            Self::Movement => "Movement",
            Self::Status => "Status",
            Self::Collision => "Collision",
            Self::Animation => "Animation",
        }
    }
}

pub(crate) const SIM_SYSTEM_ORDER: [SimSystemId; 5] = [
    SimSystemId::Ai,
    SimSystemId::Movement,
    SimSystemId::Status,
    SimSystemId::Collision,
    SimSystemId::Animation,
];

/// The single player entity. A level without one never gets past loading.
pub(crate) fn player_id(world: &EntityManager) -> EntityId {
    world
        .first_by_tag(PLAYER_TAG)
        .unwrap_or_else(|| panic!("registry has no '{PLAYER_TAG}' entity"))
}

pub(crate) fn hand_of(world: &EntityManager, owner: EntityId) -> Option<EntityId> {
    world
        .get(owner)
        .ok()?
        .get::<HandLink>()
        .map(|link| link.linked)
}

pub(crate) fn held_weapon(world: &EntityManager, hand: EntityId) -> Option<EntityId> {
    world.get(hand).ok()?.get::<HandLink>()?.weapon
}

/// Destroys `owner` together with its hand and whatever the hand holds.
pub(crate) fn destroy_with_dependents(world: &mut EntityManager, owner: EntityId) {
    let hand = hand_of(world, owner);
    let weapon = hand.and_then(|hand| held_weapon(world, hand));
    for id in [Some(owner), hand, weapon].into_iter().flatten() {
        if let Ok(entity) = world.get_mut(id) {
            entity.destroy();
        }
    }
}

/// Moves `owner` by `delta`, dragging its hand and held weapon along.
pub(crate) fn shift_with_dependents(world: &mut EntityManager, owner: EntityId, delta: Vec2) {
    let hand = hand_of(world, owner);
    let weapon = hand.and_then(|hand| held_weapon(world, hand));
    for id in [Some(owner), hand, weapon].into_iter().flatten() {
        let Ok(entity) = world.get_mut(id) else {
            continue;
        };
        let Some(transform) = entity.get_mut::<Transform>() else {
            continue;
        };
        transform.pos += delta;
        let pos = transform.pos;
        if let Some(bbox) = entity.get_mut::<BoundingBox>() {
            bbox.sync_to(pos);
        }
    }
}

/// Clears the player's hold on `weapon` and re-enables attacking. Returns
/// false when `weapon` is not the player's held weapon.
pub(crate) fn release_player_weapon(world: &mut EntityManager, weapon: EntityId) -> bool {
    let Some(player) = world.first_by_tag(PLAYER_TAG) else {
        return false;
    };
    let Some(hand) = hand_of(world, player) else {
        return false;
    };
    if held_weapon(world, hand) != Some(weapon) {
        return false;
    }

    if let Some(link) = world
        .get_mut(hand)
        .ok()
        .and_then(|hand| hand.get_mut::<HandLink>())
    {
        link.weapon = None;
    }
    if let Some(input) = world
        .get_mut(player)
        .ok()
        .and_then(|player| player.get_mut::<Input>())
    {
        input.can_attack = true;
    }
    debug!(entity_id = weapon.0, "weapon_released");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::gameplay::test_support::{spawned_world, WEAPONS};

    const LEVEL: &str = "\
Player GreenCharacter 1 1 0 0 32 32 0 3 Sword
Enemy RedCharacter 3 1 0 0 40 40 true true 1 EnemyBlade Follow 2
";

    #[test]
    fn system_order_is_fixed() {
        let names = SIM_SYSTEM_ORDER.map(SimSystemId::name);
        assert_eq!(names, ["AI", "Movement", "Status", "Collision", "Animation"]);
    }

    #[test]
    fn destroying_enemy_takes_hand_and_weapon() {
        let mut world = spawned_world(&format!("{WEAPONS}{LEVEL}"));
        let enemy = world.first_by_tag(ENEMY_TAG).expect("enemy");
        let hand = hand_of(&world, enemy).expect("hand");
        let weapon = held_weapon(&world, hand).expect("weapon");

        destroy_with_dependents(&mut world, enemy);
        for id in [enemy, hand, weapon] {
            assert!(!world.get(id).expect("still resolvable").is_active());
        }
        assert!(world.get(player_id(&world)).expect("player").is_active());
    }

    #[test]
    fn shifting_owner_moves_hand_and_keeps_boxes_anchored() {
        let mut world = spawned_world(&format!("{WEAPONS}{LEVEL}"));
        let enemy = world.first_by_tag(ENEMY_TAG).expect("enemy");
        let hand = hand_of(&world, enemy).expect("hand");
        let weapon = held_weapon(&world, hand).expect("weapon");
        let before = world.get(hand).expect("hand").get::<Transform>().expect("t").pos;

        shift_with_dependents(&mut world, enemy, Vec2::new(-4.0, 2.0));

        let after = world.get(hand).expect("hand").get::<Transform>().expect("t").pos;
        assert_eq!(after, before + Vec2::new(-4.0, 2.0));
        for id in [enemy, weapon] {
            let entity = world.get(id).expect("entity");
            let pos = entity.get::<Transform>().expect("transform").pos;
            let bbox = entity.get::<BoundingBox>().expect("box");
            assert_eq!(bbox.pos, pos + bbox.offset);
        }
    }

    #[test]
    fn releasing_unrelated_weapon_is_a_no_op() {
        let mut world = spawned_world(&format!("{WEAPONS}{LEVEL}"));
        let enemy = world.first_by_tag(ENEMY_TAG).expect("enemy");
        let enemy_weapon = held_weapon(&world, hand_of(&world, enemy).expect("hand"))
            .expect("enemy weapon");
        assert!(!release_player_weapon(&mut world, enemy_weapon));
        assert!(held_weapon(&world, hand_of(&world, enemy).expect("hand")).is_some());
    }

    #[test]
    #[should_panic(expected = "no 'Player' entity")]
    fn missing_player_is_an_invariant_violation() {
        player_id(&EntityManager::new());
    }
}
