use engine::{
    Animation, AnimationState, BoundingBox, Damage, Draggable, Entity, EntityId, EntityManager,
    FollowBehavior, HandLink, Health, Input, Lifespan, PatrolBehavior, StateTag, Transform, Vec2,
};

use super::config::SimConfig;
use super::level::{
    DecorationSpec, EnemyBehavior, EnemySpec, LevelBlueprint, LevelRecord, PlayerConfig,
    TileSpec, WeaponTemplate,
};
use super::systems::{DECORATION_TAG, ENEMY_TAG, HAND_TAG, PLAYER_TAG, TILE_TAG, WEAPON_TAG};

/// Buffers every entity of `level` in record order. Nothing is visible until
/// the caller flushes.
pub(crate) fn spawn_level(world: &mut EntityManager, level: &LevelBlueprint, config: &SimConfig) {
    for record in &level.records {
        match record {
            LevelRecord::Tile(spec) => {
                spawn_tile(world, spec);
            }
            LevelRecord::Decoration(spec) => {
                spawn_decoration(world, spec);
            }
            LevelRecord::Player => {
                spawn_player(world, &level.player, &level.hand_animation, config);
            }
            LevelRecord::Enemy(spec) => {
                spawn_enemy(world, spec, &level.hand_animation, config);
            }
        }
    }
}

fn spawn_tile(world: &mut EntityManager, spec: &TileSpec) -> EntityId {
    let tile = world.create(TILE_TAG);
    tile.add(AnimationState {
        animation: spec.animation.clone(),
        repeat: true,
    });
    tile.add(Transform::at(spec.pos));
    tile.add(BoundingBox::new(
        spec.pos,
        spec.box_offset,
        spec.box_size,
        spec.block_move,
        spec.block_vision,
    ));
    tile.id()
}

fn spawn_decoration(world: &mut EntityManager, spec: &DecorationSpec) -> EntityId {
    let decoration = world.create(DECORATION_TAG);
    decoration.add(AnimationState {
        animation: spec.animation.clone(),
        repeat: true,
    });
    decoration.add(Transform::at(spec.pos));
    decoration.add(Draggable::default());
    decoration.id()
}

pub(crate) fn spawn_player(
    world: &mut EntityManager,
    player: &PlayerConfig,
    hand_animation: &Animation,
    config: &SimConfig,
) -> EntityId {
    let entity = world.create(PLAYER_TAG);
    let player_id = entity.id();
    entity.add(AnimationState {
        animation: player.animation.clone(),
        repeat: true,
    });
    entity.add(Transform::at(player.pos));
    entity.add(BoundingBox::new(
        player.pos,
        player.box_offset,
        player.box_size,
        false,
        false,
    ));
    entity.add(Input::default());
    entity.add(Health::full(player.health));
    entity.add(StateTag {
        state: Default::default(),
        sprite: player.sprite.clone(),
    });

    let hand_id = spawn_hand(world, player_id, player.pos, hand_animation, config.hand_offset);
    link_owner_to_hand(world, player_id, hand_id, config.hand_offset);
    player_id
}

fn spawn_enemy(
    world: &mut EntityManager,
    spec: &EnemySpec,
    hand_animation: &Animation,
    config: &SimConfig,
) -> EntityId {
    let entity = world.create(ENEMY_TAG);
    let enemy_id = entity.id();
    entity.add(AnimationState {
        animation: spec.animation.clone(),
        repeat: true,
    });
    entity.add(Transform::at(spec.pos));
    entity.add(BoundingBox::new(
        spec.pos,
        spec.box_offset,
        spec.box_size,
        spec.block_move,
        spec.block_vision,
    ));
    entity.add(Health::full(spec.health));
    entity.add(StateTag {
        state: Default::default(),
        sprite: spec.sprite.clone(),
    });
    match &spec.behavior {
        EnemyBehavior::Follow { speed } => {
            entity.add(FollowBehavior {
                home: spec.pos,
                speed: *speed,
            });
        }
        EnemyBehavior::Patrol { speed, waypoints } => {
            entity.add(PatrolBehavior {
                waypoints: waypoints.clone(),
                current_index: 0,
                speed: *speed,
            });
        }
    }

    let hand_id = spawn_hand(world, enemy_id, spec.pos, hand_animation, config.hand_offset);
    let hand_pos = spec.pos + config.hand_offset;
    let weapon_id = spawn_weapon(world, hand_id, hand_pos, &spec.weapon, true).id();
    if let Some(link) = world
        .pending_mut(hand_id)
        .and_then(|hand| hand.get_mut::<HandLink>())
    {
        link.weapon = Some(weapon_id);
    }
    link_owner_to_hand(world, enemy_id, hand_id, config.hand_offset);
    enemy_id
}

fn spawn_hand(
    world: &mut EntityManager,
    owner: EntityId,
    owner_pos: Vec2,
    animation: &Animation,
    offset: Vec2,
) -> EntityId {
    let hand = world.create(HAND_TAG);
    hand.add(Transform::at(owner_pos + offset));
    hand.add(AnimationState {
        animation: animation.clone(),
        repeat: true,
    });
    hand.add(HandLink {
        linked: owner,
        weapon: None,
        offset: Vec2::ZERO,
    });
    hand.id()
}

fn link_owner_to_hand(world: &mut EntityManager, owner: EntityId, hand: EntityId, offset: Vec2) {
    if let Some(entity) = world.pending_mut(owner) {
        entity.add(HandLink {
            linked: hand,
            weapon: None,
            offset,
        });
    }
}

/// The weapon's own link points back at the hand and remembers the
/// right-facing box offset so movement can rotate it.
fn spawn_weapon<'a>(
    world: &'a mut EntityManager,
    hand: EntityId,
    hand_pos: Vec2,
    template: &WeaponTemplate,
    repeat: bool,
) -> &'a mut Entity {
    let weapon = world.create(WEAPON_TAG);
    weapon.add(AnimationState {
        animation: template.animation.clone(),
        repeat,
    });
    weapon.add(Transform::at(hand_pos));
    weapon.add(BoundingBox::new(
        hand_pos,
        template.box_offset,
        template.box_size,
        false,
        false,
    ));
    weapon.add(Damage {
        amount: template.damage,
    });
    weapon.add(HandLink {
        linked: hand,
        weapon: None,
        offset: template.box_offset,
    });
    weapon
}

/// Spawns a one-shot swing in the player's hand and locks further attacks
/// until it is released. Returns `None` when the player cannot attack.
pub(crate) fn spawn_player_weapon(
    world: &mut EntityManager,
    player_id: EntityId,
    template: &WeaponTemplate,
    frame: u64,
) -> Option<EntityId> {
    let player = world.get(player_id).ok()?;
    if !player.is_active() || !player.get::<Input>()?.can_attack {
        return None;
    }
    let hand_id = player.get::<HandLink>()?.linked;
    let hand = world.get(hand_id).ok()?;
    if hand.get::<HandLink>()?.weapon.is_some() {
        return None;
    }
    let hand_pos = hand.get::<Transform>()?.pos;

    let weapon = spawn_weapon(world, hand_id, hand_pos, template, false);
    weapon.add(Lifespan {
        remaining_ticks: template.lifespan_ticks,
        created_at_frame: frame,
    });
    let weapon_id = weapon.id();

    if let Some(link) = world
        .get_mut(hand_id)
        .ok()
        .and_then(|hand| hand.get_mut::<HandLink>())
    {
        link.weapon = Some(weapon_id);
    }
    if let Some(input) = world
        .get_mut(player_id)
        .ok()
        .and_then(|player| player.get_mut::<Input>())
    {
        input.can_attack = false;
    }
    Some(weapon_id)
}
