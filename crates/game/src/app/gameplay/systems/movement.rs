use engine::{BoundingBox, Direction, EntityId, EntityManager, HandLink, Input, Transform, Vec2};

use super::{player_id, ENEMY_TAG, PLAYER_TAG};

pub(crate) fn run(world: &mut EntityManager, player_speed: f32) {
    for entity in world.entities_mut() {
        if let Some(transform) = entity.get_mut::<Transform>() {
            transform.prev_pos = transform.pos;
        }
    }

    steer_player(world, player_speed);

    for entity in world.entities_mut() {
        if !entity.is_active() {
            continue;
        }
        let Some(transform) = entity.get_mut::<Transform>() else {
            continue;
        };
        transform.pos += transform.velocity;
        let pos = transform.pos;
        if let Some(bbox) = entity.get_mut::<BoundingBox>() {
            bbox.sync_to(pos);
        }
    }

    let owners = world
        .entities()
        .iter()
        .filter(|entity| {
            entity.is_active()
                && matches!(entity.tag(), PLAYER_TAG | ENEMY_TAG)
                && entity.has::<HandLink>()
        })
        .map(|entity| entity.id())
        .collect::<Vec<_>>();
    for owner in owners {
        place_hand(world, owner);
    }
}

/// Cardinal-only player velocity. Vertical keys win over horizontal ones and
/// an idle player keeps its last facing.
fn steer_player(world: &mut EntityManager, speed: f32) {
    let player = player_id(world);
    let Ok(player) = world.get_mut(player) else {
        return;
    };
    let Some(input) = player.get::<Input>().copied() else {
        return;
    };
    let direction = if input.up {
        Some(Direction::Up)
    } else if input.down {
        Some(Direction::Down)
    } else if input.left {
        Some(Direction::Left)
    } else if input.right {
        Some(Direction::Right)
    } else {
        None
    };

    let Some(transform) = player.get_mut::<Transform>() else {
        return;
    };
    match direction {
        Some(direction) => {
            transform.velocity = direction.unit() * speed;
            transform.facing = direction.unit();
        }
        None => transform.velocity = Vec2::ZERO,
    }
}

/// Rotates an offset defined for the right-facing pose into `direction`.
pub(crate) fn rotate_offset(offset: Vec2, direction: Direction) -> Vec2 {
    match direction {
        Direction::Right => offset,
        Direction::Left => Vec2::new(-offset.x, offset.y),
        Direction::Down => Vec2::new(-offset.y, offset.x),
        Direction::Up => Vec2::new(offset.y, -offset.x),
    }
}

fn weapon_pose(direction: Direction) -> (f32, Vec2) {
    match direction {
        Direction::Right => (0.0, Vec2::ONE),
        Direction::Down => (90.0, Vec2::ONE),
        Direction::Left => (180.0, Vec2::new(1.0, -1.0)),
        Direction::Up => (-90.0, Vec2::ONE),
    }
}

fn place_hand(world: &mut EntityManager, owner: EntityId) {
    let Ok(owner) = world.get(owner) else {
        return;
    };
    let (Some(link), Some(transform)) = (
        owner.get::<HandLink>().copied(),
        owner.get::<Transform>().copied(),
    ) else {
        return;
    };
    let direction = Direction::from_facing(transform.facing);
    let hand_pos = transform.pos + rotate_offset(link.offset, direction);

    let Ok(hand) = world.get_mut(link.linked) else {
        return;
    };
    if let Some(hand_transform) = hand.get_mut::<Transform>() {
        hand_transform.pos = hand_pos;
        hand_transform.velocity = transform.velocity;
        hand_transform.facing = transform.facing;
    }
    let weapon = hand.get::<HandLink>().and_then(|link| link.weapon);
    if let Some(weapon) = weapon {
        place_weapon(world, weapon, hand_pos, direction);
    }
}

fn place_weapon(world: &mut EntityManager, weapon: EntityId, hand_pos: Vec2, direction: Direction) {
    let Ok(weapon) = world.get_mut(weapon) else {
        return;
    };
    if !weapon.is_active() {
        return;
    }
    let base_offset = weapon
        .get::<HandLink>()
        .map_or(Vec2::ZERO, |link| link.offset);
    let (angle, scale) = weapon_pose(direction);
    if let Some(transform) = weapon.get_mut::<Transform>() {
        transform.pos = hand_pos;
        transform.angle = angle;
        transform.scale = scale;
    }
    if let Some(bbox) = weapon.get_mut::<BoundingBox>() {
        bbox.offset = rotate_offset(base_offset, direction);
        bbox.sync_to(hand_pos);
    }
}
