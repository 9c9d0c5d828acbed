use engine::physics::segment_intersects_box;
use engine::{
    BoundingBox, EntityId, EntityManager, FollowBehavior, PatrolBehavior, Transform, Vec2,
};

use super::{player_id, ENEMY_TAG};
use crate::app::gameplay::config::SimConfig;

/// Closer than this to home counts as arrived.
const HOME_ARRIVAL_EPSILON: f32 = 0.01;

/// Sets every enemy's velocity for this tick.
pub(crate) fn run(world: &mut EntityManager, config: &SimConfig) {
    let player = player_id(world);
    let player_pos = world
        .get(player)
        .ok()
        .filter(|entity| entity.is_active())
        .and_then(|entity| entity.get::<Transform>())
        .map(|transform| transform.pos);

    let enemies = world.by_tag(ENEMY_TAG).to_vec();
    for enemy in enemies {
        let velocity = match steer(world, enemy, player, player_pos, config) {
            Some(velocity) => velocity,
            None => continue,
        };
        let Ok(entity) = world.get_mut(enemy) else {
            continue;
        };
        if let Some(transform) = entity.get_mut::<Transform>() {
            transform.velocity = velocity;
            if let Some(facing) = dominant_axis(velocity) {
                transform.facing = facing;
            }
        }
    }
}

fn steer(
    world: &mut EntityManager,
    enemy: EntityId,
    player: EntityId,
    player_pos: Option<Vec2>,
    config: &SimConfig,
) -> Option<Vec2> {
    let entity = world.get_mut(enemy).ok()?;
    if !entity.is_active() {
        return None;
    }
    let pos = entity.get::<Transform>()?.pos;

    if let Some(patrol) = entity.get_mut::<PatrolBehavior>() {
        return Some(patrol_velocity(patrol, pos, config.patrol_arrival_threshold));
    }

    let follow = *entity.get::<FollowBehavior>()?;
    let Some(player_pos) = player_pos else {
        return Some(Vec2::ZERO);
    };
    if vision_blocked(world, player, player_pos, enemy, pos) {
        Some(return_home(pos, follow))
    } else {
        Some(pos.difference(player_pos).normalize_or_zero() * follow.speed)
    }
}

/// Heads for the waypoint after `current_index`, advancing once when it is
/// within `threshold`.
pub(crate) fn patrol_velocity(patrol: &mut PatrolBehavior, pos: Vec2, threshold: f32) -> Vec2 {
    if patrol.waypoints.is_empty() {
        return Vec2::ZERO;
    }
    let mut target = patrol.waypoints[patrol.next_index()];
    if pos.dist(target) < threshold {
        patrol.current_index = patrol.next_index();
        target = patrol.waypoints[patrol.next_index()];
    }
    pos.difference(target).normalize_or_zero() * patrol.speed
}

fn return_home(pos: Vec2, follow: FollowBehavior) -> Vec2 {
    let distance = pos.dist(follow.home);
    if distance < HOME_ARRIVAL_EPSILON {
        return Vec2::ZERO;
    }
    // Taper inside one step so the enemy settles instead of oscillating.
    let step = if distance <= follow.speed {
        distance / 2.0
    } else {
        follow.speed
    };
    Vec2::from_angle(pos.angle_to(follow.home), step)
}

/// True when any vision-blocking box other than the two endpoints crosses the
/// player-to-enemy sight line.
pub(crate) fn vision_blocked(
    world: &EntityManager,
    player: EntityId,
    player_pos: Vec2,
    enemy: EntityId,
    enemy_pos: Vec2,
) -> bool {
    world.entities().iter().any(|entity| {
        entity.is_active()
            && entity.id() != enemy
            && entity.id() != player
            && entity
                .get::<BoundingBox>()
                .is_some_and(|bbox| bbox.block_vision)
            && segment_intersects_box(player_pos, enemy_pos, entity)
    })
}

fn dominant_axis(velocity: Vec2) -> Option<Vec2> {
    if velocity.is_zero() {
        None
    } else if velocity.x.abs() >= velocity.y.abs() {
        Some(Vec2::new(velocity.x.signum(), 0.0))
    } else {
        Some(Vec2::new(0.0, velocity.y.signum()))
    }
}
