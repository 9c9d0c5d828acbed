use engine::physics::{is_colliding, overlap, previous_overlap};
use engine::{
    AnimationState, BoundingBox, Damage, EntityId, EntityManager, Health, Invincibility,
    Transform, Vec2,
};
use tracing::info;

use super::{
    destroy_with_dependents, hand_of, held_weapon, player_id, shift_with_dependents, ENEMY_TAG,
    PLAYER_TAG, TILE_TAG,
};
use crate::app::gameplay::config::SimConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CollisionOutcome {
    pub(crate) player_died: bool,
}

pub(crate) fn run(world: &mut EntityManager, config: &SimConfig) -> CollisionOutcome {
    let player = player_id(world);
    let blocking_tiles = blocking_tiles(world);

    if is_active(world, player) {
        push_player_out(world, player, &blocking_tiles);
    }
    revert_blocked_movers(world, &blocking_tiles);

    let mut outcome = CollisionOutcome::default();
    if !is_active(world, player) {
        return outcome;
    }
    outcome.player_died = hazard_contact(world, player, config)
        || enemy_weapon_contact(world, player, config);
    if !outcome.player_died {
        player_weapon_hits(world, player);
    }
    outcome
}

fn is_active(world: &EntityManager, id: EntityId) -> bool {
    world.get(id).is_ok_and(|entity| entity.is_active())
}

fn blocking_tiles(world: &EntityManager) -> Vec<EntityId> {
    world
        .by_tag(TILE_TAG)
        .iter()
        .copied()
        .filter(|id| {
            world.get(*id).is_ok_and(|tile| {
                tile.is_active()
                    && tile
                        .get::<BoundingBox>()
                        .is_some_and(|bbox| bbox.block_move)
            })
        })
        .collect()
}

/// Resolves each tile in turn along the axis that was not already overlapping
/// before this tick's move.
fn push_player_out(world: &mut EntityManager, player: EntityId, tiles: &[EntityId]) {
    for tile in tiles {
        let correction = {
            let (Ok(player_entity), Ok(tile_entity)) = (world.get(player), world.get(*tile)) else {
                continue;
            };
            let current = overlap(player_entity, tile_entity);
            if !(current.x > 0.0 && current.y > 0.0) {
                continue;
            }
            let previous = previous_overlap(player_entity, tile_entity);
            let (Some(player_box), Some(tile_box)) = (
                player_entity.get::<BoundingBox>(),
                tile_entity.get::<BoundingBox>(),
            ) else {
                continue;
            };
            push_out(current, previous, player_box.pos, tile_box.pos)
        };
        shift_with_dependents(world, player, correction);
    }
}

pub(crate) fn push_out(current: Vec2, previous: Vec2, mover: Vec2, tile: Vec2) -> Vec2 {
    let along_x = || {
        let sign = if mover.x > tile.x { 1.0 } else { -1.0 };
        Vec2::new(current.x * sign, 0.0)
    };
    let along_y = || {
        let sign = if mover.y > tile.y { 1.0 } else { -1.0 };
        Vec2::new(0.0, current.y * sign)
    };
    if previous.y > 0.0 {
        along_x()
    } else if previous.x > 0.0 {
        along_y()
    } else if current.x < current.y {
        // Corner entry: take the shallower axis.
        along_x()
    } else {
        along_y()
    }
}

/// Non-player movers simply undo this tick's velocity, once per tick.
fn revert_blocked_movers(world: &mut EntityManager, tiles: &[EntityId]) {
    let movers = world
        .entities()
        .iter()
        .filter(|entity| {
            entity.is_active()
                && !matches!(entity.tag(), PLAYER_TAG | TILE_TAG)
                && entity.has::<BoundingBox>()
                && entity
                    .get::<Transform>()
                    .is_some_and(|transform| !transform.velocity.is_zero())
        })
        .map(|entity| entity.id())
        .collect::<Vec<_>>();

    for mover in movers {
        let blocked = tiles.iter().any(|tile| {
            match (world.get(mover), world.get(*tile)) {
                (Ok(mover), Ok(tile)) => is_colliding(mover, tile),
                _ => false,
            }
        });
        if !blocked {
            continue;
        }
        let velocity = world
            .get(mover)
            .ok()
            .and_then(|entity| entity.get::<Transform>())
            .map_or(Vec2::ZERO, |transform| transform.velocity);
        shift_with_dependents(world, mover, -velocity);
    }
}

fn hazard_contact(world: &mut EntityManager, player: EntityId, config: &SimConfig) -> bool {
    let touching_hazard = world.by_tag(TILE_TAG).iter().any(|tile| {
        match (world.get(player), world.get(*tile)) {
            (Ok(player), Ok(tile)) => {
                tile.is_active()
                    && tile
                        .get::<AnimationState>()
                        .is_some_and(|state| config.is_hazard(state.animation.name()))
                    && is_colliding(player, tile)
            }
            _ => false,
        }
    });
    touching_hazard && damage_player(world, player, config.hazard_damage, "hazard", config)
}

fn enemy_weapon_contact(world: &mut EntityManager, player: EntityId, config: &SimConfig) -> bool {
    let enemies = world.by_tag(ENEMY_TAG).to_vec();
    for enemy in enemies {
        if !is_active(world, enemy) {
            continue;
        }
        let Some(weapon) = hand_of(world, enemy).and_then(|hand| held_weapon(world, hand)) else {
            continue;
        };
        let damage = match (world.get(weapon), world.get(player)) {
            (Ok(weapon), Ok(player)) if weapon.is_active() && is_colliding(weapon, player) => {
                weapon.get::<Damage>().map(|damage| damage.amount)
            }
            _ => None,
        };
        if let Some(amount) = damage {
            if damage_player(world, player, amount, "enemy_weapon", config) {
                return true;
            }
        }
    }
    false
}

/// Applies damage unless the player is invincible. Returns whether the player died.
fn damage_player(
    world: &mut EntityManager,
    player: EntityId,
    amount: i32,
    source: &'static str,
    config: &SimConfig,
) -> bool {
    let Ok(entity) = world.get_mut(player) else {
        return false;
    };
    if entity.has::<Invincibility>() {
        return false;
    }
    let Some(health) = entity.get_mut::<Health>() else {
        return false;
    };
    health.current -= amount;
    let remaining = health.current;
    entity.add(Invincibility {
        remaining_frames: config.invincibility_frames,
    });
    info!(entity_id = player.0, amount, remaining, source, "player_damaged");

    if remaining > 0 {
        return false;
    }
    destroy_with_dependents(world, player);
    info!(entity_id = player.0, source, "player_died");
    true
}

/// A swing lands on at most one enemy; its Damage is consumed by the hit.
fn player_weapon_hits(world: &mut EntityManager, player: EntityId) {
    let Some(weapon) = hand_of(world, player).and_then(|hand| held_weapon(world, hand)) else {
        return;
    };
    let amount = match world.get(weapon) {
        Ok(entity) if entity.is_active() => match entity.get::<Damage>() {
            Some(damage) => damage.amount,
            None => return,
        },
        _ => return,
    };

    let target = world.by_tag(ENEMY_TAG).iter().copied().find(|enemy| {
        match (world.get(weapon), world.get(*enemy)) {
            (Ok(weapon), Ok(enemy)) => enemy.is_active() && is_colliding(weapon, enemy),
            _ => false,
        }
    });
    let Some(enemy) = target else {
        return;
    };

    if let Ok(entity) = world.get_mut(weapon) {
        entity.remove::<Damage>();
    }
    let remaining = world
        .get_mut(enemy)
        .ok()
        .and_then(|entity| entity.get_mut::<Health>())
        .map(|health| {
            health.current -= amount;
            health.current
        });
    info!(entity_id = enemy.0, amount, remaining = ?remaining, "enemy_hit");
    if remaining.is_some_and(|current| current <= 0) {
        destroy_with_dependents(world, enemy);
        info!(entity_id = enemy.0, "enemy_killed");
    }
}
