use engine::{
    ActorState, AnimationState, Assets, Direction, Entity, EntityId, EntityManager, Pose,
    StateTag, Transform, Vec2,
};

use super::{hand_of, held_weapon, player_id, release_player_weapon, PLAYER_TAG};

pub(crate) fn run(world: &mut EntityManager, assets: &dyn Assets) {
    let player = player_id(world);
    let player_attacking = hand_of(world, player)
        .and_then(|hand| held_weapon(world, hand))
        .is_some();

    for entity in world.entities_mut() {
        if !entity.is_active() || !entity.has::<StateTag>() {
            continue;
        }
        let Some(transform) = entity.get::<Transform>().copied() else {
            continue;
        };
        let pose = if entity.tag() == PLAYER_TAG && player_attacking {
            Pose::Atk
        } else if transform.velocity.is_zero() {
            Pose::Stand
        } else {
            Pose::Run
        };
        let next = ActorState::new(pose, Direction::from_facing(transform.facing));
        apply_state(entity, next, assets);
    }

    let mut finished = Vec::new();
    for entity in world.entities_mut() {
        if !entity.is_active() {
            continue;
        }
        let Some(state) = entity.get_mut::<AnimationState>() else {
            continue;
        };
        state.animation.update();
        if !state.repeat && state.animation.has_ended() {
            entity.destroy();
            finished.push(entity.id());
        }
    }

    for id in finished {
        if release_player_weapon(world, id) {
            restore_stand(world, player, assets);
        }
    }
}

/// Switches to `<sprite><State>` when the state changes and such an animation
/// exists; otherwise only the tag changes.
fn apply_state(entity: &mut Entity, next: ActorState, assets: &dyn Assets) {
    let Some(tag) = entity.get_mut::<StateTag>() else {
        return;
    };
    if tag.state == next {
        return;
    }
    tag.state = next;
    let name = format!("{}{}", tag.sprite, next.as_str());
    if let Some(animation) = assets.find_animation(&name) {
        if let Some(state) = entity.get_mut::<AnimationState>() {
            state.animation = animation;
        }
    }
}

fn restore_stand(world: &mut EntityManager, player: EntityId, assets: &dyn Assets) {
    let Ok(entity) = world.get_mut(player) else {
        return;
    };
    if !entity.is_active() {
        return;
    }
    let facing = entity
        .get::<Transform>()
        .map_or(Vec2::ZERO, |transform| transform.facing);
    apply_state(
        entity,
        ActorState::new(Pose::Stand, Direction::from_facing(facing)),
        assets,
    );
}
