use engine::{EntityManager, Invincibility, Lifespan};
use tracing::debug;

use super::{player_id, release_player_weapon};

pub(crate) fn run(world: &mut EntityManager) {
    let mut expired = Vec::new();
    for entity in world.entities_mut() {
        if !entity.is_active() {
            continue;
        }
        let Some(lifespan) = entity.get_mut::<Lifespan>() else {
            continue;
        };
        // A lifespan that starts at zero expires on its first tick.
        lifespan.remaining_ticks = lifespan.remaining_ticks.saturating_sub(1).max(0);
        if lifespan.remaining_ticks == 0 {
            entity.destroy();
            expired.push(entity.id());
        }
    }
    for id in expired {
        debug!(entity_id = id.0, "lifespan_expired");
        release_player_weapon(world, id);
    }

    let player = player_id(world);
    let Ok(player) = world.get_mut(player) else {
        return;
    };
    let Some(invincibility) = player.get_mut::<Invincibility>() else {
        return;
    };
    invincibility.remaining_frames -= 1;
    if invincibility.remaining_frames <= 0 {
        player.remove::<Invincibility>();
    }
}

#[cfg(test)]
mod tests {
    use engine::{EntityId, Input};

    use super::*;
    use crate::app::gameplay::level::{LevelBlueprint, WeaponTemplate};
    use crate::app::gameplay::spawn::spawn_player_weapon;
    use crate::app::gameplay::systems::{hand_of, held_weapon};
    use crate::app::gameplay::test_support::{spawned_world, test_level, WEAPONS};

    const PLAYER: &str = "Player GreenCharacter 1 1 0 0 32 32 0 3 Sword\n";

    fn swinging_world() -> (EntityManager, LevelBlueprint, EntityId) {
        let level = test_level(&format!("{WEAPONS}{PLAYER}"));
        let mut world = spawned_world(&format!("{WEAPONS}{PLAYER}"));
        let player = player_id(&world);
        let weapon =
            spawn_player_weapon(&mut world, player, &level.player.weapon, 0).expect("swing");
        world.flush();
        (world, level, weapon)
    }

    #[test]
    fn lifespan_counts_down_then_destroys_and_releases() {
        let (mut world, level, weapon) = swinging_world();
        let ticks = level.player.weapon.lifespan_ticks;
        for _ in 0..ticks - 1 {
            run(&mut world);
        }
        assert!(world.get(weapon).expect("weapon").is_active());
        assert_eq!(
            world
                .get(weapon)
                .expect("weapon")
                .get::<Lifespan>()
                .expect("lifespan")
                .remaining_ticks,
            1
        );

        run(&mut world);
        assert!(!world.get(weapon).expect("weapon").is_active());
        let player = player_id(&world);
        let hand = hand_of(&world, player).expect("hand");
        assert_eq!(held_weapon(&world, hand), None);
        assert!(world
            .get(player)
            .expect("player")
            .get::<Input>()
            .expect("input")
            .can_attack);
    }

    #[test]
    fn zero_lifespan_expires_on_first_tick() {
        let level = test_level(&format!("{WEAPONS}{PLAYER}"));
        let mut world = spawned_world(&format!("{WEAPONS}{PLAYER}"));
        let player = player_id(&world);
        let spent = WeaponTemplate {
            lifespan_ticks: 0,
            ..level.player.weapon.clone()
        };
        let weapon = spawn_player_weapon(&mut world, player, &spent, 0).expect("swing");
        world.flush();

        run(&mut world);
        let weapon = world.get(weapon).expect("weapon");
        assert!(!weapon.is_active());
        assert_eq!(weapon.get::<Lifespan>().map(|l| l.remaining_ticks), Some(0));
        let hand = hand_of(&world, player).expect("hand");
        assert_eq!(held_weapon(&world, hand), None);
    }

    #[test]
    fn invincibility_is_removed_when_spent() {
        let mut world = spawned_world(&format!("{WEAPONS}{PLAYER}"));
        let player = player_id(&world);
        world
            .get_mut(player)
            .expect("player")
            .add(Invincibility { remaining_frames: 2 });

        run(&mut world);
        assert_eq!(
            world.get(player).expect("player").get::<Invincibility>(),
            Some(&Invincibility { remaining_frames: 1 })
        );
        run(&mut world);
        assert!(!world.get(player).expect("player").has::<Invincibility>());
    }
}
