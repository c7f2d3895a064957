//! Movement resolver for character kinematics.
//!
//! The `MovementResolver` handles:
//! - Movement: `position += normalize(movement) * speed * dt`
//! - Sprint: `speed = move_speed * sprint_multiplier` while sprint is held
//! - Facing: `facing += look_delta_x * look_sensitivity`, wrapped to `[0, 2π)`
//! - Carried items: a held item is moved onto its holder
//!
//! # Fixed Timestep
//!
//! `dt` is one tick of the session's tick rate, so integration is identical
//! on every run regardless of wall-clock frame time.

use std::f32::consts::TAU;

use crate::arena::Arena;
use crate::config::SessionConfig;
use crate::entity::{Entity, ParticipantId};
use crate::input::{Buttons, InputSnapshot};

/// Default fixed timestep (60 ticks per second).
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// Integrates one character's movement and facing per tick.
///
/// # Example
///
/// ```
/// use ptooey_core::resolver::MovementResolver;
///
/// let resolver = MovementResolver::new(5.0, 1.5, 0.01);
/// assert!((resolver.dt() - 1.0 / 60.0).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementResolver {
    dt: f32,
    move_speed: f32,
    sprint_multiplier: f32,
    look_sensitivity: f32,
}

impl MovementResolver {
    /// Creates a resolver with the default fixed timestep.
    #[must_use]
    pub const fn new(move_speed: f32, sprint_multiplier: f32, look_sensitivity: f32) -> Self {
        Self {
            dt: FIXED_DT,
            move_speed,
            sprint_multiplier,
            look_sensitivity,
        }
    }

    /// Creates a resolver from session configuration, using its tick rate.
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            dt: config.dt(),
            move_speed: config.move_speed,
            sprint_multiplier: config.sprint_multiplier,
            look_sensitivity: config.look_sensitivity,
        }
    }

    /// Returns the timestep used for integration.
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Applies one tick of `snapshot` to `participant`'s character.
    ///
    /// Does nothing if the participant has no character.
    pub fn integrate(&self, arena: &mut Arena, participant: ParticipantId, snapshot: &InputSnapshot) {
        let Some(character_id) = arena.character_of(participant) else {
            return;
        };
        let Some(entity) = arena.get_mut(character_id) else {
            return;
        };

        let speed = if snapshot.buttons.contains(Buttons::SPRINT) {
            self.move_speed * self.sprint_multiplier
        } else {
            self.move_speed
        };
        let velocity = snapshot.movement.normalize_or_zero() * speed;
        let position = entity.position() + velocity * self.dt;

        let Some(character) = entity.as_character_mut() else {
            return;
        };
        character.facing =
            wrap_facing(character.facing + snapshot.look_delta_x * self.look_sensitivity);
        character.speed = velocity.length();
        let held = character.held;

        arena.set_position(character_id, position);
        if let Some(item) = held {
            arena.set_position(item, position);
        }
    }

    /// Zeroes the animator speed of a character that received no input
    /// this tick.
    pub fn idle(&self, arena: &mut Arena, participant: ParticipantId) {
        if let Some(character) = arena
            .character_of(participant)
            .and_then(|id| arena.get_mut(id))
            .and_then(Entity::as_character_mut)
        {
            character.speed = 0.0;
        }
    }
}

impl Default for MovementResolver {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

/// Folds a yaw into `[0, TAU)`. `rem_euclid` rounds tiny negatives up to
/// exactly `TAU`, which is folded back to zero.
fn wrap_facing(facing: f32) -> f32 {
    let wrapped = facing.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CharacterComponents, EntityId, EntityInner, HoldableComponents, ItemKind};
    use glam::Vec2;

    const ALICE: ParticipantId = ParticipantId::new(1);

    fn arena_with_character() -> (Arena, EntityId) {
        let mut arena = Arena::new();
        let id = arena.spawn(
            Vec2::ZERO,
            EntityInner::Character(CharacterComponents::new(ALICE, 0.0)),
        );
        (arena, id)
    }

    #[test]
    fn movement_is_normalized() {
        let (mut arena, id) = arena_with_character();
        let resolver = MovementResolver::new(6.0, 2.0, 1.0);

        resolver.integrate(&mut arena, ALICE, &InputSnapshot::moving(Vec2::new(1.0, 1.0)));

        let moved = arena.position(id).unwrap();
        assert!((moved.length() - 6.0 / 60.0).abs() < 1e-6);
        assert!((moved.x - moved.y).abs() < 1e-6);
    }

    #[test]
    fn sprint_multiplies_speed() {
        let (mut arena, id) = arena_with_character();
        let resolver = MovementResolver::new(6.0, 2.0, 1.0);
        let snapshot = InputSnapshot {
            movement: Vec2::X,
            buttons: Buttons::SPRINT,
            ..InputSnapshot::default()
        };

        resolver.integrate(&mut arena, ALICE, &snapshot);

        assert!((arena.position(id).unwrap().x - 12.0 / 60.0).abs() < 1e-6);
        let speed = arena.get(id).unwrap().as_character().unwrap().speed;
        assert!((speed - 12.0).abs() < 1e-5);
    }

    #[test]
    fn facing_wraps() {
        let (mut arena, id) = arena_with_character();
        let resolver = MovementResolver::new(5.0, 1.5, 1.0);
        let snapshot = InputSnapshot {
            look_delta_x: -1.0,
            ..InputSnapshot::default()
        };

        resolver.integrate(&mut arena, ALICE, &snapshot);

        let facing = arena.get(id).unwrap().as_character().unwrap().facing;
        assert!((facing - (TAU - 1.0)).abs() < 1e-5);

        let (mut arena, id) = arena_with_character();
        let nudge = InputSnapshot {
            look_delta_x: -1.0e-8,
            ..InputSnapshot::default()
        };

        resolver.integrate(&mut arena, ALICE, &nudge);

        let facing = arena.get(id).unwrap().as_character().unwrap().facing;
        assert!((0.0..TAU).contains(&facing), "facing {facing} escaped [0, TAU)");
    }

    #[test]
    fn held_item_follows_holder() {
        let (mut arena, id) = arena_with_character();
        let item = arena.spawn(
            Vec2::ZERO,
            EntityInner::Holdable(HoldableComponents::new(ItemKind::Potato)),
        );
        arena.get_mut(id).unwrap().as_character_mut().unwrap().held = Some(item);

        MovementResolver::default().integrate(&mut arena, ALICE, &InputSnapshot::moving(Vec2::Y));

        assert_eq!(arena.position(item), arena.position(id));
        assert!(arena.position(item).unwrap().y > 0.0);
    }

    #[test]
    fn idle_zeroes_speed() {
        let (mut arena, id) = arena_with_character();
        let resolver = MovementResolver::default();
        resolver.integrate(&mut arena, ALICE, &InputSnapshot::moving(Vec2::X));
        resolver.idle(&mut arena, ALICE);
        assert_eq!(arena.get(id).unwrap().as_character().unwrap().speed, 0.0);
    }
}
