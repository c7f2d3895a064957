//! Target selection for interaction requests.
//!
//! The proximity provider only says what is within reach. Which of those
//! candidates is a legal target depends on the action and on what the
//! requester is holding:
//!
//! | Request  | Requester    | Eligible targets                              |
//! |----------|--------------|-----------------------------------------------|
//! | Steal    | any          | another participant's character holding an item |
//! | Interact | empty-handed | free holdables                                |
//! | Interact | holding      | containers                                    |
//!
//! Among eligible candidates the nearest wins; equal distances fall back to
//! the lowest entity id so every replica of the authority picks the same one.

use crate::arena::Arena;
use crate::entity::{Entity, EntityId, ParticipantId};
use crate::possession::PossessionRegistry;

use super::ActionKind;

/// Picks the target of `requester`'s `kind` request among `candidates`.
///
/// Returns `None` if the requester has no character or no candidate is
/// eligible.
#[must_use]
pub fn select_target(
    arena: &Arena,
    possession: &PossessionRegistry,
    requester: ParticipantId,
    kind: ActionKind,
    candidates: &[EntityId],
) -> Option<EntityId> {
    let character = arena.get(arena.character_of(requester)?)?;
    let origin = character.position();
    let holding = character
        .as_character()
        .is_some_and(|components| components.held.is_some());

    let eligible = |entity: &Entity| match kind {
        ActionKind::Steal => entity
            .as_character()
            .is_some_and(|other| other.owner != requester && other.held.is_some()),
        ActionKind::Interact if holding => entity.is_container(),
        ActionKind::Interact => entity.is_holdable() && possession.is_free(entity.id()),
    };

    candidates
        .iter()
        .filter_map(|id| arena.get(*id))
        .filter(|entity| eligible(entity))
        .min_by(|a, b| {
            let da = origin.distance_squared(a.position());
            let db = origin.distance_squared(b.position());
            da.total_cmp(&db).then_with(|| a.id().cmp(&b.id()))
        })
        .map(Entity::id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{
        CharacterComponents, ContainerComponents, EntityInner, HoldableComponents, ItemKind,
    };
    use glam::Vec2;

    const ALICE: ParticipantId = ParticipantId::new(1);
    const BOB: ParticipantId = ParticipantId::new(2);

    fn holdable(arena: &mut Arena, possession: &mut PossessionRegistry, at: Vec2) -> EntityId {
        let id = arena.spawn(
            at,
            EntityInner::Holdable(HoldableComponents::new(ItemKind::Tomato)),
        );
        possession.free(id);
        id
    }

    fn character(arena: &mut Arena, owner: ParticipantId, at: Vec2) -> EntityId {
        arena.spawn(
            at,
            EntityInner::Character(CharacterComponents::new(owner, 0.0)),
        )
    }

    #[test]
    fn nearest_free_holdable_wins() {
        let mut arena = Arena::new();
        let mut possession = PossessionRegistry::new();
        character(&mut arena, ALICE, Vec2::ZERO);
        let far = holdable(&mut arena, &mut possession, Vec2::new(1.5, 0.0));
        let near = holdable(&mut arena, &mut possession, Vec2::new(0.5, 0.0));

        let target = select_target(&arena, &possession, ALICE, ActionKind::Interact, &[far, near]);

        assert_eq!(target, Some(near));
    }

    #[test]
    fn equal_distance_breaks_ties_by_lowest_id() {
        let mut arena = Arena::new();
        let mut possession = PossessionRegistry::new();
        character(&mut arena, ALICE, Vec2::ZERO);
        let first = holdable(&mut arena, &mut possession, Vec2::new(1.0, 0.0));
        let second = holdable(&mut arena, &mut possession, Vec2::new(-1.0, 0.0));

        let target = select_target(
            &arena,
            &possession,
            ALICE,
            ActionKind::Interact,
            &[second, first],
        );

        assert_eq!(target, Some(first));
    }

    #[test]
    fn held_holdables_are_not_pickup_targets() {
        let mut arena = Arena::new();
        let mut possession = PossessionRegistry::new();
        character(&mut arena, ALICE, Vec2::ZERO);
        let item = holdable(&mut arena, &mut possession, Vec2::new(0.5, 0.0));
        possession.acquire(item, BOB);

        assert_eq!(
            select_target(&arena, &possession, ALICE, ActionKind::Interact, &[item]),
            None
        );
    }

    #[test]
    fn holding_requester_targets_containers_only() {
        let mut arena = Arena::new();
        let mut possession = PossessionRegistry::new();
        let alice = character(&mut arena, ALICE, Vec2::ZERO);
        let item = holdable(&mut arena, &mut possession, Vec2::new(0.2, 0.0));
        let pot = arena.spawn(
            Vec2::new(1.0, 0.0),
            EntityInner::Container(ContainerComponents::default()),
        );
        possession.acquire(item, ALICE);
        arena.get_mut(alice).unwrap().as_character_mut().unwrap().held = Some(item);

        let target = select_target(&arena, &possession, ALICE, ActionKind::Interact, &[item, pot]);

        assert_eq!(target, Some(pot));
    }

    #[test]
    fn steal_targets_other_holding_characters() {
        let mut arena = Arena::new();
        let mut possession = PossessionRegistry::new();
        let alice = character(&mut arena, ALICE, Vec2::ZERO);
        let bob = character(&mut arena, BOB, Vec2::new(1.0, 0.0));

        assert_eq!(
            select_target(&arena, &possession, BOB, ActionKind::Steal, &[alice, bob]),
            None,
            "nobody is holding anything"
        );

        let item = holdable(&mut arena, &mut possession, Vec2::ZERO);
        possession.acquire(item, ALICE);
        arena.get_mut(alice).unwrap().as_character_mut().unwrap().held = Some(item);

        assert_eq!(
            select_target(&arena, &possession, BOB, ActionKind::Steal, &[alice, bob]),
            Some(alice)
        );
        assert_eq!(
            select_target(&arena, &possession, ALICE, ActionKind::Steal, &[alice]),
            None,
            "cannot steal from yourself"
        );
    }

    #[test]
    fn requester_without_character_has_no_target() {
        let arena = Arena::new();
        let possession = PossessionRegistry::new();
        assert_eq!(
            select_target(&arena, &possession, ALICE, ActionKind::Interact, &[]),
            None
        );
    }
}
