//! Possession registry: who holds which holdable.
//!
//! The registry is the single source of truth for the possession state of
//! every holdable entity. It is pure state plus transition rules and performs
//! no I/O. It is only mutated from inside the authority's tick step, so it
//! needs no locking.
//!
//! # Transitions
//!
//! ```text
//!            acquire(p)                 transfer(p -> q)
//!   Free ─────────────────▶ HeldBy(p) ───────────────────▶ HeldBy(q)
//!    ▲                          │
//!    └──────── release ─────────┘
//! ```
//!
//! `transfer` is the only way to move a holdable between two holders, and it
//! does so in one call: no caller can ever observe the intermediate `Free`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, ParticipantId};

/// Possession state of a holdable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PossessionState {
    /// Lying in the world; anyone in reach may pick it up.
    Free,
    /// Held by a participant's character.
    HeldBy(ParticipantId),
}

impl PossessionState {
    /// Returns the holder, if any.
    #[must_use]
    pub const fn holder(self) -> Option<ParticipantId> {
        match self {
            Self::Free => None,
            Self::HeldBy(participant) => Some(participant),
        }
    }

    /// Returns true if nobody holds the entity.
    #[must_use]
    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }
}

/// Registry of possession states keyed by holdable entity.
///
/// # Example
///
/// ```
/// use ptooey_core::entity::{EntityId, ParticipantId};
/// use ptooey_core::possession::{PossessionRegistry, PossessionState};
///
/// let mut registry = PossessionRegistry::new();
/// let tomato = EntityId::new(1);
/// let alice = ParticipantId::new(1);
/// let bob = ParticipantId::new(2);
///
/// registry.free(tomato);
/// assert!(registry.acquire(tomato, alice));
/// assert!(!registry.acquire(tomato, bob));
/// assert!(registry.transfer(tomato, alice, bob));
/// assert_eq!(registry.query(tomato), Some(PossessionState::HeldBy(bob)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PossessionRegistry {
    states: BTreeMap<EntityId, PossessionState>,
}

impl PossessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `entity` as free, or forces it back to `Free`.
    ///
    /// Used when a holdable is spawned.
    pub fn free(&mut self, entity: EntityId) {
        self.states.insert(entity, PossessionState::Free);
    }

    /// Attempts `Free → HeldBy(participant)`.
    ///
    /// Returns false (and changes nothing) if the entity is unknown or held
    /// by someone else. Re-acquiring an entity already held by `participant`
    /// succeeds without change.
    pub fn acquire(&mut self, entity: EntityId, participant: ParticipantId) -> bool {
        match self.states.get_mut(&entity) {
            Some(state @ PossessionState::Free) => {
                *state = PossessionState::HeldBy(participant);
                true
            }
            Some(PossessionState::HeldBy(holder)) => *holder == participant,
            None => false,
        }
    }

    /// Transitions `HeldBy(_) → Free` unconditionally.
    ///
    /// Unknown entities are ignored.
    pub fn release(&mut self, entity: EntityId) {
        if let Some(state) = self.states.get_mut(&entity) {
            *state = PossessionState::Free;
        }
    }

    /// Atomically moves `entity` from `from` to `to`.
    ///
    /// Returns false (and changes nothing) unless the entity is currently
    /// `HeldBy(from)`.
    pub fn transfer(&mut self, entity: EntityId, from: ParticipantId, to: ParticipantId) -> bool {
        match self.states.get_mut(&entity) {
            Some(state) if *state == PossessionState::HeldBy(from) => {
                *state = PossessionState::HeldBy(to);
                true
            }
            _ => false,
        }
    }

    /// Returns the possession state of `entity`, or `None` if unregistered.
    #[must_use]
    pub fn query(&self, entity: EntityId) -> Option<PossessionState> {
        self.states.get(&entity).copied()
    }

    /// Returns the holder of `entity`, if it is held.
    #[must_use]
    pub fn holder(&self, entity: EntityId) -> Option<ParticipantId> {
        self.query(entity).and_then(PossessionState::holder)
    }

    /// Returns true if `entity` is registered and free.
    #[must_use]
    pub fn is_free(&self, entity: EntityId) -> bool {
        matches!(self.query(entity), Some(PossessionState::Free))
    }

    /// Removes a despawned entity from the registry.
    pub fn forget(&mut self, entity: EntityId) -> Option<PossessionState> {
        self.states.remove(&entity)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Iterates `(entity, state)` pairs in entity order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, PossessionState)> + '_ {
        self.states.iter().map(|(id, state)| (*id, *state))
    }

    /// Returns the number of registered holdables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if no holdables are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM: EntityId = EntityId::new(10);
    const ALICE: ParticipantId = ParticipantId::new(1);
    const BOB: ParticipantId = ParticipantId::new(2);

    fn registry_with_free_item() -> PossessionRegistry {
        let mut registry = PossessionRegistry::new();
        registry.free(ITEM);
        registry
    }

    #[test]
    fn acquire_free_entity_succeeds() {
        let mut registry = registry_with_free_item();
        assert!(registry.acquire(ITEM, ALICE));
        assert_eq!(registry.query(ITEM), Some(PossessionState::HeldBy(ALICE)));
        assert_eq!(registry.holder(ITEM), Some(ALICE));
    }

    #[test]
    fn acquire_held_by_other_fails_without_change() {
        let mut registry = registry_with_free_item();
        registry.acquire(ITEM, ALICE);

        assert!(!registry.acquire(ITEM, BOB));
        assert_eq!(registry.holder(ITEM), Some(ALICE));
    }

    #[test]
    fn acquire_by_current_holder_is_idempotent() {
        let mut registry = registry_with_free_item();
        assert!(registry.acquire(ITEM, ALICE));
        assert!(registry.acquire(ITEM, ALICE));
        assert_eq!(registry.holder(ITEM), Some(ALICE));
    }

    #[test]
    fn acquire_unknown_entity_fails() {
        let mut registry = PossessionRegistry::new();
        assert!(!registry.acquire(ITEM, ALICE));
        assert_eq!(registry.query(ITEM), None);
    }

    #[test]
    fn release_is_unconditional() {
        let mut registry = registry_with_free_item();
        registry.acquire(ITEM, BOB);
        registry.release(ITEM);
        assert!(registry.is_free(ITEM));

        // Releasing a free entity keeps it free
        registry.release(ITEM);
        assert!(registry.is_free(ITEM));
    }

    #[test]
    fn transfer_requires_current_holder() {
        let mut registry = registry_with_free_item();
        assert!(!registry.transfer(ITEM, ALICE, BOB), "free item cannot be transferred");

        registry.acquire(ITEM, ALICE);
        assert!(!registry.transfer(ITEM, BOB, ALICE), "wrong victim");
        assert!(registry.transfer(ITEM, ALICE, BOB));
        assert_eq!(registry.holder(ITEM), Some(BOB));
    }

    #[test]
    fn forget_removes_entry() {
        let mut registry = registry_with_free_item();
        assert_eq!(registry.forget(ITEM), Some(PossessionState::Free));
        assert!(registry.is_empty());
        assert_eq!(registry.forget(ITEM), None);
    }

    #[test]
    fn iter_is_sorted_by_entity() {
        let mut registry = PossessionRegistry::new();
        registry.free(EntityId::new(3));
        registry.free(EntityId::new(1));
        registry.free(EntityId::new(2));

        let ids: Vec<_> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![EntityId::new(1), EntityId::new(2), EntityId::new(3)]);
        assert_eq!(registry.len(), 3);
    }
}
