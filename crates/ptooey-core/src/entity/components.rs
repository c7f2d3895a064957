//! Component structs for entity types.
//!
//! The component structs hold all per-entity state that is not shared with
//! another subsystem. Possession of a holdable is deliberately absent here:
//! it lives in the [`PossessionRegistry`](crate::possession::PossessionRegistry)
//! so there is exactly one place that says who holds what.

use serde::{Deserialize, Serialize};

use super::{EntityId, ItemKind, ParticipantId};

/// Components for holdable ingredient entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldableComponents {
    /// Ingredient kind carried into the container on deposit.
    pub kind: ItemKind,
}

impl HoldableComponents {
    /// Creates holdable components of the given kind.
    #[must_use]
    pub const fn new(kind: ItemKind) -> Self {
        Self { kind }
    }
}

/// Components for the shared container (the pot).
///
/// `deposited` is an ordered multiset: order of insertion is preserved for
/// publication, but recipe matching treats it as a bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerComponents {
    /// Item kinds deposited since the last completed recipe, oldest first.
    /// Never longer than the matcher's capacity.
    pub deposited: Vec<ItemKind>,
    /// Index into the recipe catalog of the recipe being matched.
    pub active_recipe: Option<usize>,
}

impl ContainerComponents {
    /// Returns the number of items deposited since the last completion.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deposited.len()
    }

    /// Returns true if nothing has been deposited since the last completion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deposited.is_empty()
    }
}

/// One-shot action counters for the animation layer.
///
/// Counters wrap on overflow. Observers compare against the last value they
/// saw, so a counter that changed by any amount means "play the effect".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounters {
    /// Incremented on every successful pickup or steal.
    pub pickup: u8,
    /// Incremented on every drop-in-place or deposit.
    pub throw: u8,
    /// Incremented on every jump edge.
    pub jump: u8,
}

impl ActionCounters {
    /// Records a pickup.
    pub fn bump_pickup(&mut self) {
        self.pickup = self.pickup.wrapping_add(1);
    }

    /// Records a throw (drop or deposit).
    pub fn bump_throw(&mut self) {
        self.throw = self.throw.wrapping_add(1);
    }

    /// Records a jump.
    pub fn bump_jump(&mut self) {
        self.jump = self.jump.wrapping_add(1);
    }
}

/// Components for participant-controlled characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterComponents {
    /// Participant with input authority over this character.
    pub owner: ParticipantId,
    /// Facing yaw in radians, kept in `[0, 2π)`.
    pub facing: f32,
    /// Entity currently held, mirrored by `HeldBy(owner)` in the registry.
    pub held: Option<EntityId>,
    /// Horizontal speed integrated on the last tick (for the animator).
    pub speed: f32,
    /// Cosmetic one-shot counters.
    pub counters: ActionCounters,
}

impl CharacterComponents {
    /// Creates an empty-handed character for `owner` facing `facing`.
    #[must_use]
    pub fn new(owner: ParticipantId, facing: f32) -> Self {
        Self {
            owner,
            facing,
            held: None,
            speed: 0.0,
            counters: ActionCounters::default(),
        }
    }

    /// Returns true if the character holds nothing.
    #[must_use]
    pub const fn is_empty_handed(&self) -> bool {
        self.held.is_none()
    }
}
