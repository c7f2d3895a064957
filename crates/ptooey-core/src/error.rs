//! Error types for configuration, roster management, and invariant checks.
//!
//! Gameplay requests never produce errors: an invalid pickup, steal, or
//! deposit is a silent no-op. Errors only exist at the edges of the core,
//! where a caller can do something about them.

use thiserror::Error;

use crate::entity::{EntityId, ParticipantId};

/// Invalid session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The tick rate must be at least one tick per second.
    #[error("tick rate must be positive")]
    ZeroTickRate,

    /// A round needs at least one participant.
    #[error("min_players must be at least 1")]
    ZeroMinPlayers,

    /// The roster cap is below the start threshold.
    #[error("max_players ({max}) is below min_players ({min})")]
    MaxBelowMin {
        /// Configured `min_players`
        min: usize,
        /// Configured `max_players`
        max: usize,
    },

    /// A duration, speed, or distance is zero, negative, or not finite.
    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive {
        /// Name of the offending field
        field: &'static str,
        /// Value that was supplied
        value: f32,
    },

    /// A recipe lists no required items and would complete on any deposit.
    #[error("recipe '{0}' has no required items")]
    EmptyRecipe(String),

    /// The pot must hold at least one item.
    #[error("container_capacity must be at least 1")]
    ZeroContainerCapacity,

    /// A recipe needs more items than the pot can hold, so it could never
    /// complete.
    #[error("recipe '{name}' needs {required} items but the container holds {capacity}")]
    RecipeExceedsCapacity {
        /// Recipe name
        name: String,
        /// Items the recipe requires
        required: usize,
        /// Configured `container_capacity`
        capacity: usize,
    },

    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Rejected roster operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The participant is already on the roster.
    #[error("participant {0} already joined")]
    DuplicateParticipant(ParticipantId),

    /// The participant is not on the roster.
    #[error("participant {0} is not on the roster")]
    UnknownParticipant(ParticipantId),

    /// The roster is at `max_players`.
    #[error("roster is full ({0} players)")]
    RosterFull(usize),
}

/// A broken possession invariant found by
/// [`Simulation::check_invariants`](crate::simulation::Simulation::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The registry says a participant holds an item their character does not reference.
    #[error("{item} is HeldBy({holder}) but the holder's character does not reference it")]
    HolderMismatch {
        /// Item in question
        item: EntityId,
        /// Holder according to the registry
        holder: ParticipantId,
    },

    /// A character references an item the registry does not assign to its owner.
    #[error("character {character} references {item} which is not held by its owner")]
    DanglingHeldReference {
        /// Character entity
        character: EntityId,
        /// Referenced item
        item: EntityId,
    },

    /// A holdable in the arena has no registry entry, or vice versa.
    #[error("{0} is missing from the arena or the possession registry")]
    Unregistered(EntityId),
}
