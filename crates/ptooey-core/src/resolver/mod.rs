//! Authority-side resolvers.
//!
//! Resolvers are where proposed changes become committed state. Every
//! mutation of shared state (possession, container contents, scores, entity
//! lifecycle) goes through an [`AuthorityContext`] handed to them by the
//! simulation step, so only the authority can ever write.
//!
//! # Available Resolvers
//!
//! - [`MovementResolver`]: integrates movement and facing from input snapshots
//! - [`InteractionResolver`]: resolves pickup, steal, deposit and drop requests
//!
//! # Invariants
//!
//! - Resolvers run inside the single-threaded tick step and never block
//! - Resolution is deterministic given the same state, requests and seed
//! - An invalid request resolves to [`InteractionOutcome::Ignored`] and
//!   changes nothing

mod interaction;
mod movement;
mod targeting;

pub use interaction::InteractionResolver;
pub use movement::MovementResolver;
pub use targeting::select_target;

use glam::Vec2;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::container::{ContainerMatcher, DepositReceipt};
use crate::entity::{Entity, EntityId, EntityInner, EntityTag, ParticipantId};
use crate::events::{Effects, LifecycleRequest};
use crate::possession::PossessionRegistry;
use crate::session::ScoreLedger;

// =============================================================================
// Requests and Outcomes
// =============================================================================

/// Kind of discrete action a participant can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Pick up, deposit, or drop depending on what the requester holds.
    Interact,
    /// Take the item another participant is holding.
    Steal,
}

/// A one-shot action request derived from a button edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Requesting participant
    pub requester: ParticipantId,
    /// Tick the request was raised on
    pub tick: u64,
    /// Requested action
    pub kind: ActionKind,
}

impl ActionRequest {
    /// Creates a request.
    #[must_use]
    pub const fn new(requester: ParticipantId, tick: u64, kind: ActionKind) -> Self {
        Self {
            requester,
            tick,
            kind,
        }
    }
}

/// Committed result of one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InteractionOutcome {
    /// Nothing legal to do; no state changed.
    Ignored,
    /// A free holdable is now held by the requester.
    PickedUp {
        /// The holdable
        item: EntityId,
    },
    /// A holdable moved from `victim` to the requester.
    Stolen {
        /// The holdable
        item: EntityId,
        /// Previous holder
        victim: ParticipantId,
    },
    /// The held holdable was consumed by a container.
    Deposited {
        /// The consumed holdable (now despawned)
        item: EntityId,
        /// Receiving container
        container: EntityId,
        /// Points and completion
        receipt: DepositReceipt,
    },
    /// The held holdable was released where the requester stands.
    Dropped {
        /// The holdable
        item: EntityId,
        /// Where it now lies
        position: Vec2,
    },
}

impl InteractionOutcome {
    /// Returns true if the request changed state.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

// =============================================================================
// Authority Context
// =============================================================================

/// Mutable view of all shared state, handed to resolvers by the authority.
///
/// There is no global "am I the authority" flag: holding an
/// `AuthorityContext` is what authorizes a mutation.
#[derive(Debug)]
pub struct AuthorityContext<'a> {
    /// Tick being simulated
    pub tick: u64,
    /// Entities
    pub arena: &'a mut Arena,
    /// Possession states of holdables
    pub possession: &'a mut PossessionRegistry,
    /// Round scores
    pub ledger: &'a mut ScoreLedger,
    /// Recipe matching rules
    pub matcher: &'a ContainerMatcher,
    /// Session randomness
    pub rng: &'a mut ChaCha8Rng,
    /// Events and lifecycle requests for this tick
    pub effects: &'a mut Effects,
}

impl AuthorityContext<'_> {
    /// Spawns an entity, registers holdables as free, and requests a
    /// networked object for it.
    pub fn spawn(&mut self, position: Vec2, inner: EntityInner) -> EntityId {
        let tag = inner.tag();
        let id = self.arena.spawn(position, inner);
        if tag == EntityTag::Holdable {
            self.possession.free(id);
        }
        self.effects.request(LifecycleRequest::Spawn {
            entity: id,
            tag,
            position,
        });
        id
    }

    /// Removes an entity from the arena and the registry and requests the
    /// destruction of its networked object.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.possession.forget(id);
        let entity = self.arena.despawn(id)?;
        self.effects
            .request(LifecycleRequest::Despawn { entity: id });
        Some(entity)
    }
}
