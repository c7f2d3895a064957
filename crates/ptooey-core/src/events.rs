//! Per-tick side effects published alongside the state snapshot.
//!
//! [`SimEvent`]s describe what happened during a tick, for telemetry and
//! one-shot client effects. [`LifecycleRequest`]s tell the replication layer
//! which networked objects to create or destroy.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityTag, ItemKind, ParticipantId};
use crate::session::RoundPhase;

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A free holdable was picked up.
    PickedUp {
        /// Who picked it up
        participant: ParticipantId,
        /// The holdable
        item: EntityId,
    },
    /// A held holdable changed hands.
    Stolen {
        /// New holder
        thief: ParticipantId,
        /// Previous holder
        victim: ParticipantId,
        /// The holdable
        item: EntityId,
    },
    /// A held holdable was released in place.
    Dropped {
        /// Previous holder
        participant: ParticipantId,
        /// The holdable
        item: EntityId,
        /// Where it now lies
        position: Vec2,
    },
    /// A held holdable was consumed by a container.
    Deposited {
        /// Depositor
        participant: ParticipantId,
        /// The consumed holdable
        item: EntityId,
        /// Its kind
        kind: ItemKind,
        /// Receiving container
        container: EntityId,
        /// Points credited by this deposit
        points: u32,
    },
    /// A deposit completed the active recipe.
    RecipeCompleted {
        /// Depositor who completed it
        participant: ParticipantId,
        /// Recipe name
        recipe: String,
    },
    /// The round phase changed.
    PhaseChanged {
        /// Phase left
        from: RoundPhase,
        /// Phase entered
        to: RoundPhase,
    },
    /// A participant's character was spawned.
    CharacterSpawned {
        /// Owner
        participant: ParticipantId,
        /// Character entity
        entity: EntityId,
    },
    /// A participant's character was removed.
    CharacterDespawned {
        /// Owner
        participant: ParticipantId,
        /// Character entity
        entity: EntityId,
    },
}

/// A networked object the replication layer must create or destroy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LifecycleRequest {
    /// Create an object for a new entity.
    Spawn {
        /// New entity
        entity: EntityId,
        /// What kind of entity it is
        tag: EntityTag,
        /// Initial position
        position: Vec2,
    },
    /// Destroy the object of a removed entity.
    Despawn {
        /// Removed entity
        entity: EntityId,
    },
}

/// Events and lifecycle requests accumulated during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    /// Events in the order they happened
    pub events: Vec<SimEvent>,
    /// Lifecycle requests in the order they were made
    pub lifecycle: Vec<LifecycleRequest>,
}

impl Effects {
    /// Records an event.
    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Records a lifecycle request.
    pub fn request(&mut self, request: LifecycleRequest) {
        self.lifecycle.push(request);
    }

    /// Takes everything accumulated so far, leaving the buffers empty.
    pub fn drain(&mut self) -> (Vec<SimEvent>, Vec<LifecycleRequest>) {
        (
            std::mem::take(&mut self.events),
            std::mem::take(&mut self.lifecycle),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_buffers() {
        let mut effects = Effects::default();
        effects.emit(SimEvent::PhaseChanged {
            from: RoundPhase::WaitingForPlayers,
            to: RoundPhase::CountingDown,
        });
        effects.request(LifecycleRequest::Despawn {
            entity: EntityId::new(4),
        });

        let (events, lifecycle) = effects.drain();

        assert_eq!(events.len(), 1);
        assert_eq!(lifecycle.len(), 1);
        assert_eq!(effects, Effects::default());
    }
}
