//! Published state and the observer replica.
//!
//! After every tick the authority publishes a [`StateSnapshot`]: the full
//! entity, participant, score and round state. Snapshots are plain serde
//! data; the transport layer decides how to ship them.
//!
//! Observers keep a [`ReplicaView`] that applies snapshots strictly in tick
//! order and never writes shared state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::container::ContainerMatcher;
use crate::entity::{ActionCounters, EntityId, EntityTag, ItemKind, ParticipantId};
use crate::possession::{PossessionRegistry, PossessionState};
use crate::session::{RoundPhase, Session};

// =============================================================================
// Views
// =============================================================================

/// One entity as observers see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    /// Entity id
    pub entity_id: EntityId,
    /// What the entity is
    pub kind: EntityTag,
    /// Ingredient kind, for holdables
    pub item: Option<ItemKind>,
    /// World position
    pub position: Vec2,
    /// Possession state, for holdables
    pub possession: Option<PossessionState>,
}

/// A participant's character as observers see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterView {
    /// Character entity id
    pub entity_id: EntityId,
    /// World position
    pub position: Vec2,
    /// Facing yaw in radians
    pub facing: f32,
    /// Held entity, if any
    pub held_entity: Option<EntityId>,
    /// Speed integrated on the last tick
    pub speed: f32,
    /// Cosmetic one-shot counters
    pub counters: ActionCounters,
}

/// One roster entry as observers see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantView {
    /// Participant id
    pub participant_id: ParticipantId,
    /// Display name
    pub name: String,
    /// RGB color
    pub color: [u8; 3],
    /// Round score, if the participant is in this round's ledger
    pub score: Option<u32>,
    /// Character, while one is spawned
    pub character: Option<CharacterView>,
}

/// A ledger entry. Includes participants who left mid-round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Participant id
    pub participant_id: ParticipantId,
    /// Score
    pub score: u32,
}

/// Round state as observers see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    /// Lifecycle phase
    pub phase: RoundPhase,
    /// Seconds left on the running timer; absent when no timer runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<f32>,
    /// Name of the recipe the pot is asking for
    pub active_recipe: Option<String>,
    /// Items in the pot since the last completion, oldest first
    pub deposited: Vec<ItemKind>,
}

/// Everything published for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Tick this state belongs to
    pub tick: u64,
    /// Entities in id order
    pub entities: Vec<EntityView>,
    /// Roster in join order
    pub participants: Vec<ParticipantView>,
    /// Ledger in participant order
    pub scores: Vec<ScoreEntry>,
    /// Round state
    pub round: RoundView,
}

impl StateSnapshot {
    /// Captures the authority's state at `tick`.
    #[must_use]
    pub fn capture(
        tick: u64,
        tick_rate: u32,
        arena: &Arena,
        possession: &PossessionRegistry,
        session: &Session,
        matcher: &ContainerMatcher,
    ) -> Self {
        let entities = arena
            .entities_sorted()
            .map(|entity| EntityView {
                entity_id: entity.id(),
                kind: entity.tag(),
                item: entity.as_holdable().map(|holdable| holdable.kind),
                position: entity.position(),
                possession: possession.query(entity.id()),
            })
            .collect();

        let ledger = session.ledger();
        let participants = session
            .roster()
            .iter()
            .map(|entry| ParticipantView {
                participant_id: entry.id,
                name: entry.name.clone(),
                color: entry.color,
                score: ledger.score(entry.id),
                character: arena
                    .character_of(entry.id)
                    .and_then(|id| arena.get(id))
                    .and_then(|entity| {
                        entity.as_character().map(|character| CharacterView {
                            entity_id: entity.id(),
                            position: entity.position(),
                            facing: character.facing,
                            held_entity: character.held,
                            speed: character.speed,
                            counters: character.counters,
                        })
                    }),
            })
            .collect();

        let scores = ledger
            .iter()
            .map(|(participant_id, score)| ScoreEntry {
                participant_id,
                score,
            })
            .collect();

        let pot = arena.entities_sorted().find_map(|entity| entity.as_container());
        #[allow(clippy::cast_precision_loss)]
        let remaining_seconds = session
            .remaining_ticks(tick)
            .map(|ticks| ticks as f32 / tick_rate as f32);
        let round = RoundView {
            phase: session.phase(),
            remaining_seconds,
            active_recipe: pot
                .and_then(|pot| matcher.active_recipe(pot))
                .map(|recipe| recipe.name.clone()),
            deposited: pot.map(|pot| pot.deposited.clone()).unwrap_or_default(),
        };

        Self {
            tick,
            entities,
            participants,
            scores,
            round,
        }
    }

    /// Looks up a participant by id.
    #[must_use]
    pub fn participant(&self, id: ParticipantId) -> Option<&ParticipantView> {
        self.participants.iter().find(|p| p.participant_id == id)
    }

    /// Looks up an entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntityView> {
        self.entities
            .binary_search_by_key(&id, |view| view.entity_id)
            .ok()
            .map(|index| &self.entities[index])
    }
}

// =============================================================================
// Replica
// =============================================================================

/// Read-only replica of the published state.
///
/// # Example
///
/// ```
/// use ptooey_core::config::SessionConfig;
/// use ptooey_core::simulation::Simulation;
/// use ptooey_core::snapshot::ReplicaView;
///
/// let mut sim = Simulation::new(SessionConfig::default(), 7).unwrap();
/// let first = sim.step().snapshot;
/// let second = sim.step().snapshot;
///
/// let mut replica = ReplicaView::default();
/// assert!(replica.apply(second));
/// assert!(!replica.apply(first), "older snapshot is ignored");
/// assert_eq!(replica.tick(), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicaView {
    latest: Option<StateSnapshot>,
}

impl ReplicaView {
    /// Applies `snapshot` if it is newer than the one held.
    ///
    /// Returns false for duplicate or out-of-order deliveries.
    pub fn apply(&mut self, snapshot: StateSnapshot) -> bool {
        if self.tick().is_some_and(|tick| snapshot.tick <= tick) {
            return false;
        }
        self.latest = Some(snapshot);
        true
    }

    /// Latest applied snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&StateSnapshot> {
        self.latest.as_ref()
    }

    /// Tick of the latest applied snapshot.
    #[must_use]
    pub fn tick(&self) -> Option<u64> {
        self.latest.as_ref().map(|snapshot| snapshot.tick)
    }

    /// Round phase of the latest applied snapshot.
    #[must_use]
    pub fn phase(&self) -> Option<RoundPhase> {
        self.latest.as_ref().map(|snapshot| snapshot.round.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::container::{Recipe, RecipeCatalog};
    use crate::entity::{CharacterComponents, ContainerComponents, EntityInner, HoldableComponents};

    fn empty_snapshot(tick: u64) -> StateSnapshot {
        StateSnapshot {
            tick,
            entities: vec![],
            participants: vec![],
            scores: vec![],
            round: RoundView {
                phase: RoundPhase::WaitingForPlayers,
                remaining_seconds: None,
                active_recipe: None,
                deposited: vec![],
            },
        }
    }

    #[test]
    fn replica_only_moves_forward() {
        let mut replica = ReplicaView::default();
        assert_eq!(replica.tick(), None);
        assert!(replica.apply(empty_snapshot(3)));
        assert!(!replica.apply(empty_snapshot(3)), "duplicate");
        assert!(!replica.apply(empty_snapshot(2)), "reordered");
        assert!(replica.apply(empty_snapshot(4)));
        assert_eq!(replica.tick(), Some(4));
        assert_eq!(replica.phase(), Some(RoundPhase::WaitingForPlayers));
    }

    #[test]
    fn capture_reports_entities_participants_and_pot() {
        let config = SessionConfig::default();
        let mut session = Session::new(&config);
        let alice = ParticipantId::new(1);
        session.roster_mut().join(alice, "Alice", [9, 9, 9]).unwrap();
        session.enter(RoundPhase::Live, 0);

        let mut arena = Arena::new();
        let mut possession = PossessionRegistry::new();
        let character = arena.spawn(
            Vec2::ONE,
            EntityInner::Character(CharacterComponents::new(alice, 0.5)),
        );
        let tomato = arena.spawn(
            Vec2::ZERO,
            EntityInner::Holdable(HoldableComponents::new(ItemKind::Tomato)),
        );
        possession.free(tomato);
        arena.spawn(
            Vec2::ZERO,
            EntityInner::Container(ContainerComponents {
                deposited: vec![ItemKind::Onion],
                active_recipe: Some(0),
            }),
        );
        let matcher = ContainerMatcher::new(
            RecipeCatalog::new(vec![Recipe::new("Soup", vec![ItemKind::Onion], 5)]),
            1,
            50,
        );

        let snapshot = StateSnapshot::capture(60, 60, &arena, &possession, &session, &matcher);

        assert_eq!(snapshot.entities.len(), 3);
        assert_eq!(
            snapshot.entity(tomato).and_then(|e| e.possession),
            Some(PossessionState::Free)
        );
        let view = snapshot.participant(alice).unwrap();
        assert_eq!(view.score, Some(0));
        assert_eq!(view.character.as_ref().map(|c| c.entity_id), Some(character));
        assert_eq!(snapshot.round.phase, RoundPhase::Live);
        let remaining = snapshot.round.remaining_seconds.unwrap();
        assert!((remaining - 119.0).abs() < 1e-4);
        assert_eq!(snapshot.round.active_recipe.as_deref(), Some("Soup"));
        assert_eq!(snapshot.round.deposited, vec![ItemKind::Onion]);
    }

    #[test]
    fn snapshot_serializes_roundtrip() {
        let snapshot = empty_snapshot(12);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: StateSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn idle_round_omits_remaining_seconds() {
        let idle = serde_json::to_value(empty_snapshot(3)).unwrap();
        assert!(idle["round"].get("remaining_seconds").is_none());

        let mut timed = empty_snapshot(3);
        timed.round.phase = RoundPhase::Live;
        timed.round.remaining_seconds = Some(0.0);
        let timed = serde_json::to_value(&timed).unwrap();
        assert_eq!(timed["round"]["remaining_seconds"], 0.0);
    }
}
