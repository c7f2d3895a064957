//! Entity storage for one round.
//!
//! Entities live in a `BTreeMap` keyed by [`EntityId`]; ids are never reused,
//! so iteration is spawn order on every run. Alongside the entities the arena
//! keeps a [`ReachIndex`] of positions, which answers the interaction
//! resolver's "what is within reach of this character" question, and a map
//! from participant to the character they control.
//!
//! Move entities with [`Arena::set_position`] so the reach index sees the
//! new position. Spawning and despawning keep it current on their own.
//!
//! # Example
//!
//! ```
//! use ptooey_core::arena::{Arena, ProximityQuery};
//! use ptooey_core::entity::{EntityInner, HoldableComponents, ItemKind};
//! use glam::Vec2;
//!
//! let mut arena = Arena::new();
//! let tomato = arena.spawn(
//!     Vec2::new(1.0, 2.0),
//!     EntityInner::Holdable(HoldableComponents::new(ItemKind::Tomato)),
//! );
//!
//! let nearby = arena.reach_index().find_candidates(Vec2::new(1.0, 2.0), 0.5);
//! assert!(nearby.contains(&tomato));
//! ```

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityInner, ParticipantId};

// =============================================================================
// Proximity Query
// =============================================================================

/// Reach-limited candidate search supplied by the collision layer.
///
/// The resolver does not know how candidates are computed; it only relies on
/// the returned ids being entities that are "within reach" of `origin`.
/// Implementations should return ids in a stable order.
pub trait ProximityQuery {
    /// Returns ids of entities within `radius` of `origin`.
    fn find_candidates(&self, origin: Vec2, radius: f32) -> Vec<EntityId>;
}

// =============================================================================
// Reach Index
// =============================================================================

/// Positions of every entity, for reach checks during interaction.
///
/// A kitchen holds a handful of entities, so a reach query is a scan. Ids
/// come back in ascending order because the map is ordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReachIndex {
    positions: BTreeMap<EntityId, Vec2>,
}

impl ReachIndex {
    /// Records where `id` now stands.
    fn place(&mut self, id: EntityId, position: Vec2) {
        self.positions.insert(id, position);
    }

    fn forget(&mut self, id: EntityId) {
        self.positions.remove(&id);
    }

    /// Ids of entities no farther than `reach` from `origin`, ascending.
    /// An entity exactly `reach` away counts as within reach.
    #[must_use]
    pub fn within_reach(&self, origin: Vec2, reach: f32) -> Vec<EntityId> {
        let reach_sq = reach * reach;
        self.positions
            .iter()
            .filter(|(_, position)| origin.distance_squared(**position) <= reach_sq)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl ProximityQuery for ReachIndex {
    fn find_candidates(&self, origin: Vec2, radius: f32) -> Vec<EntityId> {
        self.within_reach(origin, radius)
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Every entity in the round, plus the tick counter.
///
/// # Example
///
/// ```
/// use ptooey_core::arena::Arena;
/// use ptooey_core::entity::{CharacterComponents, EntityInner, ParticipantId};
/// use glam::Vec2;
///
/// let mut arena = Arena::new();
/// let owner = ParticipantId::new(1);
/// let character = arena.spawn(
///     Vec2::ZERO,
///     EntityInner::Character(CharacterComponents::new(owner, 0.0)),
/// );
///
/// assert_eq!(arena.character_of(owner), Some(character));
/// arena.despawn(character);
/// assert_eq!(arena.character_of(owner), None);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Entity storage with deterministic iteration order.
    entities: BTreeMap<EntityId, Entity>,
    /// Positions for reach queries.
    reach: ReachIndex,
    /// Characters keyed by their owning participant.
    characters: BTreeMap<ParticipantId, EntityId>,
    /// Current simulation tick.
    tick: u64,
}

impl Arena {
    /// Creates a new empty arena at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a new entity at `position` and returns its unique ID.
    ///
    /// The entity is added to the reach index. Characters are also
    /// registered under their owner; spawning a second character for the
    /// same owner replaces the mapping.
    pub fn spawn(&mut self, position: Vec2, inner: EntityInner) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;

        if let EntityInner::Character(character) = &inner {
            self.characters.insert(character.owner, id);
        }

        self.reach.place(id, position);
        self.entities.insert(id, Entity::new(id, position, inner));
        id
    }

    /// Despawns an entity from the arena, returning it if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.reach.forget(id);
        let entity = self.entities.remove(&id)?;
        if let Some(character) = entity.as_character() {
            if self.characters.get(&character.owner) == Some(&id) {
                self.characters.remove(&character.owner);
            }
        }
        Some(entity)
    }

    /// Returns a reference to an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity by ID.
    ///
    /// Do not change the position through this reference; use
    /// [`Arena::set_position`].
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Moves an entity and updates the reach index.
    ///
    /// Returns false if the entity does not exist.
    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.set_position(position);
                self.reach.place(id, position);
                true
            }
            None => false,
        }
    }

    /// Returns the position of an entity.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.entities.get(&id).map(Entity::position)
    }

    /// Returns the character entity controlled by `participant`.
    #[must_use]
    pub fn character_of(&self, participant: ParticipantId) -> Option<EntityId> {
        self.characters.get(&participant).copied()
    }

    /// Returns an iterator over entity IDs in deterministic (sorted) order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns an iterator over entities in deterministic (sorted by ID) order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns the number of entities in the arena.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the arena has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Positions used for interaction reach checks.
    #[must_use]
    pub fn reach_index(&self) -> &ReachIndex {
        &self.reach
    }

    /// Returns the current simulation tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Advances the simulation tick counter.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================
