//! Entity module for the authoritative round simulation.
//!
//! This module provides the core entity types for Ptooey's shared kitchen:
//! - [`EntityId`]: Unique identifier for entities
//! - [`ParticipantId`]: Stable identifier for a connected participant
//! - [`ItemKind`]: The fixed enumeration of ingredient kinds
//! - [`EntityTag`]: Type classification of an entity
//! - [`EntityInner`]: Type-safe storage for entity-specific components
//! - [`Entity`]: The complete entity container
//!
//! # Architecture
//!
//! Interaction code never inspects an entity for components. Every entity is a
//! tagged variant looked up by its stable id in the [`Arena`](crate::arena::Arena),
//! and callers match on [`EntityInner`] to decide what a target is.
//!
//! # Example
//!
//! ```
//! use ptooey_core::entity::{Entity, EntityId, EntityInner, EntityTag, HoldableComponents, ItemKind};
//! use glam::Vec2;
//!
//! let tomato = Entity::new(
//!     EntityId::new(42),
//!     Vec2::ZERO,
//!     EntityInner::Holdable(HoldableComponents::new(ItemKind::Tomato)),
//! );
//!
//! assert_eq!(tomato.id().as_u64(), 42);
//! assert_eq!(tomato.tag(), EntityTag::Holdable);
//! ```

pub mod components;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use components::{ActionCounters, CharacterComponents, ContainerComponents, HoldableComponents};

/// Unique identifier for an entity.
///
/// `EntityId` is a newtype wrapper around `u64`. Entity IDs are assigned
/// monotonically by the arena and are never reused within a session, so a
/// stale id held by an observer can never alias a newer entity.
///
/// # Example
///
/// ```
/// use ptooey_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Stable identifier for a connected participant.
///
/// Assigned by the transport layer and carried unchanged through the roster,
/// the score ledger and possession states.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(u32);

impl ParticipantId {
    /// Creates a new `ParticipantId` from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({})", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl From<u32> for ParticipantId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

/// Ingredient kinds that can be carried and deposited.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Tomato
    Tomato,
    /// Onion
    Onion,
    /// Mushroom
    Mushroom,
    /// Carrot
    Carrot,
    /// Potato
    Potato,
    /// Cheese
    Cheese,
}

impl ItemKind {
    /// All item kinds in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Tomato,
        Self::Onion,
        Self::Mushroom,
        Self::Carrot,
        Self::Potato,
        Self::Cheese,
    ];
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tomato => "Tomato",
            Self::Onion => "Onion",
            Self::Mushroom => "Mushroom",
            Self::Carrot => "Carrot",
            Self::Potato => "Potato",
            Self::Cheese => "Cheese",
        };
        f.write_str(name)
    }
}

/// Entity type tag.
///
/// # Variants
///
/// - `Holdable`: An ingredient that can be picked up, dropped, stolen, deposited
/// - `Container`: The shared pot that matches deposits against recipes
/// - `Character`: A participant-controlled body
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Carriable ingredient
    Holdable,
    /// Recipe-matching pot
    Container,
    /// Participant-controlled character
    Character,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Holdable => write!(f, "Holdable"),
            Self::Container => write!(f, "Container"),
            Self::Character => write!(f, "Character"),
        }
    }
}

/// Type-safe storage for entity-specific components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityInner {
    /// Ingredient components
    Holdable(HoldableComponents),
    /// Pot components (deposited multiset, active recipe)
    Container(ContainerComponents),
    /// Character components (owner, facing, held item, cosmetic counters)
    Character(CharacterComponents),
}

impl EntityInner {
    /// Returns the corresponding `EntityTag` for this inner storage.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::Holdable(_) => EntityTag::Holdable,
            Self::Container(_) => EntityTag::Container,
            Self::Character(_) => EntityTag::Character,
        }
    }

    /// Returns a reference to the holdable components, if this is a holdable.
    #[must_use]
    pub const fn as_holdable(&self) -> Option<&HoldableComponents> {
        match self {
            Self::Holdable(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a reference to the container components, if this is a container.
    #[must_use]
    pub const fn as_container(&self) -> Option<&ContainerComponents> {
        match self {
            Self::Container(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a mutable reference to the container components, if this is a container.
    #[must_use]
    pub fn as_container_mut(&mut self) -> Option<&mut ContainerComponents> {
        match self {
            Self::Container(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a reference to the character components, if this is a character.
    #[must_use]
    pub const fn as_character(&self) -> Option<&CharacterComponents> {
        match self {
            Self::Character(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a mutable reference to the character components, if this is a character.
    #[must_use]
    pub fn as_character_mut(&mut self) -> Option<&mut CharacterComponents> {
        match self {
            Self::Character(components) => Some(components),
            _ => None,
        }
    }
}

/// A complete entity in the simulation.
///
/// An `Entity` combines a unique [`EntityId`], a world position, and an
/// [`EntityInner`] containing type-specific components. The tag is always
/// derived from the inner variant, so the two cannot disagree.
///
/// # Example
///
/// ```
/// use ptooey_core::entity::{Entity, EntityId, EntityInner, ContainerComponents};
/// use glam::Vec2;
///
/// let pot = Entity::new(
///     EntityId::new(1),
///     Vec2::new(0.0, 4.0),
///     EntityInner::Container(ContainerComponents::default()),
/// );
///
/// assert!(pot.is_container());
/// assert!(!pot.is_holdable());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    position: Vec2,
    inner: EntityInner,
}

impl Entity {
    /// Creates a new entity with the given ID, position, and inner storage.
    #[must_use]
    pub const fn new(id: EntityId, position: Vec2, inner: EntityInner) -> Self {
        Self {
            id,
            position,
            inner,
        }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's type tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.inner.tag()
    }

    /// Returns the entity's world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Sets the entity's world position.
    ///
    /// Prefer [`Arena::set_position`](crate::arena::Arena::set_position), which
    /// also keeps the reach index in sync.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Returns a reference to the entity's inner component storage.
    #[must_use]
    pub const fn inner(&self) -> &EntityInner {
        &self.inner
    }

    /// Returns a mutable reference to the entity's inner component storage.
    #[must_use]
    pub fn inner_mut(&mut self) -> &mut EntityInner {
        &mut self.inner
    }

    /// Returns `true` if this entity is a holdable ingredient.
    #[must_use]
    pub const fn is_holdable(&self) -> bool {
        matches!(self.inner, EntityInner::Holdable(_))
    }

    /// Returns `true` if this entity is a container.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self.inner, EntityInner::Container(_))
    }

    /// Returns `true` if this entity is a participant character.
    #[must_use]
    pub const fn is_character(&self) -> bool {
        matches!(self.inner, EntityInner::Character(_))
    }

    /// Returns the holdable components if this is a holdable.
    #[must_use]
    pub const fn as_holdable(&self) -> Option<&HoldableComponents> {
        self.inner.as_holdable()
    }

    /// Returns the container components if this is a container.
    #[must_use]
    pub const fn as_container(&self) -> Option<&ContainerComponents> {
        self.inner.as_container()
    }

    /// Returns mutable container components if this is a container.
    #[must_use]
    pub fn as_container_mut(&mut self) -> Option<&mut ContainerComponents> {
        self.inner.as_container_mut()
    }

    /// Returns the character components if this is a character.
    #[must_use]
    pub const fn as_character(&self) -> Option<&CharacterComponents> {
        self.inner.as_character()
    }

    /// Returns mutable character components if this is a character.
    #[must_use]
    pub fn as_character_mut(&mut self) -> Option<&mut CharacterComponents> {
        self.inner.as_character_mut()
    }
}

// =============================================================================
// Tests
// =============================================================================
