//! Container matcher: the shared pot and its recipes.
//!
//! A container holds an ordered multiset of deposited item kinds, at most
//! `capacity` of them; a deposit into a full container evicts the oldest
//! entry. Every deposit earns the depositor a flat per-item score. When the
//! multiset contains every kind the active recipe requires, at the required
//! multiplicity, the recipe completes: the depositor earns the recipe's
//! value plus a completion bonus, the multiset is cleared, and a new recipe
//! is drawn from the catalog.
//!
//! # Example
//!
//! ```
//! use ptooey_core::container::Recipe;
//! use ptooey_core::entity::ItemKind::{Onion, Tomato};
//!
//! let soup = Recipe::new("Tomato Soup", vec![Tomato, Tomato, Onion], 20);
//! assert!(soup.is_satisfied_by(&[Tomato, Onion, Tomato]));
//! assert!(!soup.is_satisfied_by(&[Tomato, Onion]));
//! ```

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{ContainerComponents, ItemKind, ParticipantId};
use crate::session::ScoreLedger;

// =============================================================================
// Recipes
// =============================================================================

/// A recipe: a named multiset of required item kinds and its point value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Display name
    pub name: String,
    /// Required kinds; duplicates raise the required multiplicity
    pub required: Vec<ItemKind>,
    /// Points awarded on completion (before the completion bonus)
    pub point_value: u32,
}

impl Recipe {
    /// Creates a recipe.
    #[must_use]
    pub fn new(name: impl Into<String>, required: Vec<ItemKind>, point_value: u32) -> Self {
        Self {
            name: name.into(),
            required,
            point_value,
        }
    }

    /// Returns true if `deposited` contains every required kind at least as
    /// many times as the recipe lists it. Extra items are allowed.
    #[must_use]
    pub fn is_satisfied_by(&self, deposited: &[ItemKind]) -> bool {
        let mut available = count_kinds(deposited);
        self.required.iter().all(|kind| match available.get_mut(kind) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        })
    }
}

fn count_kinds(items: &[ItemKind]) -> BTreeMap<ItemKind, usize> {
    let mut counts = BTreeMap::new();
    for kind in items {
        *counts.entry(*kind).or_insert(0) += 1;
    }
    counts
}

/// The ordered set of recipes a container can ask for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

impl RecipeCatalog {
    /// Creates a catalog from a list of recipes.
    #[must_use]
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    /// Returns the recipe at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Recipe> {
        self.recipes.get(index)
    }

    /// Draws a recipe index uniformly at random, or `None` if the catalog
    /// is empty.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        if self.recipes.is_empty() {
            None
        } else {
            Some(rng.gen_range(0..self.recipes.len()))
        }
    }

    /// Returns the number of recipes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Returns true if there are no recipes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

// =============================================================================
// Matcher
// =============================================================================

/// Items a container keeps before the oldest is evicted.
pub const DEFAULT_CONTAINER_CAPACITY: usize = 10;

/// Result of a single deposit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Points actually credited to the depositor's ledger entry. Zero when
    /// the depositor has no entry in this round's ledger.
    pub points_awarded: u32,
    /// Catalog index of the recipe this deposit completed, if any.
    pub completed: Option<usize>,
    /// Kind pushed out of a full container to make room, if any.
    pub evicted: Option<ItemKind>,
}

impl DepositReceipt {
    /// Always true: once a container has been identified, a deposit cannot
    /// be refused.
    #[must_use]
    pub const fn accepted(&self) -> bool {
        true
    }
}

/// Matches deposits against the active recipe and awards score.
///
/// The matcher is stateless apart from its constants; per-container state
/// lives in [`ContainerComponents`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMatcher {
    catalog: RecipeCatalog,
    points_per_item: u32,
    completion_bonus: u32,
    capacity: usize,
}

impl ContainerMatcher {
    /// Creates a matcher with [`DEFAULT_CONTAINER_CAPACITY`].
    #[must_use]
    pub fn new(catalog: RecipeCatalog, points_per_item: u32, completion_bonus: u32) -> Self {
        Self {
            catalog,
            points_per_item,
            completion_bonus,
            capacity: DEFAULT_CONTAINER_CAPACITY,
        }
    }

    /// Sets how many items a container keeps. Clamped to at least one.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Items a container keeps before evicting the oldest.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the recipe catalog.
    #[must_use]
    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    /// Returns the recipe the container is currently asking for.
    #[must_use]
    pub fn active_recipe<'a>(&'a self, container: &ContainerComponents) -> Option<&'a Recipe> {
        container.active_recipe.and_then(|i| self.catalog.get(i))
    }

    /// Clears the container and draws its first recipe.
    pub fn arm<R: Rng>(&self, container: &mut ContainerComponents, rng: &mut R) {
        container.deposited.clear();
        container.active_recipe = self.catalog.pick(rng);
    }

    /// Deposits `item` on behalf of `depositor`.
    ///
    /// The per-item points are awarded whatever the recipe state. A full
    /// container drops its oldest entry first, so a deposit is never refused.
    /// With no active recipe the completion check is skipped.
    pub fn deposit<R: Rng>(
        &self,
        container: &mut ContainerComponents,
        item: ItemKind,
        depositor: ParticipantId,
        ledger: &mut ScoreLedger,
        rng: &mut R,
    ) -> DepositReceipt {
        let evicted = if container.deposited.len() >= self.capacity {
            Some(container.deposited.remove(0))
        } else {
            None
        };
        container.deposited.push(item);

        let credited = ledger.award(depositor, self.points_per_item);
        let mut receipt = DepositReceipt {
            points_awarded: if credited { self.points_per_item } else { 0 },
            completed: None,
            evicted,
        };

        let Some(index) = container.active_recipe else {
            return receipt;
        };
        let Some(recipe) = self.catalog.get(index) else {
            return receipt;
        };
        if !recipe.is_satisfied_by(&container.deposited) {
            return receipt;
        }

        let reward = recipe.point_value.saturating_add(self.completion_bonus);
        if ledger.award(depositor, reward) {
            receipt.points_awarded = receipt.points_awarded.saturating_add(reward);
        }
        container.deposited.clear();
        container.active_recipe = self.catalog.pick(rng);

        debug!(
            recipe = %recipe.name,
            %depositor,
            reward,
            next_recipe = ?container.active_recipe,
            "recipe completed"
        );

        receipt.completed = Some(index);
        receipt
    }
}
