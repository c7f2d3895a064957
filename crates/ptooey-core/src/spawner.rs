//! Ingredient spawners.
//!
//! Each spawner keeps one free ingredient of its kind available at its
//! position. Once that ingredient is picked up (or consumed), the spawner
//! forgets it and waits out a cooldown before producing the next one.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::SpawnerConfig;
use crate::entity::{EntityId, EntityInner, HoldableComponents, ItemKind};
use crate::resolver::AuthorityContext;
use crate::session::TickTimer;

/// One ingredient spawn point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientSpawner {
    kind: ItemKind,
    position: Vec2,
    current: Option<EntityId>,
    cooldown: Option<TickTimer>,
}

impl IngredientSpawner {
    /// Creates an idle spawner.
    #[must_use]
    pub const fn new(kind: ItemKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            current: None,
            cooldown: None,
        }
    }

    /// Creates a spawner from its configuration.
    #[must_use]
    pub const fn from_config(config: &SpawnerConfig) -> Self {
        Self::new(config.kind, config.position)
    }

    /// Kind of ingredient produced.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }

    /// The ingredient waiting at this spawner, if any.
    #[must_use]
    pub const fn current(&self) -> Option<EntityId> {
        self.current
    }

    /// Forgets the current ingredient and stops the cooldown.
    pub fn disarm(&mut self) {
        self.current = None;
        self.cooldown = None;
    }

    /// Advances the spawner by one tick.
    ///
    /// Returns the id of a newly spawned ingredient.
    pub fn advance(
        &mut self,
        ctx: &mut AuthorityContext<'_>,
        cooldown_ticks: u64,
    ) -> Option<EntityId> {
        if let Some(item) = self.current {
            let waiting = ctx.arena.get(item).is_some() && ctx.possession.is_free(item);
            if waiting {
                return None;
            }
            self.current = None;
            self.cooldown = Some(TickTimer::after(ctx.tick, cooldown_ticks));
        }

        if self.cooldown.is_some_and(|timer| !timer.expired(ctx.tick)) {
            return None;
        }

        let item = ctx.spawn(
            self.position,
            EntityInner::Holdable(HoldableComponents::new(self.kind)),
        );
        trace!(kind = %self.kind, %item, "spawned ingredient");
        self.current = Some(item);
        self.cooldown = None;
        Some(item)
    }
}
