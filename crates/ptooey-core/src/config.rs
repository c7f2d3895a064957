//! Session configuration.
//!
//! One [`SessionConfig`] describes everything the authority needs to run a
//! round: timing, roster thresholds, movement tuning, scoring constants, the
//! recipe catalog, and level layout (spawn slots, pot, ingredient spawners).
//!
//! Missing fields in a JSON document fall back to [`SessionConfig::default`].
//!
//! # Example
//!
//! ```
//! use ptooey_core::config::SessionConfig;
//!
//! let config = SessionConfig::from_json_str(r#"{ "min_players": 3, "round_secs": 90.0 }"#).unwrap();
//! assert_eq!(config.min_players, 3);
//! assert_eq!(config.tick_rate, 60);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::container::{Recipe, DEFAULT_CONTAINER_CAPACITY};
use crate::entity::ItemKind;
use crate::error::ConfigError;

/// What to do when the roster drops below `min_players` after a round has
/// been armed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnderflowPolicy {
    /// Keep going: the countdown completes and the round runs to time.
    #[default]
    Ignore,
    /// Abort: a countdown falls back to waiting, a live round ends early.
    Abort,
}

/// Where a character appears at round start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnSlot {
    /// World position
    pub position: Vec2,
    /// Initial facing yaw in radians
    pub facing: f32,
}

impl SpawnSlot {
    /// Creates a spawn slot.
    #[must_use]
    pub const fn new(position: Vec2, facing: f32) -> Self {
        Self { position, facing }
    }
}

/// An ingredient spawn point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Kind of ingredient produced
    pub kind: ItemKind,
    /// Where the ingredient appears
    pub position: Vec2,
}

/// Full configuration for one authoritative session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Roster size that arms the countdown.
    pub min_players: usize,
    /// Joins beyond this are rejected.
    pub max_players: usize,
    /// Pre-round countdown length.
    pub countdown_secs: f32,
    /// Round length.
    pub round_secs: f32,
    /// Character speed in units per second.
    pub move_speed: f32,
    /// Speed multiplier while sprint is held.
    pub sprint_multiplier: f32,
    /// Radians of yaw per unit of horizontal look delta.
    pub look_sensitivity: f32,
    /// Radius of the interaction proximity search.
    pub reach_distance: f32,
    /// Points for every deposited item.
    pub points_per_item: u32,
    /// Extra points on top of a recipe's own value when it completes.
    pub completion_bonus: u32,
    /// Recipe catalog; may be empty.
    pub recipes: Vec<Recipe>,
    /// Character spawn slots in join order; may be empty.
    pub spawn_slots: Vec<SpawnSlot>,
    /// Where the pot is placed at round start.
    pub container_position: Vec2,
    /// Items the pot keeps before the oldest is evicted.
    pub container_capacity: usize,
    /// Ingredient spawn points.
    pub spawners: Vec<SpawnerConfig>,
    /// Delay before a spawner replaces a picked-up ingredient.
    pub spawner_cooldown_secs: f32,
    /// How far ahead of the current tick input may be submitted.
    pub input_buffer_ticks: u64,
    /// Roster underflow handling while counting down.
    pub countdown_underflow: UnderflowPolicy,
    /// Roster underflow handling while live.
    pub live_underflow: UnderflowPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            min_players: 2,
            max_players: 4,
            countdown_secs: 3.0,
            round_secs: 120.0,
            move_speed: 5.0,
            sprint_multiplier: 1.5,
            look_sensitivity: 0.01,
            reach_distance: 2.0,
            points_per_item: 1,
            completion_bonus: 50,
            container_capacity: DEFAULT_CONTAINER_CAPACITY,
            recipes: vec![
                Recipe::new(
                    "Tomato Soup",
                    vec![ItemKind::Tomato, ItemKind::Tomato, ItemKind::Onion],
                    20,
                ),
                Recipe::new(
                    "Mushroom Stew",
                    vec![ItemKind::Mushroom, ItemKind::Carrot, ItemKind::Potato],
                    30,
                ),
                Recipe::new(
                    "Cheesy Potatoes",
                    vec![ItemKind::Potato, ItemKind::Potato, ItemKind::Cheese],
                    25,
                ),
            ],
            spawn_slots: vec![
                SpawnSlot::new(Vec2::new(-4.0, -4.0), 0.0),
                SpawnSlot::new(Vec2::new(4.0, -4.0), 0.0),
                SpawnSlot::new(Vec2::new(-4.0, 4.0), std::f32::consts::PI),
                SpawnSlot::new(Vec2::new(4.0, 4.0), std::f32::consts::PI),
            ],
            container_position: Vec2::ZERO,
            spawners: ItemKind::ALL
                .iter()
                .enumerate()
                .map(|(i, kind)| SpawnerConfig {
                    kind: *kind,
                    #[allow(clippy::cast_precision_loss)]
                    position: Vec2::new(-7.5 + 3.0 * i as f32, 8.0),
                })
                .collect(),
            spawner_cooldown_secs: 3.0,
            input_buffer_ticks: 32,
            countdown_underflow: UnderflowPolicy::Ignore,
            live_underflow: UnderflowPolicy::Ignore,
        }
    }
}

impl SessionConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, or any validation
    /// error from [`SessionConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// An empty recipe catalog, no spawn slots, and no spawners are all
    /// valid; the round degrades instead of failing.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.min_players == 0 {
            return Err(ConfigError::ZeroMinPlayers);
        }
        if self.max_players < self.min_players {
            return Err(ConfigError::MaxBelowMin {
                min: self.min_players,
                max: self.max_players,
            });
        }

        let positive = [
            ("countdown_secs", self.countdown_secs),
            ("round_secs", self.round_secs),
            ("move_speed", self.move_speed),
            ("sprint_multiplier", self.sprint_multiplier),
            ("reach_distance", self.reach_distance),
            ("spawner_cooldown_secs", self.spawner_cooldown_secs),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if !self.look_sensitivity.is_finite() {
            return Err(ConfigError::NonPositive {
                field: "look_sensitivity",
                value: self.look_sensitivity,
            });
        }

        if self.container_capacity == 0 {
            return Err(ConfigError::ZeroContainerCapacity);
        }
        if let Some(recipe) = self.recipes.iter().find(|r| r.required.is_empty()) {
            return Err(ConfigError::EmptyRecipe(recipe.name.clone()));
        }
        if let Some(recipe) = self
            .recipes
            .iter()
            .find(|r| r.required.len() > self.container_capacity)
        {
            return Err(ConfigError::RecipeExceedsCapacity {
                name: recipe.name.clone(),
                required: recipe.required.len(),
                capacity: self.container_capacity,
            });
        }
        Ok(())
    }

    /// Seconds per tick.
    #[must_use]
    pub fn dt(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let rate = self.tick_rate as f32;
        1.0 / rate
    }

    /// Converts a duration to a whole number of ticks, rounding up.
    #[must_use]
    pub fn ticks_for(&self, secs: f32) -> u64 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let ticks = (secs * self.tick_rate as f32).ceil().max(0.0) as u64;
        ticks
    }

    /// Spawn slot for the `join_index`-th participant.
    ///
    /// Indices past the last slot reuse the last slot. With no slots
    /// configured every character spawns at the origin.
    #[must_use]
    pub fn spawn_slot(&self, join_index: usize) -> SpawnSlot {
        match self.spawn_slots.len() {
            0 => SpawnSlot::default(),
            n => self.spawn_slots[join_index.min(n - 1)],
        }
    }
}
