//! # Ptooey Core
//!
//! Authoritative simulation core for Ptooey, a cooperative cooking game.
//!
//! Participants move around a shared kitchen, pick up, drop and steal
//! ingredients, and deposit them into a shared pot that scores them against
//! recipes. This crate owns all of that shared state and guarantees that
//! every change is committed exactly once, by a single authority, in a fixed
//! order each tick.
//!
//! ## Architecture
//!
//! - **Entities**: Ingredients, the pot, participant characters
//! - **Possession registry**: The single source of truth for who holds what
//! - **Resolvers**: Movement and interaction (pickup, steal, deposit, drop)
//! - **Container matcher**: Recipe matching and scoring
//! - **Session**: Roster, countdown, round timer, score ledger
//! - **Simulation**: The fixed-timestep loop that drives everything
//!
//! Rendering, animation, cameras and the network transport are external;
//! they feed [`input::InputSnapshot`]s and [`session::RosterChange`]s in and
//! read [`snapshot::StateSnapshot`]s out.
//!
//! ## Usage
//!
//! ```
//! use ptooey_core::{ParticipantId, RosterChange, SessionConfig, Simulation};
//!
//! let mut sim = Simulation::new(SessionConfig::default(), 42)?;
//! sim.enqueue_roster_change(RosterChange::Joined {
//!     id: ParticipantId::new(1),
//!     name: "Ada".into(),
//! });
//! let report = sim.step();
//! assert_eq!(report.snapshot.participants.len(), 1);
//! # Ok::<(), ptooey_core::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod config;
pub mod container;
pub mod entity;
pub mod error;
pub mod events;
pub mod input;
pub mod possession;
pub mod resolver;
pub mod session;
pub mod simulation;
pub mod snapshot;
pub mod spawner;

pub use config::SessionConfig;
pub use entity::{EntityId, ItemKind, ParticipantId};
pub use error::{ConfigError, InvariantViolation, SessionError};
pub use input::{Buttons, InputSnapshot};
pub use session::{RosterChange, RoundPhase};
pub use simulation::{Simulation, TickReport};
pub use snapshot::{ReplicaView, StateSnapshot};

#[cfg(test)]
mod tests;
