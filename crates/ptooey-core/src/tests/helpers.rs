//! Test helper functions for setting up sessions and driving input.
//!
//! This module provides factory functions and setup utilities that make
//! writing scenario tests more ergonomic and consistent.

use glam::Vec2;

use crate::config::{SessionConfig, SpawnSlot, SpawnerConfig};
use crate::container::Recipe;
use crate::entity::{EntityId, ItemKind, ParticipantId};
use crate::input::{Buttons, InputSnapshot};
use crate::session::{RosterChange, RoundPhase};
use crate::simulation::{Simulation, TickReport};

/// First participant; spawns at slot 0.
pub const ALICE: ParticipantId = ParticipantId::new(1);
/// Second participant; spawns at slot 1.
pub const BOB: ParticipantId = ParticipantId::new(2);
/// Third participant.
pub const CAROL: ParticipantId = ParticipantId::new(3);

/// Where ALICE spawns in [`kitchen_config`].
pub const ALICE_SLOT: Vec2 = Vec2::new(-4.0, -4.0);
/// Where BOB spawns in [`kitchen_config`].
pub const BOB_SLOT: Vec2 = Vec2::new(4.0, -4.0);

// =============================================================================
// Logging
// =============================================================================

/// Installs a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// =============================================================================
// Session Setup
// =============================================================================

/// A small kitchen laid out around ALICE's spawn slot.
///
/// - Tomato spawner 1.0 above ALICE, onion spawner 1.5 to her left
/// - The pot 1.5 below ALICE
/// - One recipe: "Salad" = Tomato + Onion, worth 10
/// - Short countdown (0.5 s) and round (10 s)
pub fn kitchen_config() -> SessionConfig {
    SessionConfig {
        countdown_secs: 0.5,
        round_secs: 10.0,
        recipes: vec![Recipe::new(
            "Salad",
            vec![ItemKind::Tomato, ItemKind::Onion],
            10,
        )],
        spawn_slots: vec![SpawnSlot::new(ALICE_SLOT, 0.0), SpawnSlot::new(BOB_SLOT, 0.0)],
        container_position: ALICE_SLOT + Vec2::new(0.0, -1.5),
        spawners: vec![
            SpawnerConfig {
                kind: ItemKind::Tomato,
                position: ALICE_SLOT + Vec2::new(0.0, 1.0),
            },
            SpawnerConfig {
                kind: ItemKind::Onion,
                position: ALICE_SLOT + Vec2::new(-1.5, 0.0),
            },
        ],
        ..SessionConfig::default()
    }
}

/// Builds a simulation and queues joins for `participants` in order.
pub fn session_with(config: SessionConfig, seed: u64, participants: &[ParticipantId]) -> Simulation {
    init_tracing();
    let mut sim = Simulation::new(config, seed).expect("valid test config");
    for id in participants {
        sim.enqueue_roster_change(RosterChange::Joined {
            id: *id,
            name: format!("chef {id}"),
        });
    }
    sim
}

/// Steps until the round is live and returns the report of the tick that
/// started it.
pub fn run_until_live(sim: &mut Simulation) -> TickReport {
    run_until(sim, RoundPhase::Live)
}

/// Steps until `phase` is reached and returns the report of that tick.
///
/// Panics if the phase is not reached within 100 000 ticks.
pub fn run_until(sim: &mut Simulation, phase: RoundPhase) -> TickReport {
    for _ in 0..100_000 {
        let report = sim.step();
        if report.snapshot.round.phase == phase {
            return report;
        }
    }
    panic!("{phase} not reached");
}

/// A two-player kitchen that is already live.
pub fn live_kitchen(seed: u64) -> Simulation {
    let mut sim = session_with(kitchen_config(), seed, &[ALICE, BOB]);
    run_until_live(&mut sim);
    sim
}

// =============================================================================
// Input
// =============================================================================

/// Submits one snapshot per `(participant, snapshot)` pair for the next
/// tick and steps once.
pub fn step_inputs(sim: &mut Simulation, inputs: &[(ParticipantId, InputSnapshot)]) -> TickReport {
    let tick = sim.tick();
    for (participant, snapshot) in inputs {
        sim.submit_input(*participant, tick, *snapshot);
    }
    sim.step()
}

/// Presses `buttons` for one tick, then releases them for one tick.
///
/// Returns the report of the press tick.
pub fn tap(sim: &mut Simulation, participant: ParticipantId, buttons: Buttons) -> TickReport {
    let pressed = step_inputs(sim, &[(participant, InputSnapshot::pressing(buttons))]);
    step_inputs(sim, &[(participant, InputSnapshot::default())]);
    pressed
}

// =============================================================================
// Inspection
// =============================================================================

/// Returns the character entity of `participant`.
pub fn character(sim: &Simulation, participant: ParticipantId) -> EntityId {
    sim.arena()
        .character_of(participant)
        .expect("participant has a character")
}

/// Returns what `participant`'s character holds.
pub fn held(sim: &Simulation, participant: ParticipantId) -> Option<EntityId> {
    sim.arena()
        .get(character(sim, participant))
        .and_then(|entity| entity.as_character())
        .and_then(|components| components.held)
}

/// Returns the free ingredient of `kind`, if one exists.
pub fn free_item(sim: &Simulation, kind: ItemKind) -> Option<EntityId> {
    sim.arena()
        .entities_sorted()
        .filter(|entity| entity.as_holdable().is_some_and(|h| h.kind == kind))
        .map(|entity| entity.id())
        .find(|id| sim.possession().is_free(*id))
}

/// Moves `participant`'s character without going through input.
pub fn teleport(sim: &mut Simulation, participant: ParticipantId, position: Vec2) {
    let id = character(sim, participant);
    sim.arena_mut().set_position(id, position);
}

/// Returns `participant`'s current score.
pub fn score(sim: &Simulation, participant: ParticipantId) -> Option<u32> {
    sim.session().ledger().score(participant)
}
