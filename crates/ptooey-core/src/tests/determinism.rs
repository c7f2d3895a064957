//! Determinism tests.
//!
//! Two simulations built from the same config and seed, fed the same input
//! script, must publish byte-identical state every tick.

use glam::Vec2;

use super::helpers::*;
use crate::config::SessionConfig;
use crate::entity::ParticipantId;
use crate::events::SimEvent;
use crate::input::{Buttons, InputSnapshot};
use crate::simulation::TickReport;

/// Scripted input for `participant` at `tick`.
///
/// Walks in a small square and cycles through the buttons.
fn scripted_input(participant: ParticipantId, tick: u64) -> InputSnapshot {
    let phase = (tick / 20 + u64::from(participant.as_u32())) % 4;
    let movement = match phase {
        0 => Vec2::X,
        1 => Vec2::Y,
        2 => Vec2::NEG_X,
        _ => Vec2::NEG_Y,
    };
    let buttons = match (tick + u64::from(participant.as_u32())) % 7 {
        0 => Buttons::INTERACT,
        3 => Buttons::STEAL,
        5 => Buttons::JUMP | Buttons::SPRINT,
        _ => Buttons::empty(),
    };
    InputSnapshot {
        movement: movement * 0.5,
        look_delta_x: 3.0,
        look_delta_y: 0.0,
        buttons,
    }
}

fn run_script(config: SessionConfig, seed: u64, ticks: u64) -> Vec<TickReport> {
    let participants = [ALICE, BOB, CAROL];
    let mut sim = session_with(config, seed, &participants);
    (0..ticks)
        .map(|_| {
            let tick = sim.tick();
            for participant in participants {
                sim.submit_input(participant, tick, scripted_input(participant, tick));
            }
            sim.step()
        })
        .collect()
}

fn clustered_config() -> SessionConfig {
    SessionConfig {
        recipes: SessionConfig::default().recipes,
        ..kitchen_config()
    }
}

#[test]
fn same_seed_same_reports() {
    let a = run_script(clustered_config(), 42, 400);
    let b = run_script(clustered_config(), 42, 400);
    assert_eq!(a, b);
}

#[test]
fn same_seed_same_serialized_snapshots() {
    let a = run_script(clustered_config(), 7, 200);
    let b = run_script(clustered_config(), 7, 200);

    for (left, right) in a.iter().zip(&b) {
        let left = serde_json::to_string(&left.snapshot).unwrap();
        let right = serde_json::to_string(&right.snapshot).unwrap();
        assert_eq!(left, right);
    }
}

#[test]
fn script_exercises_interactions() {
    let reports = run_script(clustered_config(), 42, 400);
    let pickups = reports
        .iter()
        .flat_map(|report| &report.events)
        .filter(|event| matches!(event, SimEvent::PickedUp { .. }))
        .count();
    assert!(pickups > 0, "script should pick something up");
}

#[test]
fn different_seeds_draw_different_colors() {
    let a = run_script(clustered_config(), 1, 1);
    let b = run_script(clustered_config(), 2, 1);

    let colors = |report: &TickReport| -> Vec<[u8; 3]> {
        report
            .snapshot
            .participants
            .iter()
            .map(|participant| participant.color)
            .collect()
    };
    assert_ne!(colors(&a[0]), colors(&b[0]));
}

#[test]
fn replayed_simulation_matches_published_state() {
    let mut sim = session_with(clustered_config(), 99, &[ALICE, BOB]);
    let reports = run_script(clustered_config(), 99, 1);
    sim.submit_input(ALICE, 0, scripted_input(ALICE, 0));
    sim.submit_input(BOB, 0, scripted_input(BOB, 0));
    sim.step();

    // CAROL joined in the script, so only the shared prefix of the roster
    // is comparable.
    let published = sim.published().unwrap();
    assert_eq!(published.tick, reports[0].snapshot.tick);
    assert_eq!(
        published.participants[..2],
        reports[0].snapshot.participants[..2]
    );
}
