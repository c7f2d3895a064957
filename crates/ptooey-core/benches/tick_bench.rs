use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec2;
use ptooey_core::{
    Buttons, InputSnapshot, ParticipantId, RosterChange, RoundPhase, SessionConfig, Simulation,
};

/// Four chefs in a round long enough that it never ends mid-benchmark.
fn live_simulation() -> Simulation {
    let config = SessionConfig {
        round_secs: 100_000.0,
        ..SessionConfig::default()
    };
    let mut sim = Simulation::new(config, 42).expect("default config is valid");
    for id in 1..=4 {
        sim.enqueue_roster_change(RosterChange::Joined {
            id: ParticipantId::new(id),
            name: format!("chef {id}"),
        });
    }
    while sim.phase() != RoundPhase::Live {
        sim.step();
    }
    sim
}

fn bench_idle_step(c: &mut Criterion) {
    let mut sim = live_simulation();

    c.bench_function("idle_step", |b| b.iter(|| black_box(sim.step())));
}

fn bench_step_with_input(c: &mut Criterion) {
    let mut sim = live_simulation();

    c.bench_function("step_with_input", |b| {
        b.iter(|| {
            let tick = sim.tick();
            for id in 1..=4u32 {
                // Alternate interact presses so edges keep firing
                let buttons = if (tick + u64::from(id)) % 2 == 0 {
                    Buttons::INTERACT
                } else {
                    Buttons::SPRINT
                };
                let angle = (tick as f32 * 0.05) + id as f32;
                sim.submit_input(
                    ParticipantId::new(id),
                    tick,
                    InputSnapshot {
                        movement: Vec2::from_angle(angle),
                        look_delta_x: 1.0,
                        look_delta_y: 0.0,
                        buttons,
                    },
                );
            }
            black_box(sim.step())
        })
    });
}

fn bench_snapshot_json(c: &mut Criterion) {
    let mut sim = live_simulation();
    let snapshot = sim.step().snapshot;

    c.bench_function("snapshot_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&snapshot)))
    });
}

criterion_group!(
    benches,
    bench_idle_step,
    bench_step_with_input,
    bench_snapshot_json,
);
criterion_main!(benches);
