//! Simulation module with the fixed-timestep authority loop.
//!
//! The `Simulation` struct owns every piece of shared state and advances it
//! one tick at a time through a strictly ordered step:
//!
//! 0. **ROSTER**: Drain queued roster changes, re-evaluate the countdown trigger
//! 1. **INGEST**: Take exactly this tick's input snapshot per participant
//! 2. **KINEMATICS**: Integrate movement and facing (live rounds only)
//! 3. **ACTIONS**: Turn button edges into requests and resolve them
//! 4. **TIMERS**: Advance round timers, then ingredient spawners
//!
//! The step ends by publishing a [`StateSnapshot`] and advancing the tick.
//!
//! # Determinism
//!
//! The simulation guarantees deterministic execution:
//! - Entities and participants are iterated in id order (via `BTreeMap`)
//! - Every random choice draws from one `ChaCha8Rng` seeded at construction
//! - Requests are resolved one at a time in participant order
//!
//! # Example
//!
//! ```
//! use ptooey_core::config::SessionConfig;
//! use ptooey_core::entity::ParticipantId;
//! use ptooey_core::session::{RosterChange, RoundPhase};
//! use ptooey_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SessionConfig::default(), 42).unwrap();
//! for id in 1..=2 {
//!     sim.enqueue_roster_change(RosterChange::Joined {
//!         id: ParticipantId::new(id),
//!         name: format!("chef {id}"),
//!     });
//! }
//!
//! sim.step();
//! assert_eq!(sim.phase(), RoundPhase::CountingDown);
//!
//! // 3 s countdown at 60 ticks per second
//! for _ in 0..180 {
//!     sim.step();
//! }
//! assert_eq!(sim.phase(), RoundPhase::Live);
//! ```

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::arena::{Arena, ProximityQuery};
use crate::config::SessionConfig;
use crate::container::{ContainerMatcher, RecipeCatalog};
use crate::entity::{
    CharacterComponents, ContainerComponents, Entity, EntityInner, ParticipantId,
};
use crate::error::{ConfigError, InvariantViolation};
use crate::events::{Effects, LifecycleRequest, SimEvent};
use crate::input::{ButtonHistory, Buttons, InputAcceptance, InputBuffer, InputSnapshot};
use crate::possession::{PossessionRegistry, PossessionState};
use crate::resolver::{
    ActionKind, ActionRequest, AuthorityContext, InteractionResolver, MovementResolver,
};
use crate::session::{RosterChange, RoundPhase, Session};
use crate::snapshot::StateSnapshot;
use crate::spawner::IngredientSpawner;

/// Everything produced by one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Published state
    pub snapshot: StateSnapshot,
    /// What happened, in order
    pub events: Vec<SimEvent>,
    /// Networked objects to create or destroy
    pub lifecycle: Vec<LifecycleRequest>,
}

// =============================================================================
// Simulation
// =============================================================================

/// The authoritative simulation.
///
/// `Simulation` manages:
/// - The arena and the possession registry
/// - Round lifecycle, roster and scores
/// - Buffered input and per-participant button histories
/// - Ingredient spawners and the recipe matcher
/// - The seeded randomness source
///
/// Only code holding `&mut Simulation` can change shared state.
#[derive(Debug)]
pub struct Simulation {
    config: SessionConfig,
    arena: Arena,
    possession: PossessionRegistry,
    matcher: ContainerMatcher,
    movement: MovementResolver,
    interaction: InteractionResolver,
    session: Session,
    inputs: InputBuffer,
    histories: BTreeMap<ParticipantId, ButtonHistory>,
    spawners: Vec<IngredientSpawner>,
    roster_queue: VecDeque<RosterChange>,
    rng: ChaCha8Rng,
    seed: u64,
    effects: Effects,
    published: Option<StateSnapshot>,
}

impl Simulation {
    /// Creates a simulation at tick 0, waiting for players.
    ///
    /// # Errors
    ///
    /// Returns the first problem [`SessionConfig::validate`] finds.
    pub fn new(config: SessionConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            seed,
            tick_rate = config.tick_rate,
            min_players = config.min_players,
            recipes = config.recipes.len(),
            "simulation created"
        );

        Ok(Self {
            arena: Arena::new(),
            possession: PossessionRegistry::new(),
            matcher: ContainerMatcher::new(
                RecipeCatalog::new(config.recipes.clone()),
                config.points_per_item,
                config.completion_bonus,
            )
            .with_capacity(config.container_capacity),
            movement: MovementResolver::from_config(&config),
            interaction: InteractionResolver::new(config.reach_distance),
            session: Session::new(&config),
            inputs: InputBuffer::new(config.input_buffer_ticks),
            histories: BTreeMap::new(),
            spawners: config
                .spawners
                .iter()
                .map(IngredientSpawner::from_config)
                .collect(),
            roster_queue: VecDeque::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            effects: Effects::default(),
            published: None,
            config,
        })
    }

    // ===== Inbound =====

    /// Buffers `snapshot` from `participant` for `tick`.
    ///
    /// Snapshots for ticks already simulated are stale; the first snapshot
    /// for a tick wins.
    pub fn submit_input(
        &mut self,
        participant: ParticipantId,
        tick: u64,
        snapshot: InputSnapshot,
    ) -> InputAcceptance {
        let now = self.arena.current_tick();
        let acceptance = self.inputs.submit(participant, tick, now, snapshot);
        if acceptance != InputAcceptance::Accepted {
            trace!(%participant, tick, now, ?acceptance, "dropped input");
        }
        acceptance
    }

    /// Queues a roster change to apply at the start of the next step.
    pub fn enqueue_roster_change(&mut self, change: RosterChange) {
        self.roster_queue.push_back(change);
    }

    // ===== Step =====

    /// Runs one tick using the arena's own reach index for interaction targeting.
    pub fn step(&mut self) -> TickReport {
        self.step_inner(None)
    }

    /// Runs one tick using an external proximity provider.
    pub fn step_with(&mut self, proximity: &dyn ProximityQuery) -> TickReport {
        self.step_inner(Some(proximity))
    }

    fn step_inner(&mut self, proximity: Option<&dyn ProximityQuery>) -> TickReport {
        let now = self.arena.current_tick();

        // 0. Roster
        self.drain_roster_changes(now);
        if let Some(next) = self.session.roster_transition() {
            self.transition(next, now);
        }

        // 1-2. Ingest and kinematics
        let live = self.session.phase() == RoundPhase::Live;
        let mut snapshots = self.inputs.take_tick(now);
        let mut requests = Vec::new();
        let participants: Vec<ParticipantId> =
            self.session.roster().iter().map(|entry| entry.id).collect();

        for participant in participants {
            let Some(snapshot) = snapshots.remove(&participant) else {
                if live {
                    self.movement.idle(&mut self.arena, participant);
                }
                continue;
            };
            let edges = self
                .histories
                .entry(participant)
                .or_default()
                .advance(snapshot.buttons);
            if !live {
                continue;
            }

            self.movement
                .integrate(&mut self.arena, participant, &snapshot);
            if edges.contains(Buttons::JUMP) {
                self.bump_jump(participant);
            }
            if edges.contains(Buttons::STEAL) {
                requests.push(ActionRequest::new(participant, now, ActionKind::Steal));
            } else if edges.contains(Buttons::INTERACT) {
                requests.push(ActionRequest::new(participant, now, ActionKind::Interact));
            }
        }
        for participant in snapshots.keys() {
            trace!(%participant, tick = now, "input from participant not on roster");
        }

        // 3. Actions
        if live {
            let mut ctx = AuthorityContext {
                tick: now,
                arena: &mut self.arena,
                possession: &mut self.possession,
                ledger: self.session.ledger_mut(),
                matcher: &self.matcher,
                rng: &mut self.rng,
                effects: &mut self.effects,
            };
            for request in requests {
                self.interaction.handle(&mut ctx, request, proximity);
            }
        }

        // 4. Timers, then spawners
        if let Some(next) = self.session.timer_transition(now) {
            self.transition(next, now);
        }
        if self.session.phase() == RoundPhase::Live {
            let cooldown = self.config.ticks_for(self.config.spawner_cooldown_secs);
            let mut ctx = AuthorityContext {
                tick: now,
                arena: &mut self.arena,
                possession: &mut self.possession,
                ledger: self.session.ledger_mut(),
                matcher: &self.matcher,
                rng: &mut self.rng,
                effects: &mut self.effects,
            };
            for spawner in &mut self.spawners {
                spawner.advance(&mut ctx, cooldown);
            }
        }

        debug_assert!(
            self.check_invariants().is_ok(),
            "possession invariant broken at tick {now}"
        );

        // Publish
        let snapshot = StateSnapshot::capture(
            now,
            self.config.tick_rate,
            &self.arena,
            &self.possession,
            &self.session,
            &self.matcher,
        );
        self.published = Some(snapshot.clone());
        self.arena.advance_tick();

        let (events, lifecycle) = self.effects.drain();
        TickReport {
            snapshot,
            events,
            lifecycle,
        }
    }

    fn bump_jump(&mut self, participant: ParticipantId) {
        if let Some(character) = self
            .arena
            .character_of(participant)
            .and_then(|id| self.arena.get_mut(id))
            .and_then(Entity::as_character_mut)
        {
            character.counters.bump_jump();
        }
    }

    // ===== Roster =====

    fn drain_roster_changes(&mut self, now: u64) {
        let changes: Vec<RosterChange> = self.roster_queue.drain(..).collect();
        for change in changes {
            let participant = change.participant();
            let result = match change {
                RosterChange::Joined { id, name } => {
                    let color: [u8; 3] = self.rng.gen();
                    self.session
                        .roster_mut()
                        .join(id, &name, color)
                        .map(|join_index| {
                            info!(participant = %id, join_index, "participant joined");
                        })
                }
                RosterChange::Left { id } => match self.session.roster_mut().leave(id) {
                    Ok(_) => {
                        self.histories.remove(&id);
                        self.inputs.discard_participant(id);
                        self.remove_character(id, now);
                        info!(participant = %id, "participant left");
                        Ok(())
                    }
                    Err(err) => Err(err),
                },
                RosterChange::Renamed { id, name } => {
                    self.session.roster_mut().rename(id, &name)
                }
                RosterChange::Recolored { id, color } => {
                    self.session.roster_mut().recolor(id, color)
                }
            };
            if let Err(err) = result {
                warn!(%participant, %err, "rejected roster change");
            }
        }
    }

    /// Despawns a departing participant's character, dropping whatever it
    /// held where it stood.
    fn remove_character(&mut self, participant: ParticipantId, now: u64) {
        let Some(character) = self.arena.character_of(participant) else {
            return;
        };
        let mut ctx = AuthorityContext {
            tick: now,
            arena: &mut self.arena,
            possession: &mut self.possession,
            ledger: self.session.ledger_mut(),
            matcher: &self.matcher,
            rng: &mut self.rng,
            effects: &mut self.effects,
        };

        let held = ctx
            .arena
            .get(character)
            .and_then(Entity::as_character)
            .and_then(|components| components.held);
        if let Some(item) = held {
            let position = ctx.arena.position(character).unwrap_or(Vec2::ZERO);
            ctx.possession.release(item);
            ctx.arena.set_position(item, position);
            ctx.effects.emit(SimEvent::Dropped {
                participant,
                item,
                position,
            });
        }

        ctx.despawn(character);
        ctx.effects.emit(SimEvent::CharacterDespawned {
            participant,
            entity: character,
        });
    }

    // ===== Lifecycle =====

    fn transition(&mut self, next: RoundPhase, now: u64) {
        let from = self.session.enter(next, now);
        if next == RoundPhase::Live {
            self.start_round(now);
        }
        info!(tick = now, %from, to = %next, "round phase changed");
        self.effects.emit(SimEvent::PhaseChanged { from, to: next });
    }

    /// Spawns characters, the pot, and arms spawners.
    fn start_round(&mut self, now: u64) {
        let participants: Vec<ParticipantId> =
            self.session.roster().iter().map(|entry| entry.id).collect();
        let mut ctx = AuthorityContext {
            tick: now,
            arena: &mut self.arena,
            possession: &mut self.possession,
            ledger: self.session.ledger_mut(),
            matcher: &self.matcher,
            rng: &mut self.rng,
            effects: &mut self.effects,
        };

        for (join_index, participant) in participants.into_iter().enumerate() {
            let slot = self.config.spawn_slot(join_index);
            let entity = ctx.spawn(
                slot.position,
                EntityInner::Character(CharacterComponents::new(participant, slot.facing)),
            );
            ctx.effects.emit(SimEvent::CharacterSpawned {
                participant,
                entity,
            });
        }

        let pot = ctx.spawn(
            self.config.container_position,
            EntityInner::Container(ContainerComponents::default()),
        );
        if let Some(container) = ctx.arena.get_mut(pot).and_then(Entity::as_container_mut) {
            ctx.matcher.arm(container, &mut *ctx.rng);
            debug!(recipe = ?container.active_recipe, "pot armed");
        }

        for spawner in &mut self.spawners {
            spawner.disarm();
        }
    }

    /// Tears down an ended round and waits for players again.
    ///
    /// If the roster already meets the minimum, the next countdown starts
    /// immediately. Returns false (and does nothing) unless the round has
    /// ended.
    pub fn reset_round(&mut self) -> bool {
        if self.session.phase() != RoundPhase::Ended {
            return false;
        }
        let now = self.arena.current_tick();
        let entities: Vec<_> = self.arena.entity_ids_sorted().collect();
        let mut ctx = AuthorityContext {
            tick: now,
            arena: &mut self.arena,
            possession: &mut self.possession,
            ledger: self.session.ledger_mut(),
            matcher: &self.matcher,
            rng: &mut self.rng,
            effects: &mut self.effects,
        };
        for id in entities {
            ctx.despawn(id);
        }
        self.possession.clear();
        for spawner in &mut self.spawners {
            spawner.disarm();
        }

        self.session.reset();
        info!(tick = now, "round reset");
        self.effects.emit(SimEvent::PhaseChanged {
            from: RoundPhase::Ended,
            to: RoundPhase::WaitingForPlayers,
        });
        if let Some(next) = self.session.roster_transition() {
            self.transition(next, now);
        }
        true
    }

    // ===== Invariants =====

    /// Checks that the possession registry and every character's held
    /// reference agree.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (item, state) in self.possession.iter() {
            if !self.arena.get(item).is_some_and(Entity::is_holdable) {
                return Err(InvariantViolation::Unregistered(item));
            }
            if let PossessionState::HeldBy(holder) = state {
                let references = self
                    .arena
                    .character_of(holder)
                    .and_then(|id| self.arena.get(id))
                    .and_then(Entity::as_character)
                    .is_some_and(|character| character.held == Some(item));
                if !references {
                    return Err(InvariantViolation::HolderMismatch { item, holder });
                }
            }
        }

        for entity in self.arena.entities_sorted() {
            if entity.is_holdable() && self.possession.query(entity.id()).is_none() {
                return Err(InvariantViolation::Unregistered(entity.id()));
            }
            if let Some(character) = entity.as_character() {
                if let Some(item) = character.held {
                    if self.possession.holder(item) != Some(character.owner) {
                        return Err(InvariantViolation::DanglingHeldReference {
                            character: entity.id(),
                            item,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    // ===== Accessors =====

    /// Returns the next tick to be simulated.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.arena.current_tick()
    }

    /// Returns the seed the randomness source was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the current round phase.
    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.session.phase()
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the arena.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable arena, for arranging test scenes.
    #[cfg(test)]
    pub(crate) fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Returns the possession registry.
    #[must_use]
    pub const fn possession(&self) -> &PossessionRegistry {
        &self.possession
    }

    /// Returns the session lifecycle state.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the ingredient spawners.
    #[must_use]
    pub fn spawners(&self) -> &[IngredientSpawner] {
        &self.spawners
    }

    /// Returns the last published snapshot.
    #[must_use]
    pub fn published(&self) -> Option<&StateSnapshot> {
        self.published.as_ref()
    }
}
