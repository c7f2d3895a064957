//! Round and session lifecycle.
//!
//! A session moves through four phases:
//!
//! ```text
//! WaitingForPlayers ──(roster ≥ min)──▶ CountingDown ──(countdown expiry)──▶ Live
//!         ▲                                  │                                │
//!         └──────(underflow, Abort)──────────┘                   (round expiry or
//!         ▲                                                       underflow, Abort)
//!         │                                                                   ▼
//!         └──────────────────────── reset_round ────────────────────────── Ended
//! ```
//!
//! Timers count whole ticks on the shared tick clock. The session only
//! decides *when* a phase changes; spawning characters and the pot at round
//! start is driven by the [`Simulation`](crate::simulation::Simulation).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{SessionConfig, UnderflowPolicy};
use crate::entity::ParticipantId;
use crate::error::SessionError;

/// Longest display name kept, in bytes.
pub const MAX_NAME_BYTES: usize = 32;

// =============================================================================
// Phases and Timers
// =============================================================================

/// Lifecycle phase of the round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Not enough participants to start.
    #[default]
    WaitingForPlayers,
    /// Pre-round countdown running.
    CountingDown,
    /// Round in progress; actions resolve.
    Live,
    /// Round over; scores frozen.
    Ended,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WaitingForPlayers => "WaitingForPlayers",
            Self::CountingDown => "CountingDown",
            Self::Live => "Live",
            Self::Ended => "Ended",
        };
        f.write_str(name)
    }
}

/// A timer that expires at a fixed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickTimer {
    expires_at: u64,
}

impl TickTimer {
    /// Starts a timer at `now` that expires `ticks` later.
    #[must_use]
    pub const fn after(now: u64, ticks: u64) -> Self {
        Self {
            expires_at: now.saturating_add(ticks),
        }
    }

    /// Returns the tick at which the timer expires.
    #[must_use]
    pub const fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Returns true once `now` has reached the expiry tick.
    #[must_use]
    pub const fn expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Ticks left before expiry, zero once expired.
    #[must_use]
    pub const fn remaining_ticks(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }
}

/// The pre-round countdown and the round timer. At most one runs at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundClock {
    countdown: Option<TickTimer>,
    round: Option<TickTimer>,
}

impl RoundClock {
    /// Arms the countdown, stopping the round timer.
    pub fn start_countdown(&mut self, now: u64, ticks: u64) {
        self.countdown = Some(TickTimer::after(now, ticks));
        self.round = None;
    }

    /// Arms the round timer, stopping the countdown.
    pub fn start_round(&mut self, now: u64, ticks: u64) {
        self.round = Some(TickTimer::after(now, ticks));
        self.countdown = None;
    }

    /// Stops both timers.
    pub fn clear(&mut self) {
        self.countdown = None;
        self.round = None;
    }

    /// The running countdown, if any.
    #[must_use]
    pub const fn countdown(&self) -> Option<TickTimer> {
        self.countdown
    }

    /// The running round timer, if any.
    #[must_use]
    pub const fn round(&self) -> Option<TickTimer> {
        self.round
    }

    /// Ticks left on whichever timer is running.
    #[must_use]
    pub fn remaining_ticks(&self, now: u64) -> Option<u64> {
        self.countdown
            .or(self.round)
            .map(|timer| timer.remaining_ticks(now))
    }
}

// =============================================================================
// Score Ledger
// =============================================================================

/// Participant scores for the current round.
///
/// Only participants present at round start have an entry; awards to anyone
/// else are dropped. A participant who leaves mid-round keeps a frozen entry
/// until the next reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLedger {
    scores: BTreeMap<ParticipantId, u32>,
}

impl ScoreLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every entry with a zero score for each of `participants`.
    pub fn reset(&mut self, participants: impl IntoIterator<Item = ParticipantId>) {
        self.scores = participants.into_iter().map(|p| (p, 0)).collect();
    }

    /// Adds `points` to `participant`. Returns false if they have no entry.
    pub fn award(&mut self, participant: ParticipantId, points: u32) -> bool {
        match self.scores.get_mut(&participant) {
            Some(score) => {
                *score = score.saturating_add(points);
                true
            }
            None => false,
        }
    }

    /// Returns the score of `participant`.
    #[must_use]
    pub fn score(&self, participant: ParticipantId) -> Option<u32> {
        self.scores.get(&participant).copied()
    }

    /// Iterates `(participant, score)` in participant order.
    pub fn iter(&self) -> impl Iterator<Item = (ParticipantId, u32)> + '_ {
        self.scores.iter().map(|(p, s)| (*p, *s))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.scores.clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns true if the ledger has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

// =============================================================================
// Roster
// =============================================================================

/// A roster change delivered by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterChange {
    /// A participant connected.
    Joined {
        /// Participant id
        id: ParticipantId,
        /// Requested display name
        name: String,
    },
    /// A participant disconnected.
    Left {
        /// Participant id
        id: ParticipantId,
    },
    /// A participant changed their display name.
    Renamed {
        /// Participant id
        id: ParticipantId,
        /// New display name
        name: String,
    },
    /// A participant changed their color.
    Recolored {
        /// Participant id
        id: ParticipantId,
        /// New RGB color
        color: [u8; 3],
    },
}

impl RosterChange {
    /// The participant the change is about.
    #[must_use]
    pub const fn participant(&self) -> ParticipantId {
        match self {
            Self::Joined { id, .. }
            | Self::Left { id }
            | Self::Renamed { id, .. }
            | Self::Recolored { id, .. } => *id,
        }
    }
}

/// One connected participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Participant id
    pub id: ParticipantId,
    /// Display name, at most [`MAX_NAME_BYTES`] bytes
    pub name: String,
    /// RGB color
    pub color: [u8; 3],
}

/// Connected participants in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    capacity: usize,
}

impl Roster {
    /// Creates an empty roster that holds at most `capacity` participants.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Adds a participant at the end of the join order.
    ///
    /// # Errors
    ///
    /// [`SessionError::DuplicateParticipant`] if already present,
    /// [`SessionError::RosterFull`] at capacity.
    pub fn join(
        &mut self,
        id: ParticipantId,
        name: &str,
        color: [u8; 3],
    ) -> Result<usize, SessionError> {
        if self.contains(id) {
            return Err(SessionError::DuplicateParticipant(id));
        }
        if self.entries.len() >= self.capacity {
            return Err(SessionError::RosterFull(self.capacity));
        }
        self.entries.push(RosterEntry {
            id,
            name: truncate_name(name),
            color,
        });
        Ok(self.entries.len() - 1)
    }

    /// Removes a participant, returning their entry.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownParticipant`] if not present.
    pub fn leave(&mut self, id: ParticipantId) -> Result<RosterEntry, SessionError> {
        let index = self
            .join_index(id)
            .ok_or(SessionError::UnknownParticipant(id))?;
        Ok(self.entries.remove(index))
    }

    /// Replaces a participant's name, truncated to [`MAX_NAME_BYTES`].
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownParticipant`] if not present.
    pub fn rename(&mut self, id: ParticipantId, name: &str) -> Result<(), SessionError> {
        self.entry_mut(id)?.name = truncate_name(name);
        Ok(())
    }

    /// Replaces a participant's color.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownParticipant`] if not present.
    pub fn recolor(&mut self, id: ParticipantId, color: [u8; 3]) -> Result<(), SessionError> {
        self.entry_mut(id)?.color = color;
        Ok(())
    }

    fn entry_mut(&mut self, id: ParticipantId) -> Result<&mut RosterEntry, SessionError> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(SessionError::UnknownParticipant(id))
    }

    /// Returns a participant's entry.
    #[must_use]
    pub fn get(&self, id: ParticipantId) -> Option<&RosterEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Returns the participant's position in join order.
    #[must_use]
    pub fn join_index(&self, id: ParticipantId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Returns true if the participant is on the roster.
    #[must_use]
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.get(id).is_some()
    }

    /// Iterates entries in join order.
    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> + '_ {
        self.entries.iter()
    }

    /// Returns the number of participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nobody is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn truncate_name(name: &str) -> String {
    if name.len() <= MAX_NAME_BYTES {
        return name.to_owned();
    }
    let mut end = MAX_NAME_BYTES;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}

// =============================================================================
// Session
// =============================================================================

/// Lifecycle state of one session: phase, timers, roster, and scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    phase: RoundPhase,
    clock: RoundClock,
    roster: Roster,
    ledger: ScoreLedger,
    min_players: usize,
    countdown_ticks: u64,
    round_ticks: u64,
    countdown_underflow: UnderflowPolicy,
    live_underflow: UnderflowPolicy,
}

impl Session {
    /// Creates a session waiting for players.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            phase: RoundPhase::WaitingForPlayers,
            clock: RoundClock::default(),
            roster: Roster::new(config.max_players),
            ledger: ScoreLedger::new(),
            min_players: config.min_players,
            countdown_ticks: config.ticks_for(config.countdown_secs),
            round_ticks: config.ticks_for(config.round_secs),
            countdown_underflow: config.countdown_underflow,
            live_underflow: config.live_underflow,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Countdown and round timers.
    #[must_use]
    pub const fn clock(&self) -> &RoundClock {
        &self.clock
    }

    /// Connected participants.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Mutable roster, for applying roster changes.
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// Round scores.
    #[must_use]
    pub const fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    /// Mutable round scores.
    pub fn ledger_mut(&mut self) -> &mut ScoreLedger {
        &mut self.ledger
    }

    /// Phase change caused by the current roster size, if any.
    ///
    /// Covers the countdown trigger and the underflow policies.
    #[must_use]
    pub fn roster_transition(&self) -> Option<RoundPhase> {
        let underflow = self.roster.len() < self.min_players;
        match self.phase {
            RoundPhase::WaitingForPlayers if !underflow => Some(RoundPhase::CountingDown),
            RoundPhase::CountingDown
                if underflow && self.countdown_underflow == UnderflowPolicy::Abort =>
            {
                Some(RoundPhase::WaitingForPlayers)
            }
            RoundPhase::Live if underflow && self.live_underflow == UnderflowPolicy::Abort => {
                Some(RoundPhase::Ended)
            }
            _ => None,
        }
    }

    /// Phase change caused by a timer expiring at `now`, if any.
    #[must_use]
    pub fn timer_transition(&self, now: u64) -> Option<RoundPhase> {
        match self.phase {
            RoundPhase::CountingDown
                if self.clock.countdown().is_some_and(|t| t.expired(now)) =>
            {
                Some(RoundPhase::Live)
            }
            RoundPhase::Live if self.clock.round().is_some_and(|t| t.expired(now)) => {
                Some(RoundPhase::Ended)
            }
            _ => None,
        }
    }

    /// Enters `phase` at tick `now`, arming or stopping timers. Entering
    /// `Live` zeroes the score of everyone on the roster.
    ///
    /// Returns the phase that was left.
    pub fn enter(&mut self, phase: RoundPhase, now: u64) -> RoundPhase {
        match phase {
            RoundPhase::CountingDown => self.clock.start_countdown(now, self.countdown_ticks),
            RoundPhase::Live => {
                self.clock.start_round(now, self.round_ticks);
                self.ledger.reset(self.roster.iter().map(|entry| entry.id));
            }
            RoundPhase::WaitingForPlayers | RoundPhase::Ended => self.clock.clear(),
        }
        std::mem::replace(&mut self.phase, phase)
    }

    /// Returns to `WaitingForPlayers` with an empty ledger.
    pub fn reset(&mut self) {
        self.ledger.clear();
        self.clock.clear();
        self.phase = RoundPhase::WaitingForPlayers;
    }

    /// Ticks left on the running timer.
    #[must_use]
    pub fn remaining_ticks(&self, now: u64) -> Option<u64> {
        self.clock.remaining_ticks(now)
    }
}
