//! Input snapshots, the per-tick input buffer, and edge detection.
//!
//! Every participant sends one [`InputSnapshot`] per tick. The authority
//! buffers them by tick in an [`InputBuffer`], takes exactly the current
//! tick's snapshots during its step, and derives discrete action requests
//! from a two-slot [`ButtonHistory`] per participant.
//!
//! # Edge Detection
//!
//! A button is *just pressed* iff it is set in the current snapshot and was
//! clear in the previous one. Reading the level instead would fire an action
//! on every tick the button stays down. The history only advances when a
//! snapshot actually arrives, so a button held across a missing tick is not
//! seen as a fresh press.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::ParticipantId;

bitflags! {
    /// Discrete action buttons carried by an input snapshot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Buttons: u8 {
        /// Jump (cosmetic only)
        const JUMP = 0b0000_0001;
        /// Pick up, drop, or deposit
        const INTERACT = 0b0000_0010;
        /// Steal from another participant
        const STEAL = 0b0000_0100;
        /// Move faster while held
        const SPRINT = 0b0000_1000;
    }
}

/// One participant's intent for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Movement vector, each component in `[-1, 1]`.
    pub movement: Vec2,
    /// Horizontal look delta (yaw input).
    pub look_delta_x: f32,
    /// Vertical look delta; forwarded to the camera layer, not simulated.
    pub look_delta_y: f32,
    /// Buttons held this tick.
    pub buttons: Buttons,
}

impl InputSnapshot {
    /// Creates a snapshot with only movement set.
    #[must_use]
    pub fn moving(movement: Vec2) -> Self {
        Self {
            movement,
            ..Self::default()
        }
    }

    /// Creates a snapshot with only buttons set.
    #[must_use]
    pub fn pressing(buttons: Buttons) -> Self {
        Self {
            buttons,
            ..Self::default()
        }
    }

    /// Returns a copy with non-finite values zeroed and movement clamped to
    /// `[-1, 1]²`.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let finite_or_zero = |v: f32| if v.is_finite() { v } else { 0.0 };
        Self {
            movement: Vec2::new(
                finite_or_zero(self.movement.x).clamp(-1.0, 1.0),
                finite_or_zero(self.movement.y).clamp(-1.0, 1.0),
            ),
            look_delta_x: finite_or_zero(self.look_delta_x),
            look_delta_y: finite_or_zero(self.look_delta_y),
            buttons: self.buttons,
        }
    }
}

// =============================================================================
// Edge Detection
// =============================================================================

/// Two-slot (previous, current) button history for one participant.
///
/// # Example
///
/// ```
/// use ptooey_core::input::{ButtonHistory, Buttons};
///
/// let mut history = ButtonHistory::default();
/// assert_eq!(history.advance(Buttons::INTERACT), Buttons::INTERACT);
/// // Still held: no new edge
/// assert_eq!(history.advance(Buttons::INTERACT), Buttons::empty());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonHistory {
    previous: Buttons,
    current: Buttons,
}

impl ButtonHistory {
    /// Shifts `current` into `previous`, records `buttons`, and returns the
    /// buttons that were just pressed.
    pub fn advance(&mut self, buttons: Buttons) -> Buttons {
        self.previous = self.current;
        self.current = buttons;
        self.just_pressed()
    }

    /// Buttons set now and clear in the previous snapshot.
    #[must_use]
    pub fn just_pressed(&self) -> Buttons {
        self.current.difference(self.previous)
    }

    /// Buttons held in the latest snapshot.
    #[must_use]
    pub const fn held(&self) -> Buttons {
        self.current
    }
}

// =============================================================================
// Input Buffer
// =============================================================================

/// Result of submitting a snapshot to the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputAcceptance {
    /// Buffered for its tick.
    Accepted,
    /// The tick has already been simulated; dropped.
    Stale,
    /// A snapshot for this participant and tick was already buffered; dropped.
    Duplicate,
    /// The tick is beyond the buffering horizon; dropped.
    TooFarAhead,
}

/// Snapshots waiting for their tick, keyed by `(tick, participant)`.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    pending: BTreeMap<(u64, ParticipantId), InputSnapshot>,
    horizon: u64,
}

impl InputBuffer {
    /// Creates a buffer that accepts snapshots at most `horizon` ticks ahead.
    #[must_use]
    pub fn new(horizon: u64) -> Self {
        Self {
            pending: BTreeMap::new(),
            horizon,
        }
    }

    /// Buffers `snapshot` for `(tick, participant)`.
    ///
    /// `current_tick` is the next tick the authority will simulate. The
    /// first snapshot for a given tick wins; later copies are duplicates.
    pub fn submit(
        &mut self,
        participant: ParticipantId,
        tick: u64,
        current_tick: u64,
        snapshot: InputSnapshot,
    ) -> InputAcceptance {
        if tick < current_tick {
            return InputAcceptance::Stale;
        }
        if tick - current_tick > self.horizon {
            return InputAcceptance::TooFarAhead;
        }
        match self.pending.entry((tick, participant)) {
            Entry::Occupied(_) => InputAcceptance::Duplicate,
            Entry::Vacant(slot) => {
                slot.insert(snapshot.sanitized());
                InputAcceptance::Accepted
            }
        }
    }

    /// Removes and returns every snapshot buffered for `tick`.
    ///
    /// Anything buffered for earlier ticks is discarded.
    pub fn take_tick(&mut self, tick: u64) -> BTreeMap<ParticipantId, InputSnapshot> {
        let later = self.pending.split_off(&(tick + 1, ParticipantId::new(0)));
        let upto = std::mem::replace(&mut self.pending, later);
        upto
            .into_iter()
            .filter(|((t, _), _)| *t == tick)
            .map(|((_, participant), snapshot)| (participant, snapshot))
            .collect()
    }

    /// Drops every snapshot from `participant`.
    pub fn discard_participant(&mut self, participant: ParticipantId) {
        self.pending.retain(|(_, p), _| *p != participant);
    }

    /// Returns the number of buffered snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: ParticipantId = ParticipantId::new(1);
    const BOB: ParticipantId = ParticipantId::new(2);

    mod snapshot_tests {
        use super::*;

        #[test]
        fn sanitized_clamps_and_zeroes_non_finite() {
            let snapshot = InputSnapshot {
                movement: Vec2::new(3.0, f32::NAN),
                look_delta_x: f32::INFINITY,
                look_delta_y: -0.5,
                buttons: Buttons::JUMP,
            }
            .sanitized();

            assert_eq!(snapshot.movement, Vec2::new(1.0, 0.0));
            assert_eq!(snapshot.look_delta_x, 0.0);
            assert_eq!(snapshot.look_delta_y, -0.5);
            assert_eq!(snapshot.buttons, Buttons::JUMP);
        }

        #[test]
        fn buttons_serialize_roundtrip() {
            let snapshot = InputSnapshot::pressing(Buttons::INTERACT | Buttons::SPRINT);
            let json = serde_json::to_string(&snapshot).unwrap();
            let back: InputSnapshot = serde_json::from_str(&json).unwrap();
            assert_eq!(back, snapshot);
        }
    }

    mod history_tests {
        use super::*;

        #[test]
        fn held_button_fires_once() {
            let mut history = ButtonHistory::default();
            let edges: Vec<_> = (0..5).map(|_| history.advance(Buttons::INTERACT)).collect();

            assert_eq!(edges[0], Buttons::INTERACT);
            assert!(edges[1..].iter().all(|e| e.is_empty()));
        }

        #[test]
        fn release_and_press_fires_again() {
            let mut history = ButtonHistory::default();
            history.advance(Buttons::STEAL);
            history.advance(Buttons::empty());
            assert_eq!(history.advance(Buttons::STEAL), Buttons::STEAL);
        }

        #[test]
        fn edges_are_per_button() {
            let mut history = ButtonHistory::default();
            history.advance(Buttons::SPRINT);
            let edges = history.advance(Buttons::SPRINT | Buttons::JUMP);
            assert_eq!(edges, Buttons::JUMP);
            assert_eq!(history.held(), Buttons::SPRINT | Buttons::JUMP);
        }
    }

    mod buffer_tests {
        use super::*;

        #[test]
        fn stale_ticks_are_rejected() {
            let mut buffer = InputBuffer::new(8);
            let outcome = buffer.submit(ALICE, 4, 5, InputSnapshot::default());
            assert_eq!(outcome, InputAcceptance::Stale);
            assert!(buffer.is_empty());
        }

        #[test]
        fn first_submission_wins() {
            let mut buffer = InputBuffer::new(8);
            let first = InputSnapshot::pressing(Buttons::INTERACT);
            let second = InputSnapshot::pressing(Buttons::STEAL);

            assert_eq!(buffer.submit(ALICE, 5, 5, first), InputAcceptance::Accepted);
            assert_eq!(buffer.submit(ALICE, 5, 5, second), InputAcceptance::Duplicate);

            let taken = buffer.take_tick(5);
            assert_eq!(taken.get(&ALICE), Some(&first));
        }

        #[test]
        fn horizon_limits_future_submissions() {
            let mut buffer = InputBuffer::new(2);
            assert_eq!(
                buffer.submit(ALICE, 3, 0, InputSnapshot::default()),
                InputAcceptance::TooFarAhead
            );
            assert_eq!(
                buffer.submit(ALICE, 2, 0, InputSnapshot::default()),
                InputAcceptance::Accepted
            );
        }

        #[test]
        fn take_tick_leaves_future_ticks() {
            let mut buffer = InputBuffer::new(8);
            buffer.submit(ALICE, 0, 0, InputSnapshot::default());
            buffer.submit(BOB, 0, 0, InputSnapshot::default());
            buffer.submit(ALICE, 1, 0, InputSnapshot::default());

            let tick0 = buffer.take_tick(0);
            assert_eq!(tick0.len(), 2);
            assert_eq!(buffer.len(), 1);

            let tick1 = buffer.take_tick(1);
            assert!(tick1.contains_key(&ALICE));
            assert!(buffer.is_empty());
        }

        #[test]
        fn discard_participant_drops_all_their_ticks() {
            let mut buffer = InputBuffer::new(8);
            buffer.submit(ALICE, 0, 0, InputSnapshot::default());
            buffer.submit(ALICE, 1, 0, InputSnapshot::default());
            buffer.submit(BOB, 1, 0, InputSnapshot::default());

            buffer.discard_participant(ALICE);

            assert_eq!(buffer.len(), 1);
        }
    }
}
