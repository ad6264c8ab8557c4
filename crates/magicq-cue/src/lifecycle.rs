//! Cue lifecycle
//!
//! The host drives every cue through the same phases:
//!
//! ```text
//! Stopped ──play──▶ PlayingPre ──▶ PlayingAction ──▶ PlayingPost ──▶ Stopped
//!                        │               │                │
//!                        └─────pause─────┴──────▶ Paused ◀┘
//! ```
//!
//! `Error` replaces `Stopped` while the cue's configuration is invalid.
//! [`CueLifecycle`] is the host's base behavior; [`TimedLifecycle`] is the
//! reference implementation that resolves the phase from elapsed clock time.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Host clock value in nanoseconds
pub type ClockTime = u64;

pub const NANOS_PER_MILLI: ClockTime = 1_000_000;
pub const NANOS_PER_SEC: ClockTime = 1_000_000_000;

/// Phase of a cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueState {
    Stopped,
    PlayingPre,
    PlayingAction,
    PlayingPost,
    Paused,
    Error,
}

impl CueState {
    pub fn is_playing(&self) -> bool {
        matches!(
            self,
            CueState::PlayingPre | CueState::PlayingAction | CueState::PlayingPost
        )
    }
}

/// Whether a pulse that moved the cue from `before` to `after` is the moment
/// a zero-length action happens: leaving pre-wait, or leaving the action.
pub fn is_fire_instant(before: CueState, after: CueState) -> bool {
    (before == CueState::PlayingPre && after != CueState::PlayingPre)
        || (before == CueState::PlayingAction && after != CueState::PlayingAction)
}

/// Base cue behavior supplied by the host
pub trait CueLifecycle {
    fn state(&self) -> CueState;

    fn set_state(&mut self, state: CueState);

    /// Start or resume. Returns false if the cue cannot play now.
    fn play_base(&mut self) -> bool;

    /// Advance to `clock`
    fn pulse_base(&mut self, clock: ClockTime);

    fn pause_base(&mut self);

    fn stop_base(&mut self);
}

/// Phase timing driven by the pulse clock
#[derive(Debug, Clone)]
pub struct TimedLifecycle {
    state: CueState,
    pre_time: ClockTime,
    action_time: ClockTime,
    post_time: ClockTime,
    /// Playing time accumulated so far, pauses excluded
    elapsed: ClockTime,
    last_clock: Option<ClockTime>,
    resume_state: CueState,
}

impl Default for TimedLifecycle {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl TimedLifecycle {
    pub fn new(pre_time: ClockTime, action_time: ClockTime, post_time: ClockTime) -> Self {
        Self {
            state: CueState::Stopped,
            pre_time,
            action_time,
            post_time,
            elapsed: 0,
            last_clock: None,
            resume_state: CueState::PlayingPre,
        }
    }

    pub fn with_pre_time(mut self, pre_time: ClockTime) -> Self {
        self.pre_time = pre_time;
        self
    }

    pub fn with_post_time(mut self, post_time: ClockTime) -> Self {
        self.post_time = post_time;
        self
    }

    pub fn pre_time(&self) -> ClockTime {
        self.pre_time
    }

    pub fn action_time(&self) -> ClockTime {
        self.action_time
    }

    pub fn post_time(&self) -> ClockTime {
        self.post_time
    }

    /// Playing time so far
    pub fn elapsed(&self) -> ClockTime {
        self.elapsed
    }

    fn phase_at(&self, elapsed: ClockTime) -> CueState {
        let action_start = self.pre_time;
        let post_start = action_start.saturating_add(self.action_time);
        let end = post_start.saturating_add(self.post_time);

        if elapsed < action_start {
            CueState::PlayingPre
        } else if elapsed < post_start {
            CueState::PlayingAction
        } else if elapsed < end {
            CueState::PlayingPost
        } else {
            CueState::Stopped
        }
    }

    fn reset(&mut self) {
        self.elapsed = 0;
        self.last_clock = None;
        self.resume_state = CueState::PlayingPre;
    }
}

impl CueLifecycle for TimedLifecycle {
    fn state(&self) -> CueState {
        self.state
    }

    fn set_state(&mut self, state: CueState) {
        if !state.is_playing() && state != CueState::Paused {
            self.reset();
        }
        self.state = state;
    }

    fn play_base(&mut self) -> bool {
        match self.state {
            CueState::Stopped => {
                self.reset();
                self.state = CueState::PlayingPre;
                true
            }
            CueState::Paused => {
                // The gap spent paused is not counted
                self.last_clock = None;
                self.state = self.resume_state;
                true
            }
            _ => false,
        }
    }

    fn pulse_base(&mut self, clock: ClockTime) {
        let delta = self
            .last_clock
            .map(|last| clock.saturating_sub(last))
            .unwrap_or(0);
        self.last_clock = Some(clock);

        if !self.state.is_playing() {
            return;
        }

        self.elapsed = self.elapsed.saturating_add(delta);
        let next = self.phase_at(self.elapsed);
        if next != self.state {
            debug!("Cue phase {:?} -> {:?} at {}ns", self.state, next, self.elapsed);
        }

        if next == CueState::Stopped {
            self.reset();
        }
        self.state = next;
    }

    fn pause_base(&mut self) {
        if self.state.is_playing() {
            self.resume_state = self.state;
            self.state = CueState::Paused;
        }
    }

    fn stop_base(&mut self) {
        if self.state != CueState::Error {
            self.reset();
            self.state = CueState::Stopped;
        }
    }
}
