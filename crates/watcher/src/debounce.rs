//! Debounce and throttle state machine
//!
//! Pure state, no timers or clocks of its own. Callers feed it transitions
//! (change arrived, deadline fired, trigger finished, stop) together with
//! the current time, and read back which deadline should be armed. That
//! keeps the coalescing and throttling rules testable without any runtime.
//!
//! Phases:
//! - `Idle`: no deadline armed. A pending change may still be set if a
//!   trigger failed or was throttled away; the next change re-arms.
//! - `PendingDebounce`: a deadline is armed; every new change slides it.
//! - `Executing`: a backup is running. Changes arriving now stash a fresh
//!   deadline that is re-armed when the run finishes.

use std::time::{Duration, Instant};

/// Where a session currently is in its trigger cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PendingDebounce { deadline: Instant },
    Executing { rearmed: Option<Instant> },
}

/// Result of a debounce deadline firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Emit one trigger request.
    Trigger,
    /// Throttled: the minimum interval since the last run has not elapsed.
    /// The firing is dropped and nothing is re-armed; only a new change
    /// schedules another attempt.
    Throttled,
    /// The deadline no longer matches the armed one; ignore.
    Stale,
}

pub struct Debouncer {
    wait: Duration,
    min_interval: Duration,
    phase: Phase,
    pending_change: bool,
    last_trigger: Option<Instant>,
}

impl Debouncer {
    /// `wait` is the quiet period required after the last change;
    /// `min_interval` the floor between completed runs.
    pub fn new(wait: Duration, min_interval: Duration) -> Self {
        Self {
            wait,
            min_interval,
            phase: Phase::Idle,
            pending_change: false,
            last_trigger: None,
        }
    }

    /// An accepted change arrived. Slides the debounce window to
    /// `now + wait`; during a run the new deadline is stashed instead.
    pub fn record_change(&mut self, now: Instant) {
        self.pending_change = true;
        let deadline = now + self.wait;

        self.phase = match self.phase {
            Phase::Idle | Phase::PendingDebounce { .. } => Phase::PendingDebounce { deadline },
            Phase::Executing { .. } => Phase::Executing {
                rearmed: Some(deadline),
            },
        };
    }

    /// The armed deadline fired. Only acted on if `fired` is still the
    /// deadline this machine armed; a slid window makes it stale.
    pub fn debounce_fired(&mut self, fired: Instant, now: Instant) -> FireOutcome {
        match self.phase {
            Phase::PendingDebounce { deadline } if deadline == fired => {}
            _ => return FireOutcome::Stale,
        }

        // Deadline consumed either way; a throttled firing is not re-armed.
        self.phase = Phase::Idle;

        let interval_met = self
            .last_trigger
            .map_or(true, |last| now.duration_since(last) >= self.min_interval);

        if interval_met {
            FireOutcome::Trigger
        } else {
            FireOutcome::Throttled
        }
    }

    /// The trigger worker picked up a request. Returns false for a spurious
    /// wake (no pending change), in which case nothing runs.
    pub fn begin_trigger(&mut self) -> bool {
        if !self.pending_change {
            return false;
        }

        let rearmed = match self.phase {
            Phase::PendingDebounce { deadline } => Some(deadline),
            Phase::Executing { rearmed } => rearmed,
            Phase::Idle => None,
        };
        self.phase = Phase::Executing { rearmed };
        true
    }

    /// Begin a run that does not require a pending change (the baseline
    /// backup at session start).
    pub fn begin_unconditional(&mut self) {
        let rearmed = match self.phase {
            Phase::PendingDebounce { deadline } => Some(deadline),
            Phase::Executing { rearmed } => rearmed,
            Phase::Idle => None,
        };
        self.phase = Phase::Executing { rearmed };
    }

    /// A run finished. On success the throttle clock restarts and the
    /// pending flag clears, unless a change arrived during the run; that
    /// change keeps the flag set and its stashed deadline is re-armed.
    /// On failure neither advances, so the next change retries promptly.
    pub fn finish_trigger(&mut self, now: Instant, success: bool) {
        let rearmed = match self.phase {
            Phase::Executing { rearmed } => rearmed,
            _ => None,
        };

        if success {
            self.last_trigger = Some(now);
            if rearmed.is_none() {
                self.pending_change = false;
            }
        }

        self.phase = match rearmed {
            Some(deadline) => Phase::PendingDebounce { deadline },
            None => Phase::Idle,
        };
    }

    /// Disarm the deadline. An executing run is left to finish but will
    /// not re-arm anything.
    pub fn stop(&mut self) {
        self.phase = match self.phase {
            Phase::Executing { .. } => Phase::Executing { rearmed: None },
            _ => Phase::Idle,
        };
    }

    /// The deadline the caller's timer should currently be armed for.
    pub fn armed_deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::PendingDebounce { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending_change(&self) -> bool {
        self.pending_change
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }
}
