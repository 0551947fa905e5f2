//! Hysteresis around the per-chunk activity decision.
//!
//! * [`OnsetGate`]: a recording only starts after `required` *consecutive*
//!   active chunks, so a click or door slam does not trigger one.
//! * [`SilenceTimeout`]: a recording ends once no active chunk has been
//!   seen for longer than the timeout.

use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// OnsetGate
// ---------------------------------------------------------------------------

/// Counts consecutive active chunks until onset is confirmed.
///
/// ```rust
/// use vox_recorder::pipeline::OnsetGate;
///
/// let mut gate = OnsetGate::new(3);
/// assert!(!gate.observe(true));
/// assert!(!gate.observe(true));
/// assert!(gate.observe(true));
/// ```
#[derive(Debug, Clone)]
pub struct OnsetGate {
    consecutive: usize,
    required: usize,
}

impl OnsetGate {
    /// `required` is clamped to at least one chunk.
    pub fn new(required: usize) -> Self {
        Self {
            consecutive: 0,
            required: required.max(1),
        }
    }

    /// Feed one chunk's activity; `true` once onset is confirmed.
    ///
    /// Any inactive chunk resets the run.
    pub fn observe(&mut self, active: bool) -> bool {
        if active {
            self.consecutive += 1;
            self.consecutive >= self.required
        } else {
            self.consecutive = 0;
            false
        }
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    pub fn consecutive(&self) -> usize {
        self.consecutive
    }

    pub fn required(&self) -> usize {
        self.required
    }
}

// ---------------------------------------------------------------------------
// SilenceTimeout
// ---------------------------------------------------------------------------

/// Tracks the last active chunk of a recording.
#[derive(Debug, Clone)]
pub struct SilenceTimeout {
    timeout: Duration,
    last_active: Option<Instant>,
}

impl SilenceTimeout {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_active: None,
        }
    }

    /// Start timing from `now` (recording start).
    pub fn restart(&mut self, now: Instant) {
        self.last_active = Some(now);
    }

    pub fn clear(&mut self) {
        self.last_active = None;
    }

    /// Feed one chunk; `true` when the recording should end.
    ///
    /// An active chunk moves the deadline to `now + timeout` before the
    /// check, so an active chunk never ends a recording itself.
    pub fn observe(&mut self, active: bool, now: Instant) -> bool {
        let last = self.last_active.get_or_insert(now);
        if active {
            *last = now;
        }
        now.saturating_duration_since(*last) > self.timeout
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
