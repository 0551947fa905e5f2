//! Peak-amplitude voice activity detection.
//!
//! [`ActivityDetector`] classifies one chunk at a time: a chunk is *active*
//! when its peak absolute sample is strictly above the threshold.  There is
//! no state here; hysteresis lives in [`crate::pipeline::OnsetGate`] and
//! [`crate::pipeline::SilenceTimeout`].
//!
//! # Example
//!
//! ```rust
//! use vox_recorder::audio::{ActivityDetector, Chunk};
//!
//! let vad = ActivityDetector::new(3000);
//! assert!(!vad.is_active(&Chunk::filled(3000, 1024))); // equal is not above
//! assert!(vad.is_active(&Chunk::filled(-3001, 1024)));
//! ```

use super::Chunk;

// ---------------------------------------------------------------------------
// ActivityDetector
// ---------------------------------------------------------------------------

/// Stateless threshold classifier.
#[derive(Debug, Clone, Copy)]
pub struct ActivityDetector {
    threshold: u16,
}

impl ActivityDetector {
    /// `threshold` is on the 16-bit scale (full scale `32767`).
    pub fn new(threshold: u16) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// `true` when the chunk's peak is strictly above the threshold.
    pub fn is_active(&self, chunk: &Chunk) -> bool {
        self.is_active_peak(chunk.peak())
    }

    /// Same decision for an already computed peak.
    pub fn is_active_peak(&self, peak: u16) -> bool {
        peak > self.threshold
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
