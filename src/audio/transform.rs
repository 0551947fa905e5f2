//! Post-capture processing applied once per recording.
//!
//! Order is fixed: [`normalize`] → [`trim`] → [`pad`].  [`TransformStage`]
//! bundles the parameters and runs all three.
//!
//! | Step | Effect |
//! |------|--------|
//! | normalize | rescale so the loudest sample sits at full scale |
//! | trim | drop leading/trailing samples up to the first/last one above threshold |
//! | pad | add a short run of zeros at both ends |
//!
//! # Example
//!
//! ```rust
//! use vox_recorder::audio::{SampleBuffer, TransformStage};
//!
//! let stage = TransformStage::new(3000, 2);
//! let raw = SampleBuffer::from(vec![0, 100, 16_000, -8_000, 50, 0]);
//! let out = stage.apply(raw);
//! assert_eq!(out.as_slice(), &[0, 0, 32_767, -16_383, 0, 0]);
//! ```

use super::samples::{SampleBuffer, FULL_SCALE};

/// Rescale `buf` so its peak becomes [`FULL_SCALE`].
///
/// An all-zero (or empty) buffer is returned unchanged, as is a buffer that
/// is already at full scale.
pub fn normalize(mut buf: SampleBuffer) -> SampleBuffer {
    let peak = buf.peak();
    if peak == 0 {
        return buf;
    }
    buf.scale(FULL_SCALE as u32, u32::from(peak));
    buf
}

/// Drop every sample before the first one whose magnitude is above
/// `threshold`, then do the same from the end.
///
/// If nothing is above `threshold` the result is empty.
pub fn trim(buf: &SampleBuffer, threshold: u16) -> SampleBuffer {
    let samples = buf.as_slice();
    let loud = |s: &i16| s.unsigned_abs() > threshold;

    match (samples.iter().position(loud), samples.iter().rposition(loud)) {
        (Some(start), Some(end)) => SampleBuffer::from(samples[start..=end].to_vec()),
        _ => SampleBuffer::new(),
    }
}

/// Surround `buf` with `pad_samples` zeros on each side.
pub fn pad(buf: &SampleBuffer, pad_samples: usize) -> SampleBuffer {
    let mut out = SampleBuffer::with_capacity(buf.len() + 2 * pad_samples);
    out.extend_from_slice(&vec![0; pad_samples]);
    out.extend_from_slice(buf.as_slice());
    out.extend_from_slice(&vec![0; pad_samples]);
    out
}

/// Remove `pad_samples` from each end; the inverse of [`pad`].
///
/// Returns an empty buffer when `buf` is shorter than both margins.
pub fn strip_padding(buf: &SampleBuffer, pad_samples: usize) -> SampleBuffer {
    let samples = buf.as_slice();
    if samples.len() <= 2 * pad_samples {
        return SampleBuffer::new();
    }
    SampleBuffer::from(samples[pad_samples..samples.len() - pad_samples].to_vec())
}

// ---------------------------------------------------------------------------
// TransformStage
// ---------------------------------------------------------------------------

/// Parameters for the finalize step of a recording.
#[derive(Debug, Clone, Copy)]
pub struct TransformStage {
    threshold: u16,
    pad_samples: usize,
}

impl TransformStage {
    pub fn new(threshold: u16, pad_samples: usize) -> Self {
        Self {
            threshold,
            pad_samples,
        }
    }

    pub fn pad_samples(&self) -> usize {
        self.pad_samples
    }

    /// Normalize, trim, pad.
    pub fn apply(&self, raw: SampleBuffer) -> SampleBuffer {
        let normalized = normalize(raw);
        let trimmed = trim(&normalized, self.threshold);
        pad(&trimmed, self.pad_samples)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
