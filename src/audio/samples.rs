//! Signed 16-bit sample containers.
//!
//! [`Chunk`] is one read unit from the audio source, immutable once built.
//! [`SampleBuffer`] is the growable sequence a recording accumulates into and
//! that the post-capture transforms operate on.
//!
//! # Example
//!
//! ```rust
//! use vox_recorder::audio::{Chunk, SampleBuffer};
//!
//! let chunk = Chunk::new(vec![10, -4000, 25]);
//! assert_eq!(chunk.peak(), 4000);
//!
//! let mut buf = SampleBuffer::new();
//! buf.extend_from_chunk(&chunk);
//! buf.reverse();
//! assert_eq!(buf.as_slice(), &[25, -4000, 10]);
//! ```

/// Largest magnitude a normalised sample may take.
pub const FULL_SCALE: i16 = i16::MAX;

/// Peak absolute amplitude of `samples`, widened so `i16::MIN` does not
/// overflow.  Returns `0` for an empty slice.
pub fn peak_amplitude(samples: &[i16]) -> u16 {
    samples
        .iter()
        .map(|s| s.unsigned_abs())
        .max()
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// A fixed-size block of mono samples as delivered by a [`ChunkSource`].
///
/// [`ChunkSource`]: crate::audio::ChunkSource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    samples: Box<[i16]>,
}

impl Chunk {
    pub fn new(samples: Vec<i16>) -> Self {
        Self {
            samples: samples.into_boxed_slice(),
        }
    }

    /// A chunk of `len` samples all equal to `value`.
    pub fn filled(value: i16, len: usize) -> Self {
        Self::new(vec![value; len])
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Peak absolute amplitude of this chunk.
    pub fn peak(&self) -> u16 {
        peak_amplitude(&self.samples)
    }
}

impl From<Vec<i16>> for Chunk {
    fn from(samples: Vec<i16>) -> Self {
        Self::new(samples)
    }
}

// ---------------------------------------------------------------------------
// SampleBuffer
// ---------------------------------------------------------------------------

/// Growable mono `i16` sample sequence.
///
/// Recording appends to it chunk by chunk; [`crate::audio::transform`]
/// rescales, trims and pads it before it is written out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Vec<i16>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// `len` zero-valued samples.
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![0; len],
        }
    }

    pub fn extend_from_slice(&mut self, samples: &[i16]) {
        self.samples.extend_from_slice(samples);
    }

    pub fn extend_from_chunk(&mut self, chunk: &Chunk) {
        self.samples.extend_from_slice(chunk.samples());
    }

    /// Peak absolute amplitude over the whole buffer.
    pub fn peak(&self) -> u16 {
        peak_amplitude(&self.samples)
    }

    /// Multiply every sample by `numerator / denominator`, clamping to
    /// `±FULL_SCALE`.
    ///
    /// Integer arithmetic; results are truncated toward zero.
    pub fn scale(&mut self, numerator: u32, denominator: u32) {
        if denominator == 0 {
            return;
        }
        let limit = i64::from(FULL_SCALE);
        for s in &mut self.samples {
            let scaled = i64::from(*s) * i64::from(numerator) / i64::from(denominator);
            *s = scaled.clamp(-limit, limit) as i16;
        }
    }

    pub fn reverse(&mut self) {
        self.samples.reverse();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_vec(self) -> Vec<i16> {
        self.samples
    }

    /// Duration in seconds at `sample_rate` Hz mono.
    pub fn duration_secs(&self, sample_rate: u32) -> f32 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / sample_rate as f32
    }
}

impl From<Vec<i16>> for SampleBuffer {
    fn from(samples: Vec<i16>) -> Self {
        Self { samples }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
