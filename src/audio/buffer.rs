//! Bounded pre-roll buffer of recent [`Chunk`]s.
//!
//! While waiting for sound, every chunk is pushed here.  When the buffer is
//! full the oldest chunk is dropped, so the last `capacity` chunks (roughly
//! the last `pre_roll_secs` of audio) are always available.  At onset the
//! whole buffer is drained into the new recording so the first syllable is
//! not lost.
//!
//! # Example
//!
//! ```rust
//! use vox_recorder::audio::{Chunk, PreRollBuffer};
//!
//! let mut buf = PreRollBuffer::new(2);
//! for v in [1, 2, 3] {
//!     buf.push(Chunk::filled(v, 4));
//! }
//! let chunks = buf.drain();
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[0].samples()[0], 2);
//! ```

use std::collections::VecDeque;

use super::Chunk;

// ---------------------------------------------------------------------------
// PreRollBuffer
// ---------------------------------------------------------------------------

/// FIFO of at most `capacity` chunks.
///
/// A capacity of `0` is allowed and keeps nothing (pre-roll disabled).
#[derive(Debug)]
pub struct PreRollBuffer {
    chunks: VecDeque<Chunk>,
    capacity: usize,
}

impl PreRollBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            chunks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `chunk`, evicting the oldest chunk when over capacity.
    pub fn push(&mut self, chunk: Chunk) {
        self.chunks.push_back(chunk);
        while self.chunks.len() > self.capacity {
            self.chunks.pop_front();
        }
    }

    /// Remove and return every buffered chunk, oldest first.
    pub fn drain(&mut self) -> Vec<Chunk> {
        self.chunks.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Number of chunks currently held.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples across all buffered chunks.
    pub fn sample_len(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
