//! Offline [`ChunkSource`] that replays a WAV file.
//!
//! The file is decoded up front, converted to mono `i16` at the configured
//! rate with the same resampler the live capture path uses, and then handed
//! out chunk by chunk.  After the last chunk every read returns
//! [`SourceError::EndOfStream`].

use std::collections::VecDeque;
use std::path::Path;

use super::capture::{ChunkSource, Reframer, SourceError};
use super::resample::{downmix_to_mono, f32_to_i16, StreamResampler, RESAMPLE_BLOCK};
use super::Chunk;
use crate::config::AudioConfig;

/// Replays a WAV file as if it were a microphone.
#[derive(Debug)]
pub struct WavFileSource {
    chunks: VecDeque<Chunk>,
    total: usize,
}

impl WavFileSource {
    /// Decode `path` and cut it into `config.chunk_size` chunks at
    /// `config.sample_rate`.  A trailing partial chunk is zero-filled.
    pub fn open(path: &Path, config: &AudioConfig) -> Result<Self, SourceError> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        log::info!(
            "replay: {} ({} Hz, {} ch, {} frames) → {} Hz mono, {}-sample chunks",
            path.display(),
            spec.sample_rate,
            spec.channels,
            interleaved.len() / usize::from(spec.channels.max(1)),
            config.sample_rate,
            config.chunk_size,
        );

        let mono = downmix_to_mono(&interleaved, spec.channels);
        let mut resampler =
            StreamResampler::new(spec.sample_rate, config.sample_rate, RESAMPLE_BLOCK)?;
        let mut resampled = resampler.process(&mono);
        resampled.extend(resampler.finish());
        Ok(Self::from_samples(&f32_to_i16(&resampled), config.chunk_size))
    }

    /// Build a source over already-converted mono samples.
    pub fn from_samples(samples: &[i16], chunk_size: usize) -> Self {
        let mut reframer = Reframer::new(chunk_size);
        let mut chunks: VecDeque<Chunk> = reframer.push(samples).into();
        let tail = reframer.pending();
        if tail > 0 {
            let last = reframer.push(&vec![0; chunk_size - tail]);
            chunks.extend(last);
        }
        let total = chunks.len();
        Self { chunks, total }
    }

    /// Chunks not yet read.
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks the file produced in total.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl ChunkSource for WavFileSource {
    fn read_chunk(&mut self) -> Result<Chunk, SourceError> {
        self.chunks.pop_front().ok_or(SourceError::EndOfStream)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
