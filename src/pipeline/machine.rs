//! The WAITING → RECORDING → FINALIZE capture state machine.
//!
//! [`CapturePipeline`] consumes chunks strictly one at a time, in arrival
//! order.  It owns every piece of detection state (pre-roll, onset gate,
//! silence timeout, recording buffer) and produces an [`Utterance`] each
//! time a recording ends.
//!
//! ```text
//! WAITING   chunk ─▶ active? ─▶ OnsetGate ──not yet──▶ PreRollBuffer
//!                                         └─confirmed─▶ buffer = pre-roll + chunk
//!                                                       start SilenceTimeout
//! RECORDING chunk ─▶ buffer ─▶ SilenceTimeout ──expired──▶ TransformStage
//!                                                          ─▶ Utterance, back to WAITING
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{ActivityDetector, Chunk, PreRollBuffer, SampleBuffer, TransformStage};
use crate::config::RecorderConfig;
use crate::output::Utterance;

use super::clock::Timestamp;
use super::gate::{OnsetGate, SilenceTimeout};
use super::state::PipelineState;

// ---------------------------------------------------------------------------
// ChunkStatus
// ---------------------------------------------------------------------------

/// Per-chunk snapshot handed to the status observer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkStatus {
    /// Peak absolute amplitude of the chunk just processed.
    pub peak: u16,
    pub threshold: u16,
    /// State the chunk was consumed in.  The onset chunk counts as
    /// recording; so does the chunk that ends a recording.
    pub state: PipelineState,
    /// Time since onset, while recording.
    pub elapsed: Option<Duration>,
    /// Output file name, while recording.
    pub file_name: Option<String>,
}

/// Result of feeding one chunk.
#[derive(Debug)]
pub struct PushOutcome {
    pub status: ChunkStatus,
    /// Present when this chunk ended a recording.
    pub utterance: Option<Utterance>,
}

// ---------------------------------------------------------------------------
// CapturePipeline
// ---------------------------------------------------------------------------

struct ActiveRecording {
    buffer: SampleBuffer,
    started: Timestamp,
    path: PathBuf,
}

/// Voice-activated recording state machine.
pub struct CapturePipeline {
    detector: ActivityDetector,
    pre_roll: PreRollBuffer,
    onset: OnsetGate,
    silence: SilenceTimeout,
    transform: TransformStage,
    sample_rate: u32,
    storage_dir: PathBuf,
    file_prefix: String,
    recording: Option<ActiveRecording>,
}

impl CapturePipeline {
    pub fn new(config: &RecorderConfig) -> Self {
        let threshold = config.detection.silence_threshold;
        Self {
            detector: ActivityDetector::new(threshold),
            pre_roll: PreRollBuffer::new(config.pre_roll_chunks()),
            onset: OnsetGate::new(config.min_voice_chunks()),
            silence: SilenceTimeout::new(config.silence_timeout()),
            transform: TransformStage::new(threshold, config.pad_samples()),
            sample_rate: config.audio.sample_rate,
            storage_dir: config.output.storage_dir.clone(),
            file_prefix: config.output.file_prefix.clone(),
            recording: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        if self.recording.is_some() {
            PipelineState::Recording
        } else {
            PipelineState::Waiting
        }
    }

    /// Chunks currently held for pre-roll.
    pub fn pre_roll_len(&self) -> usize {
        self.pre_roll.len()
    }

    /// Samples captured so far in the current recording.
    pub fn recorded_samples(&self) -> usize {
        self.recording.as_ref().map_or(0, |r| r.buffer.len())
    }

    /// Feed the next chunk, read at `now`.
    pub fn push(&mut self, chunk: Chunk, now: Timestamp) -> PushOutcome {
        let peak = chunk.peak();
        let active = self.detector.is_active_peak(peak);

        let utterance = match self.recording.as_mut() {
            None => {
                if self.onset.observe(active) {
                    self.begin(chunk, now);
                } else {
                    self.pre_roll.push(chunk);
                }
                None
            }
            Some(recording) => {
                recording.buffer.extend_from_chunk(&chunk);
                if self.silence.observe(active, now.instant) {
                    self.finish(now)
                } else {
                    None
                }
            }
        };

        let status = match (&self.recording, &utterance) {
            (Some(recording), _) => self.recording_status(peak, recording, now),
            (None, Some(done)) => ChunkStatus {
                peak,
                threshold: self.detector.threshold(),
                state: PipelineState::Recording,
                elapsed: Some(done.recorded_for),
                file_name: Some(done.file_name().to_string()),
            },
            (None, None) => ChunkStatus {
                peak,
                threshold: self.detector.threshold(),
                state: PipelineState::Waiting,
                elapsed: None,
                file_name: None,
            },
        };

        PushOutcome { status, utterance }
    }

    /// End the current recording early (source failure, shutdown).
    ///
    /// Returns the processed utterance if a recording was in progress.
    /// Either way the pipeline is left waiting with empty pre-roll.
    pub fn flush(&mut self, now: Timestamp) -> Option<Utterance> {
        if self.recording.is_some() {
            return self.finish(now);
        }
        self.reset();
        None
    }

    /// Drop all state, including any in-progress recording.
    pub fn reset(&mut self) {
        self.recording = None;
        self.pre_roll.clear();
        self.onset.reset();
        self.silence.clear();
    }

    /// Start recording, seeded with the pre-roll window.  The confirming
    /// chunk is the newest entry of that window.
    fn begin(&mut self, chunk: Chunk, now: Timestamp) {
        let seed = if self.pre_roll.capacity() > 0 {
            self.pre_roll.push(chunk);
            self.pre_roll.drain()
        } else {
            vec![chunk]
        };
        let mut buffer =
            SampleBuffer::with_capacity(seed.iter().map(Chunk::len).sum::<usize>());
        for c in &seed {
            buffer.extend_from_chunk(c);
        }

        let path = Utterance::path_in(&self.storage_dir, &self.file_prefix, &now.wall);
        log::debug!(
            "onset confirmed: recording to {} ({} seed chunks)",
            path.display(),
            seed.len()
        );

        self.onset.reset();
        self.silence.restart(now.instant);
        self.recording = Some(ActiveRecording {
            buffer,
            started: now,
            path,
        });
    }

    fn finish(&mut self, now: Timestamp) -> Option<Utterance> {
        let recording = self.recording.take()?;
        self.reset();

        let raw_len = recording.buffer.len();
        let samples = self.transform.apply(recording.buffer);
        log::debug!(
            "finalized recording: {raw_len} raw samples → {} after normalize/trim/pad",
            samples.len()
        );

        Some(Utterance {
            samples,
            started_at: recording.started.wall,
            sample_rate: self.sample_rate,
            path: recording.path,
            recorded_for: now
                .instant
                .saturating_duration_since(recording.started.instant),
        })
    }

    fn recording_status(
        &self,
        peak: u16,
        recording: &ActiveRecording,
        now: Timestamp,
    ) -> ChunkStatus {
        ChunkStatus {
            peak,
            threshold: self.detector.threshold(),
            state: PipelineState::Recording,
            elapsed: Some(now.instant.saturating_duration_since(recording.started.instant)),
            file_name: recording
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
