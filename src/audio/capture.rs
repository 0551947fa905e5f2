//! Microphone capture via `cpal`, presented as a blocking chunk source.
//!
//! The recorder pulls audio one [`Chunk`] at a time through the
//! [`ChunkSource`] trait.  [`CpalSource`] implements it on top of a cpal
//! input stream: the cpal callback converts whatever the device delivers to
//! mono `i16` at the configured rate, cuts it into fixed-size chunks and
//! hands them over a bounded channel.  Dropping the source stops the stream.
//!
//! Errors are split by recoverability, see [`SourceError::is_transient`].

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc::{self, RecvTimeoutError, TrySendError},
    Arc, Mutex,
};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use thiserror::Error;

use super::resample::{downmix_to_mono, f32_to_i16, StreamResampler, RESAMPLE_BLOCK};
use super::Chunk;
use crate::config::AudioConfig;

/// Chunks buffered between the audio thread and the reader before overrun.
const QUEUE_CHUNKS: usize = 64;

/// How long `read_chunk` waits before reporting [`SourceError::Stalled`].
const POLL_INTERVAL: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// SourceError
// ---------------------------------------------------------------------------

/// Errors from opening or reading an audio source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The reader fell behind and chunks were discarded.
    #[error("input overrun: {dropped} chunk(s) dropped")]
    Overrun { dropped: usize },

    /// No chunk arrived within the poll interval.
    #[error("no audio received for {0:?}")]
    Stalled(Duration),

    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device {0:?} not found")]
    DeviceNotFound(String),

    #[error("input device disconnected: {0}")]
    Disconnected(String),

    #[error("unsupported device sample format {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to set up resampler: {0}")]
    Resampler(#[from] rubato::ResamplerConstructionError),

    #[error("failed to read wav input: {0}")]
    Wav(#[from] hound::Error),

    /// A finite source (file replay) has delivered its last chunk.
    #[error("end of input")]
    EndOfStream,
}

impl SourceError {
    /// `true` for errors the reader should skip over without resetting any
    /// detection state.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Overrun { .. } | SourceError::Stalled(_))
    }
}

// ---------------------------------------------------------------------------
// ChunkSource
// ---------------------------------------------------------------------------

/// Blocking, in-order supplier of fixed-size mono chunks.
pub trait ChunkSource {
    fn read_chunk(&mut self) -> Result<Chunk, SourceError>;
}

// ---------------------------------------------------------------------------
// Reframer
// ---------------------------------------------------------------------------

/// Cuts an arbitrary-length sample stream into exact `chunk_size` chunks.
///
/// Leftover samples are held until the next push completes a chunk.
#[derive(Debug)]
pub struct Reframer {
    pending: Vec<i16>,
    chunk_size: usize,
}

impl Reframer {
    /// # Panics
    ///
    /// Panics if `chunk_size == 0`.
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be > 0");
        Self {
            pending: Vec::with_capacity(chunk_size * 2),
            chunk_size,
        }
    }

    /// Append `samples` and return every chunk that is now complete.
    pub fn push(&mut self, samples: &[i16]) -> Vec<Chunk> {
        self.pending.extend_from_slice(samples);
        let complete = self.pending.len() / self.chunk_size;
        if complete == 0 {
            return Vec::new();
        }
        let take = complete * self.chunk_size;
        let chunks = self.pending[..take]
            .chunks_exact(self.chunk_size)
            .map(|c| Chunk::new(c.to_vec()))
            .collect();
        self.pending.drain(..take);
        chunks
    }

    /// Samples waiting for the next chunk to fill.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

// ---------------------------------------------------------------------------
// FrameSink (audio-thread side)
// ---------------------------------------------------------------------------

/// State owned by the cpal callback: conversion state plus the sending half
/// of the chunk queue.
struct FrameSink {
    channels: u16,
    resampler: StreamResampler,
    reframer: Reframer,
    tx: mpsc::SyncSender<Chunk>,
    overruns: Arc<AtomicUsize>,
}

impl FrameSink {
    fn accept(&mut self, data: &[f32]) {
        let mono = downmix_to_mono(data, self.channels);
        let resampled = self.resampler.process(&mono);
        let pcm = f32_to_i16(&resampled);

        for chunk in self.reframer.push(&pcm) {
            match self.tx.try_send(chunk) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.overruns.fetch_add(1, Ordering::Relaxed);
                }
                // Reader is gone; nothing left to deliver to.
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut sink: FrameSink,
    on_error: impl FnMut(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            scratch.clear();
            scratch.extend(data.iter().map(|&s| f32::from_sample(s)));
            sink.accept(&scratch);
        },
        on_error,
        None,
    )
}

// ---------------------------------------------------------------------------
// CpalSource
// ---------------------------------------------------------------------------

/// [`ChunkSource`] backed by a live cpal input stream.
///
/// The stream is stopped when this value is dropped.
pub struct CpalSource {
    _stream: cpal::Stream,
    rx: mpsc::Receiver<Chunk>,
    overruns: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<String>>>,
    device_name: String,
}

impl CpalSource {
    /// Open the configured (or default) input device and start streaming.
    ///
    /// The device runs at its preferred rate and channel count; conversion
    /// to mono `config.sample_rate` happens in the callback.
    pub fn open(config: &AudioConfig) -> Result<Self, SourceError> {
        let host = cpal::default_host();
        let device = match &config.device {
            Some(name) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n == *name).unwrap_or(false))
                .ok_or_else(|| SourceError::DeviceNotFound(name.clone()))?,
            None => host.default_input_device().ok_or(SourceError::NoDevice)?,
        };
        let device_name = device.name().unwrap_or_else(|_| "<unnamed>".into());

        let supported = device.default_input_config()?;
        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();

        log::info!(
            "audio: opening {device_name:?} ({} Hz, {} ch, {sample_format:?}) → {} Hz mono, {}-sample chunks",
            stream_config.sample_rate.0,
            stream_config.channels,
            config.sample_rate,
            config.chunk_size,
        );

        let (tx, rx) = mpsc::sync_channel(QUEUE_CHUNKS);
        let overruns = Arc::new(AtomicUsize::new(0));
        let failure: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let sink = FrameSink {
            channels: stream_config.channels,
            resampler: StreamResampler::new(
                stream_config.sample_rate.0,
                config.sample_rate,
                RESAMPLE_BLOCK,
            )?,
            reframer: Reframer::new(config.chunk_size),
            tx,
            overruns: Arc::clone(&overruns),
        };

        let error_overruns = Arc::clone(&overruns);
        let error_slot = Arc::clone(&failure);
        let on_error = move |err: cpal::StreamError| match err {
            cpal::StreamError::DeviceNotAvailable => {
                log::error!("cpal stream error: {err}");
                if let Ok(mut slot) = error_slot.lock() {
                    slot.get_or_insert_with(|| err.to_string());
                }
            }
            other => {
                log::warn!("cpal stream error: {other}");
                error_overruns.fetch_add(1, Ordering::Relaxed);
            }
        };

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &stream_config, sink, on_error)?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &stream_config, sink, on_error)?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &stream_config, sink, on_error)?
            }
            cpal::SampleFormat::I32 => {
                build_stream::<i32>(&device, &stream_config, sink, on_error)?
            }
            other => return Err(SourceError::UnsupportedFormat(other)),
        };

        stream.play()?;

        Ok(Self {
            _stream: stream,
            rx,
            overruns,
            failure,
            device_name,
        })
    }

    /// Name reported by the device.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl ChunkSource for CpalSource {
    fn read_chunk(&mut self) -> Result<Chunk, SourceError> {
        if let Some(reason) = self.failure.lock().ok().and_then(|mut slot| slot.take()) {
            return Err(SourceError::Disconnected(reason));
        }

        let dropped = self.overruns.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            return Err(SourceError::Overrun { dropped });
        }

        match self.rx.recv_timeout(POLL_INTERVAL) {
            Ok(chunk) => Ok(chunk),
            Err(RecvTimeoutError::Timeout) => Err(SourceError::Stalled(POLL_INTERVAL)),
            Err(RecvTimeoutError::Disconnected) => Err(SourceError::Disconnected(
                "capture callback stopped".into(),
            )),
        }
    }
}

/// Names of all input devices on the default host.
pub fn list_input_devices() -> Result<Vec<String>, SourceError> {
    let host = cpal::default_host();
    Ok(host
        .input_devices()?
        .filter_map(|d| d.name().ok())
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Chunk>();
    }

    // ---- Reframer ----------------------------------------------------------

    #[test]
    fn reframer_holds_partial_chunk() {
        let mut r = Reframer::new(4);
        assert!(r.push(&[1, 2, 3]).is_empty());
        assert_eq!(r.pending(), 3);
    }

    #[test]
    fn reframer_emits_exact_chunks_in_order() {
        let mut r = Reframer::new(3);
        let chunks = r.push(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].samples(), &[1, 2, 3]);
        assert_eq!(chunks[1].samples(), &[4, 5, 6]);
        assert_eq!(r.pending(), 1);

        let next = r.push(&[8, 9]);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].samples(), &[7, 8, 9]);
        assert_eq!(r.pending(), 0);
    }

    #[test]
    #[should_panic(expected = "chunk_size must be > 0")]
    fn reframer_zero_chunk_size_panics() {
        Reframer::new(0);
    }

    // ---- FrameSink ---------------------------------------------------------

    fn sink(capacity: usize, chunk_size: usize) -> (FrameSink, mpsc::Receiver<Chunk>) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        let sink = FrameSink {
            channels: 2,
            resampler: StreamResampler::new(8_000, 8_000, RESAMPLE_BLOCK)
                .expect("passthrough resampler"),
            reframer: Reframer::new(chunk_size),
            tx,
            overruns: Arc::new(AtomicUsize::new(0)),
        };
        (sink, rx)
    }

    #[test]
    fn frame_sink_downmixes_and_converts() {
        let (mut sink, rx) = sink(4, 2);
        sink.accept(&[1.0, 1.0, -1.0, -1.0]);
        let chunk = rx.try_recv().expect("one chunk");
        assert_eq!(chunk.samples(), &[32_767, -32_767]);
    }

    #[test]
    fn frame_sink_resamples_across_callbacks() {
        let (tx, rx) = mpsc::sync_channel(64);
        let mut sink = FrameSink {
            channels: 1,
            resampler: StreamResampler::new(48_000, 16_000, 480).expect("resampler"),
            reframer: Reframer::new(160),
            tx,
            overruns: Arc::new(AtomicUsize::new(0)),
        };
        // 100 callbacks of 10 ms at 48 kHz split at odd sizes.
        for n in 0..100 {
            sink.accept(&vec![0.5; if n % 2 == 0 { 470 } else { 490 }]);
        }
        let chunks: Vec<Chunk> = rx.try_iter().collect();
        // One second in, one second out, minus at most a block held back.
        assert!((97..=100).contains(&chunks.len()), "got {}", chunks.len());
        let mid = &chunks[chunks.len() / 2];
        assert!(mid.samples().iter().all(|&s| (s - 16_383).abs() <= 16));
    }

    #[test]
    fn frame_sink_counts_overruns_when_queue_full() {
        let (mut sink, _rx) = sink(1, 1);
        sink.accept(&[0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
        assert_eq!(sink.overruns.load(Ordering::Relaxed), 2);
    }

    // ---- SourceError -------------------------------------------------------

    #[test]
    fn transient_classification() {
        assert!(SourceError::Overrun { dropped: 3 }.is_transient());
        assert!(SourceError::Stalled(POLL_INTERVAL).is_transient());
        assert!(!SourceError::Disconnected("gone".into()).is_transient());
        assert!(!SourceError::NoDevice.is_transient());
        assert!(!SourceError::EndOfStream.is_transient());
    }
}
