//! Audio primitives: sample containers, detection, post-processing, capture.
//!
//! # Data flow
//!
//! ```text
//! Microphone → cpal callback → downmix / resample / i16 → Reframer
//!           → Chunk (sync_channel) → CpalSource::read_chunk
//!           → ActivityDetector + PreRollBuffer (pipeline)
//!           → SampleBuffer → TransformStage (normalize → trim → pad)
//!
//! WAV file → WavFileSource (same conversion, offline) → Chunk
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vox_recorder::audio::{ChunkSource, CpalSource};
//! use vox_recorder::config::AudioConfig;
//!
//! let mut source = CpalSource::open(&AudioConfig::default()).unwrap();
//! while let Ok(chunk) = source.read_chunk() {
//!     println!("peak {}", chunk.peak());
//! }
//! ```

pub mod buffer;
pub mod capture;
pub mod meter;
pub mod replay;
pub mod resample;
pub mod samples;
pub mod transform;
pub mod vad;

pub use buffer::PreRollBuffer;
pub use capture::{list_input_devices, ChunkSource, CpalSource, Reframer, SourceError};
pub use meter::VuMeter;
pub use replay::WavFileSource;
pub use resample::{downmix_to_mono, f32_to_i16, StreamResampler, RESAMPLE_BLOCK};
pub use samples::{peak_amplitude, Chunk, SampleBuffer, FULL_SCALE};
pub use transform::{normalize, pad, strip_padding, trim, TransformStage};
pub use vad::ActivityDetector;
