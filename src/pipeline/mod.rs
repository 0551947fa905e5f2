//! Capture pipeline: detection state machine plus the loop that drives it.
//!
//! # Architecture
//!
//! ```text
//! ChunkSource::read_chunk()            (CpalSource | WavFileSource)
//!        │
//!        ▼
//! Recorder::run()  ── Clock::now() ──▶ CapturePipeline::push(chunk, now)
//!        │                                 │
//!        │                                 ├─ WAITING:   OnsetGate + PreRollBuffer
//!        │                                 └─ RECORDING: SilenceTimeout
//!        │                                        └─ expired → TransformStage → Utterance
//!        │
//!        ├─ StatusObserver::on_chunk(&ChunkStatus)   (TerminalStatus)
//!        └─ UtteranceSink::emit(&Utterance)          (WavSink)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::{atomic::AtomicBool, Arc};
//! use vox_recorder::audio::CpalSource;
//! use vox_recorder::config::RecorderConfig;
//! use vox_recorder::output::WavSink;
//! use vox_recorder::pipeline::{CapturePipeline, NullObserver, Recorder, SystemClock};
//!
//! let config = RecorderConfig::default();
//! let source = CpalSource::open(&config.audio).unwrap();
//! let shutdown = Arc::new(AtomicBool::new(false));
//!
//! let mut recorder = Recorder::new(
//!     CapturePipeline::new(&config),
//!     WavSink::new(),
//!     NullObserver,
//!     SystemClock,
//!     shutdown,
//! );
//! let summary = recorder.run(source, || CpalSource::open(&config.audio));
//! println!("{} recordings written", summary.utterances_written);
//! ```

pub mod clock;
pub mod gate;
pub mod machine;
pub mod observer;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use clock::{Clock, SteppingClock, SystemClock, Timestamp};
pub use gate::{OnsetGate, SilenceTimeout};
pub use machine::{CapturePipeline, ChunkStatus, PushOutcome};
pub use observer::{render_line, NullObserver, StatusObserver, TerminalStatus};
pub use runner::{ReconnectPolicy, Recorder, RunSummary};
pub use state::PipelineState;
