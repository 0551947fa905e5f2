//! Persisting finished recordings.
//!
//! [`Utterance`] is what the capture pipeline produces; an
//! [`UtteranceSink`] writes it somewhere.  [`WavSink`] is the file-backed
//! sink; [`ensure_storage_dir`] is the startup check for its directory.

pub mod storage;
pub mod utterance;
pub mod wav;

pub use storage::{ensure_storage_dir, StorageError};
pub use utterance::{file_name_for, Utterance, FILE_TIMESTAMP_FORMAT};
pub use wav::{SinkError, UtteranceSink, WavSink};
