//! Writing utterances as 16-bit mono WAV files with `hound`.
//!
//! The file is first written as `<name>.wav.part` and renamed into place once
//! complete, so an interrupted write never leaves a truncated `.wav`.

use std::path::PathBuf;

use thiserror::Error;

use super::Utterance;

// ---------------------------------------------------------------------------
// SinkError
// ---------------------------------------------------------------------------

/// Failure to persist one utterance.  Never fatal to the recorder.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wav encoding error: {0}")]
    Wav(#[from] hound::Error),
}

// ---------------------------------------------------------------------------
// UtteranceSink
// ---------------------------------------------------------------------------

/// Destination for finished recordings.
pub trait UtteranceSink {
    fn emit(&mut self, utterance: &Utterance) -> Result<(), SinkError>;
}

// ---------------------------------------------------------------------------
// WavSink
// ---------------------------------------------------------------------------

/// Writes each utterance to its own WAV file at `utterance.path`.
#[derive(Debug, Default)]
pub struct WavSink;

impl WavSink {
    pub fn new() -> Self {
        Self
    }

    fn spec(utterance: &Utterance) -> hound::WavSpec {
        hound::WavSpec {
            channels: Utterance::CHANNELS,
            sample_rate: utterance.sample_rate,
            bits_per_sample: Utterance::BITS_PER_SAMPLE,
            sample_format: hound::SampleFormat::Int,
        }
    }

    fn partial_path(utterance: &Utterance) -> PathBuf {
        let mut name = utterance.path.clone().into_os_string();
        name.push(".part");
        PathBuf::from(name)
    }
}

impl UtteranceSink for WavSink {
    fn emit(&mut self, utterance: &Utterance) -> Result<(), SinkError> {
        let partial = Self::partial_path(utterance);

        let result = (|| -> Result<(), SinkError> {
            let mut writer = hound::WavWriter::create(&partial, Self::spec(utterance))?;
            for &sample in utterance.samples.as_slice() {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
            std::fs::rename(&partial, &utterance.path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = std::fs::remove_file(&partial);
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
