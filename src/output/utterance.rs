//! A finished recording and its file naming.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::audio::SampleBuffer;

/// `strftime` layout of the timestamp embedded in file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// File name for a recording whose onset was confirmed at `started_at`,
/// e.g. `tx_20250101120000.wav`.
pub fn file_name_for(prefix: &str, started_at: &DateTime<Local>) -> String {
    format!("{prefix}{}.wav", started_at.format(FILE_TIMESTAMP_FORMAT))
}

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// One detected sound event, processed and ready to be written.
///
/// Always mono, 16-bit.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Normalised, trimmed and padded samples.
    pub samples: SampleBuffer,
    /// Wall-clock time onset was confirmed.
    pub started_at: DateTime<Local>,
    pub sample_rate: u32,
    /// Destination `.wav` path.
    pub path: PathBuf,
    /// Time from onset confirmation to the end of recording.
    pub recorded_for: Duration,
}

impl Utterance {
    pub const CHANNELS: u16 = 1;
    pub const BITS_PER_SAMPLE: u16 = 16;

    /// File name component of [`path`](Self::path).
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Length of the written audio in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.samples.duration_secs(self.sample_rate)
    }

    /// Build the destination path inside `dir`.
    pub fn path_in(dir: &Path, prefix: &str, started_at: &DateTime<Local>) -> PathBuf {
        dir.join(file_name_for(prefix, started_at))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 3, 7, 9, 5, 1)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn file_name_has_fourteen_digit_timestamp() {
        let name = file_name_for("tx_", &stamp());
        assert_eq!(name, "tx_20250307090501.wav");
    }

    #[test]
    fn path_in_joins_storage_dir() {
        let path = Utterance::path_in(Path::new("/tmp/records"), "tx_", &stamp());
        assert_eq!(path, PathBuf::from("/tmp/records/tx_20250307090501.wav"));
    }

    #[test]
    fn utterance_accessors() {
        let u = Utterance {
            samples: SampleBuffer::silence(8_000),
            started_at: stamp(),
            sample_rate: 16_000,
            path: PathBuf::from("records/tx_20250307090501.wav"),
            recorded_for: Duration::from_secs(3),
        };
        assert_eq!(u.file_name(), "tx_20250307090501.wav");
        assert!((u.duration_secs() - 0.5).abs() < 1e-6);
    }
}
