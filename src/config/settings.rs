//! Recorder settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Every field has a
//! default, so a partial `settings.toml` is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Upper bound for every duration setting.
pub const MAX_DURATION_SECS: f64 = 3600.0;

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Capture format.  Output files use the same rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Recording sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per chunk, the unit of detection.
    pub chunk_size: usize,
    /// Input device name; `None` means the system default.
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            chunk_size: 1024,
            device: None,
        }
    }
}

// ---------------------------------------------------------------------------
// DetectionConfig
// ---------------------------------------------------------------------------

/// Voice-activity thresholds and timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Peak amplitude (16-bit scale) a chunk must exceed to count as active.
    pub silence_threshold: u16,
    /// Continuous silence, in seconds, that ends a recording.
    pub record_after_silence_secs: f64,
    /// Seconds of audio kept from before onset.
    pub pre_roll_secs: f64,
    /// Sustained activity, in seconds, required before a recording starts.
    pub voice_min_duration_secs: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            silence_threshold: 3000,
            record_after_silence_secs: 2.0,
            pre_roll_secs: 2.0,
            voice_min_duration_secs: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Where and how finished recordings are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives the WAV files.
    pub storage_dir: PathBuf,
    /// Seconds of silence added to each end of a recording.
    pub pad_silence_secs: f64,
    /// File name prefix, followed by the onset timestamp.
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./records"),
            pad_silence_secs: 0.5,
            file_prefix: "tx_".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// StatusConfig
// ---------------------------------------------------------------------------

/// Terminal status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub enabled: bool,
    /// Cells in the VU bar.
    pub meter_width: usize,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            meter_width: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```rust
/// use vox_recorder::config::RecorderConfig;
///
/// let cfg = RecorderConfig::default();
/// assert_eq!(cfg.pre_roll_chunks(), 86);   // 2 s × 44100 / 1024, truncated
/// assert_eq!(cfg.min_voice_chunks(), 22);  // 0.5 s × 44100 / 1024, rounded up
/// assert_eq!(cfg.pad_samples(), 22_050);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub audio: AudioConfig,
    pub detection: DetectionConfig,
    pub output: OutputConfig,
    pub status: StatusConfig,
}

impl RecorderConfig {
    /// Load from the platform `settings.toml`, or defaults if it is missing.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path; a missing file yields `Default`.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the recorder cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            bail!("audio.sample_rate must be > 0");
        }
        if self.audio.chunk_size == 0 {
            bail!("audio.chunk_size must be > 0");
        }
        if self.detection.silence_threshold > i16::MAX as u16 {
            bail!(
                "detection.silence_threshold must be at most {} (got {})",
                i16::MAX,
                self.detection.silence_threshold
            );
        }
        for (name, value) in [
            (
                "detection.record_after_silence_secs",
                self.detection.record_after_silence_secs,
            ),
            ("detection.pre_roll_secs", self.detection.pre_roll_secs),
            (
                "detection.voice_min_duration_secs",
                self.detection.voice_min_duration_secs,
            ),
            ("output.pad_silence_secs", self.output.pad_silence_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be a non-negative number (got {value})");
            }
            if value > MAX_DURATION_SECS {
                bail!("{name} must be at most {MAX_DURATION_SECS} seconds (got {value})");
            }
        }
        if self.output.file_prefix.contains(std::path::is_separator) {
            bail!("output.file_prefix must not contain a path separator");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Derived values
    // -----------------------------------------------------------------------

    /// Pre-roll capacity in chunks (truncating division).
    pub fn pre_roll_chunks(&self) -> usize {
        self.samples_for(self.detection.pre_roll_secs) / self.audio.chunk_size.max(1)
    }

    /// Consecutive active chunks required to confirm onset (rounded up,
    /// at least one).
    pub fn min_voice_chunks(&self) -> usize {
        self.samples_for(self.detection.voice_min_duration_secs)
            .div_ceil(self.audio.chunk_size.max(1))
            .max(1)
    }

    /// Zero samples added to each end of a recording.
    pub fn pad_samples(&self) -> usize {
        self.samples_for(self.output.pad_silence_secs)
    }

    /// Continuous silence that ends a recording.
    pub fn silence_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.detection.record_after_silence_secs)
            .unwrap_or(Duration::MAX)
    }

    /// Whole samples in `secs` at the configured rate.
    ///
    /// Rounded before any chunk division so that durations which are an
    /// exact number of chunks (0.3 s at 16 kHz / 480) stay exact.
    fn samples_for(&self, secs: f64) -> usize {
        (secs * f64::from(self.audio.sample_rate)).round() as usize
    }

    /// Wall-clock length of one chunk.
    pub fn chunk_duration(&self) -> Duration {
        Duration::from_secs_f64(self.audio.chunk_size as f64 / self.audio.sample_rate.max(1) as f64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = RecorderConfig::default();
        original.save_to(&path).expect("save");
        let loaded = RecorderConfig::load_from(&path).expect("load");

        assert_eq!(original, loaded);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = RecorderConfig::load_from(&path).expect("should not error");
        assert_eq!(config, RecorderConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[detection]\nsilence_threshold = 1500\n").expect("write");

        let cfg = RecorderConfig::load_from(&path).expect("load");
        assert_eq!(cfg.detection.silence_threshold, 1500);
        assert_eq!(cfg.detection.pre_roll_secs, 2.0);
        assert_eq!(cfg.audio, AudioConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[audio\nsample_rate = ").expect("write");
        assert!(RecorderConfig::load_from(&path).is_err());
    }

    #[test]
    fn default_values_match_recorder_constants() {
        let cfg = RecorderConfig::default();

        assert_eq!(cfg.detection.silence_threshold, 3000);
        assert_eq!(cfg.detection.record_after_silence_secs, 2.0);
        assert_eq!(cfg.detection.pre_roll_secs, 2.0);
        assert_eq!(cfg.detection.voice_min_duration_secs, 0.5);
        assert_eq!(cfg.audio.sample_rate, 44_100);
        assert_eq!(cfg.audio.chunk_size, 1024);
        assert_eq!(cfg.output.storage_dir, PathBuf::from("./records"));
        assert_eq!(cfg.output.pad_silence_secs, 0.5);
        assert_eq!(cfg.output.file_prefix, "tx_");
        assert!(cfg.validate().is_ok());
    }

    // ---- Derived values ----------------------------------------------------

    #[test]
    fn derived_chunk_counts() {
        let cfg = RecorderConfig::default();
        assert_eq!(cfg.pre_roll_chunks(), 86);
        assert_eq!(cfg.min_voice_chunks(), 22);
        assert_eq!(cfg.pad_samples(), 22_050);
        assert_eq!(cfg.silence_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn min_voice_chunks_floor_is_one() {
        let mut cfg = RecorderConfig::default();
        cfg.detection.voice_min_duration_secs = 0.0;
        assert_eq!(cfg.min_voice_chunks(), 1);
    }

    #[test]
    fn exact_chunk_multiples_are_not_rounded_up() {
        let mut cfg = RecorderConfig::default();
        cfg.detection.voice_min_duration_secs = 0.3;
        cfg.detection.pre_roll_secs = 0.3;
        cfg.audio.sample_rate = 16_000;
        cfg.audio.chunk_size = 480;
        assert_eq!(cfg.min_voice_chunks(), 10);
        assert_eq!(cfg.pre_roll_chunks(), 10);

        cfg.audio.sample_rate = 100;
        cfg.audio.chunk_size = 10;
        assert_eq!(cfg.min_voice_chunks(), 3);
        assert_eq!(cfg.pre_roll_chunks(), 3);

        cfg.detection.pre_roll_secs = 0.7;
        assert_eq!(cfg.pre_roll_chunks(), 7);
    }

    #[test]
    fn partial_chunks_still_round_up_for_onset() {
        let mut cfg = RecorderConfig::default();
        cfg.audio.sample_rate = 100;
        cfg.audio.chunk_size = 10;
        cfg.detection.voice_min_duration_secs = 0.31;
        assert_eq!(cfg.min_voice_chunks(), 4);
    }

    #[test]
    fn huge_durations_are_rejected_before_use() {
        let mut cfg = RecorderConfig::default();
        cfg.detection.record_after_silence_secs = 1e20;
        assert!(cfg.validate().is_err());
        // Still no panic if a caller skips validation.
        assert_eq!(cfg.silence_timeout(), Duration::MAX);

        let mut cfg = RecorderConfig::default();
        cfg.detection.pre_roll_secs = 1e20;
        assert!(cfg.validate().is_err());

        let mut cfg = RecorderConfig::default();
        cfg.detection.voice_min_duration_secs = MAX_DURATION_SECS;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_pre_roll_gives_zero_chunks() {
        let mut cfg = RecorderConfig::default();
        cfg.detection.pre_roll_secs = 0.0;
        assert_eq!(cfg.pre_roll_chunks(), 0);
    }

    // ---- Validation --------------------------------------------------------

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = RecorderConfig::default();
        cfg.audio.sample_rate = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = RecorderConfig::default();
        cfg.audio.chunk_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = RecorderConfig::default();
        cfg.detection.silence_threshold = 40_000;
        assert!(cfg.validate().is_err());

        let mut cfg = RecorderConfig::default();
        cfg.detection.pre_roll_secs = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = RecorderConfig::default();
        cfg.detection.record_after_silence_secs = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = RecorderConfig::default();
        cfg.output.pad_silence_secs = MAX_DURATION_SECS + 1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = RecorderConfig::default();
        cfg.output.file_prefix = "a/b".into();
        assert!(cfg.validate().is_err());
    }
}
