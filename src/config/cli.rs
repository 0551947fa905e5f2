//! Command-line options.
//!
//! Flags override the corresponding `settings.toml` values; anything left
//! unset keeps the file (or default) value.

use std::path::PathBuf;

use clap::Parser;

use super::RecorderConfig;

/// CLI options for the recorder.
#[derive(Debug, Parser, Clone, Default)]
#[command(
    name = "vox-recorder",
    about = "Waits for sound on the microphone, records it, saves each burst as a WAV file",
    version
)]
pub struct CliArgs {
    /// Settings file to load instead of the platform default
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory that receives the WAV files
    #[arg(long, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Peak amplitude a chunk must exceed to count as sound (0-32767)
    #[arg(long)]
    pub threshold: Option<u16>,

    /// Seconds of continuous silence that end a recording
    #[arg(long)]
    pub silence_secs: Option<f64>,

    /// Seconds of audio kept from before the sound started
    #[arg(long)]
    pub pre_roll_secs: Option<f64>,

    /// Seconds of sustained sound required before recording starts
    #[arg(long)]
    pub min_voice_secs: Option<f64>,

    /// Recording sample rate in Hz
    #[arg(long)]
    pub rate: Option<u32>,

    /// Samples per detection chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Input device name (see --list-devices)
    #[arg(long)]
    pub device: Option<String>,

    /// Create the storage directory if it does not exist
    #[arg(long, default_value_t = false)]
    pub create_dir: bool,

    /// Disable the terminal VU meter / status line
    #[arg(long, default_value_t = false)]
    pub no_status: bool,

    /// Print available input devices and exit
    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    /// Write the effective settings to the settings file and exit
    #[arg(long, default_value_t = false)]
    pub write_config: bool,

    /// Run detection over a WAV file instead of the microphone
    #[arg(long, value_name = "WAV")]
    pub replay: Option<PathBuf>,
}

impl CliArgs {
    /// Apply every flag that was given on top of `config`.
    pub fn apply_to(&self, config: &mut RecorderConfig) {
        if let Some(dir) = &self.storage_dir {
            config.output.storage_dir = dir.clone();
        }
        if let Some(threshold) = self.threshold {
            config.detection.silence_threshold = threshold;
        }
        if let Some(secs) = self.silence_secs {
            config.detection.record_after_silence_secs = secs;
        }
        if let Some(secs) = self.pre_roll_secs {
            config.detection.pre_roll_secs = secs;
        }
        if let Some(secs) = self.min_voice_secs {
            config.detection.voice_min_duration_secs = secs;
        }
        if let Some(rate) = self.rate {
            config.audio.sample_rate = rate;
        }
        if let Some(size) = self.chunk_size {
            config.audio.chunk_size = size;
        }
        if let Some(device) = &self.device {
            config.audio.device = Some(device.clone());
        }
        if self.no_status {
            config.status.enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_leaves_config_untouched() {
        let args = CliArgs::try_parse_from(["vox-recorder"]).expect("parse");
        let mut cfg = RecorderConfig::default();
        args.apply_to(&mut cfg);
        assert_eq!(cfg, RecorderConfig::default());
    }

    #[test]
    fn flags_override_settings() {
        let args = CliArgs::try_parse_from([
            "vox-recorder",
            "--storage-dir",
            "/tmp/out",
            "--threshold",
            "1200",
            "--silence-secs",
            "1.5",
            "--rate",
            "16000",
            "--chunk-size",
            "512",
            "--device",
            "USB Mic",
            "--no-status",
        ])
        .expect("parse");
        let mut cfg = RecorderConfig::default();
        args.apply_to(&mut cfg);

        assert_eq!(cfg.output.storage_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cfg.detection.silence_threshold, 1200);
        assert_eq!(cfg.detection.record_after_silence_secs, 1.5);
        assert_eq!(cfg.audio.sample_rate, 16_000);
        assert_eq!(cfg.audio.chunk_size, 512);
        assert_eq!(cfg.audio.device.as_deref(), Some("USB Mic"));
        assert!(!cfg.status.enabled);
    }

    #[test]
    fn threshold_out_of_u16_range_is_rejected() {
        assert!(CliArgs::try_parse_from(["vox-recorder", "--threshold", "70000"]).is_err());
    }

    #[test]
    fn mode_flags_parse() {
        let args = CliArgs::try_parse_from([
            "vox-recorder",
            "--list-devices",
            "--replay",
            "in.wav",
            "--create-dir",
        ])
        .expect("parse");
        assert!(args.list_devices);
        assert!(args.create_dir);
        assert_eq!(args.replay, Some(PathBuf::from("in.wav")));
    }
}
