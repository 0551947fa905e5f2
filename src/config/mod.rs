//! Configuration module for the voice-activated recorder.
//!
//! Provides [`RecorderConfig`] (top-level settings), its per-concern
//! sub-configs, [`AppPaths`] for the platform config directory, TOML
//! persistence via [`RecorderConfig::load_from`] / [`RecorderConfig::save_to`],
//! and [`CliArgs`] for command-line overrides.

pub mod cli;
pub mod paths;
pub mod settings;

pub use cli::CliArgs;
pub use paths::AppPaths;
pub use settings::{AudioConfig, DetectionConfig, OutputConfig, RecorderConfig, StatusConfig};
