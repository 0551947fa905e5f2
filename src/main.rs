//! Application entry point: vox-recorder.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the command line; `--list-devices` exits here.
//! 3. Load [`RecorderConfig`] (defaults if the file is missing), apply CLI
//!    overrides and validate.  `--write-config` saves and exits here.
//! 4. Check the storage directory; failure is fatal.
//! 5. Install the Ctrl-C / SIGTERM handler.
//! 6. Open the microphone (or the `--replay` file); failure is fatal.
//! 7. Run the [`Recorder`] loop until shutdown or end of input.

use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use vox_recorder::{
    audio::{list_input_devices, CpalSource, SourceError, WavFileSource},
    config::{AppPaths, CliArgs, RecorderConfig},
    output::{ensure_storage_dir, WavSink},
    pipeline::{
        CapturePipeline, NullObserver, Recorder, RunSummary, StatusObserver, SteppingClock,
        SystemClock, TerminalStatus, Timestamp,
    },
    signal::install_shutdown_handler,
};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(CliArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    log::info!(
        "vox-recorder v{} started. Hit ctrl-c to quit.",
        env!("CARGO_PKG_VERSION")
    );

    if args.list_devices {
        let devices = list_input_devices().context("failed to list input devices")?;
        if devices.is_empty() {
            println!("no input devices found");
        }
        for name in devices {
            println!("{name}");
        }
        return Ok(());
    }

    let settings_path = args
        .config
        .clone()
        .unwrap_or_else(|| AppPaths::new().settings_file);
    let mut config = RecorderConfig::load_from(&settings_path)
        .with_context(|| format!("failed to load {}", settings_path.display()))?;
    args.apply_to(&mut config);
    config.validate().context("invalid configuration")?;

    if args.write_config {
        config
            .save_to(&settings_path)
            .with_context(|| format!("failed to write {}", settings_path.display()))?;
        println!("settings written to {}", settings_path.display());
        return Ok(());
    }

    ensure_storage_dir(&config.output.storage_dir, args.create_dir)?;

    log::info!(
        "threshold {} | silence {:.1}s | pre-roll {} chunks | onset after {} chunks | output {}",
        config.detection.silence_threshold,
        config.detection.record_after_silence_secs,
        config.pre_roll_chunks(),
        config.min_voice_chunks(),
        config.output.storage_dir.display(),
    );

    let shutdown = install_shutdown_handler()?;

    let summary = match &args.replay {
        Some(path) => replay(&config, path, shutdown)?,
        None => {
            let source =
                CpalSource::open(&config.audio).context("failed to open audio input")?;
            log::info!("listening on {:?}", source.device_name());
            if config.status.enabled {
                let observer = TerminalStatus::stdout(config.status.meter_width);
                record(&config, source, observer, shutdown)
            } else {
                record(&config, source, NullObserver, shutdown)
            }
        }
    };

    log::info!(
        "{} recording(s) written, {} write failure(s), {} source failure(s), {} reconnect(s)",
        summary.utterances_written,
        summary.write_failures,
        summary.source_failures,
        summary.reconnects,
    );
    log::info!("Good bye.");
    Ok(())
}

/// Live capture with automatic reopen of the device after a failure.
fn record<O: StatusObserver>(
    config: &RecorderConfig,
    source: CpalSource,
    observer: O,
    shutdown: Arc<AtomicBool>,
) -> RunSummary {
    let mut recorder = Recorder::new(
        CapturePipeline::new(config),
        WavSink::new(),
        observer,
        SystemClock,
        shutdown,
    );
    recorder.run(source, || CpalSource::open(&config.audio))
}

/// Offline detection over a WAV file, timed by audio position.
fn replay(
    config: &RecorderConfig,
    path: &std::path::Path,
    shutdown: Arc<AtomicBool>,
) -> Result<RunSummary> {
    let source = WavFileSource::open(path, &config.audio)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let clock = SteppingClock::new(Timestamp::now(), config.chunk_duration());
    let mut recorder = Recorder::new(
        CapturePipeline::new(config),
        WavSink::new(),
        NullObserver,
        clock,
        shutdown,
    );
    Ok(recorder.run(source, || Err(SourceError::EndOfStream)))
}
