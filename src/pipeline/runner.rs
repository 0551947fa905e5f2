//! Recorder loop: pulls chunks from a source, drives the capture pipeline
//! and hands finished recordings to the sink.
//!
//! # Error policy
//!
//! ```text
//! read_chunk() ──Ok──────────────▶ CapturePipeline::push ─▶ observer / sink
//!              ──transient───────▶ counted, skipped (state kept)
//!              ──EndOfStream─────▶ flush, stop
//!              ──other───────────▶ flush in-progress recording,
//!                                  reopen with exponential back-off
//! sink.emit()  ──Err─────────────▶ logged, counted, loop continues
//! shutdown flag set ─────────────▶ flush, stop
//! ```
//!
//! The loop is single-threaded and blocking; the only concurrency is the
//! shutdown flag, which a signal handler may set at any time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::{ChunkSource, SourceError};
use crate::output::{Utterance, UtteranceSink};

use super::clock::Clock;
use super::machine::CapturePipeline;
use super::observer::StatusObserver;

/// Longest single sleep while backing off, so shutdown stays responsive.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// ReconnectPolicy
// ---------------------------------------------------------------------------

/// Exponential back-off between attempts to reopen a failed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(10),
        }
    }
}

impl ReconnectPolicy {
    /// Delay after `delay`, doubled and capped at `max`.
    pub fn next(&self, delay: Duration) -> Duration {
        delay.saturating_mul(2).min(self.max)
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub chunks: u64,
    pub utterances_written: u64,
    pub write_failures: u64,
    pub transient_errors: u64,
    pub source_failures: u64,
    pub reconnects: u64,
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Owns the pipeline plus everything around it.
pub struct Recorder<K, O, C> {
    pipeline: CapturePipeline,
    sink: K,
    observer: O,
    clock: C,
    shutdown: Arc<AtomicBool>,
    reconnect: ReconnectPolicy,
}

impl<K, O, C> Recorder<K, O, C>
where
    K: UtteranceSink,
    O: StatusObserver,
    C: Clock,
{
    pub fn new(
        pipeline: CapturePipeline,
        sink: K,
        observer: O,
        clock: C,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            pipeline,
            sink,
            observer,
            clock,
            shutdown,
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn pipeline(&self) -> &CapturePipeline {
        &self.pipeline
    }

    fn stopping(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Run until shutdown is requested or the source reports
    /// [`SourceError::EndOfStream`].
    ///
    /// `reopen` is called after an unrecoverable source error; returning
    /// `Err(SourceError::EndOfStream)` from it stops the loop instead of
    /// retrying.
    pub fn run<S, F>(&mut self, source: S, mut reopen: F) -> RunSummary
    where
        S: ChunkSource,
        F: FnMut() -> Result<S, SourceError>,
    {
        let mut summary = RunSummary::default();
        let mut source = Some(source);
        let mut delay = self.reconnect.initial;

        while !self.stopping() {
            let Some(active) = source.as_mut() else {
                match reopen() {
                    Ok(fresh) => {
                        log::info!("audio source reopened");
                        summary.reconnects += 1;
                        delay = self.reconnect.initial;
                        source = Some(fresh);
                    }
                    Err(SourceError::EndOfStream) => {
                        log::info!("audio source cannot be reopened; stopping");
                        break;
                    }
                    Err(e) => {
                        log::warn!("reopening audio source failed: {e}; retrying in {delay:?}");
                        self.sleep(delay);
                        delay = self.reconnect.next(delay);
                    }
                }
                continue;
            };

            match active.read_chunk() {
                Ok(chunk) => {
                    summary.chunks += 1;
                    let now = self.clock.now();
                    let outcome = self.pipeline.push(chunk, now);
                    self.observer.on_chunk(&outcome.status);
                    if let Some(utterance) = outcome.utterance {
                        self.deliver(&utterance, &mut summary);
                    }
                }
                Err(SourceError::EndOfStream) => {
                    log::info!("end of input");
                    break;
                }
                Err(e) if e.is_transient() => {
                    summary.transient_errors += 1;
                    match e {
                        SourceError::Stalled(_) => log::debug!("{e}"),
                        _ => log::warn!("{e}"),
                    }
                }
                Err(e) => {
                    summary.source_failures += 1;
                    log::error!("audio source failed: {e}");
                    // Release the device before trying to reopen it.
                    source = None;
                    self.flush(&mut summary);
                    delay = self.reconnect.initial;
                }
            }
        }

        self.flush(&mut summary);
        log::debug!("recorder loop finished: {summary:?}");
        summary
    }

    fn flush(&mut self, summary: &mut RunSummary) {
        let now = self.clock.now();
        if let Some(utterance) = self.pipeline.flush(now) {
            log::info!("writing partial recording");
            self.deliver(&utterance, summary);
        }
    }

    fn deliver(&mut self, utterance: &Utterance, summary: &mut RunSummary) {
        match self.sink.emit(utterance) {
            Ok(()) => {
                summary.utterances_written += 1;
                self.observer.on_utterance(utterance);
                log::info!(
                    "recording finished. Record duration {:.1} seconds ({:.1} s written). File: {}",
                    utterance.recorded_for.as_secs_f32(),
                    utterance.duration_secs(),
                    utterance.path.display()
                );
            }
            Err(e) => {
                summary.write_failures += 1;
                log::error!("failed to write {}: {e}", utterance.path.display());
            }
        }
    }

    /// Sleep for `total`, waking early if shutdown is requested.
    fn sleep(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while !self.stopping() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            std::thread::sleep(left.min(SLEEP_SLICE));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::path::PathBuf;

    use super::*;
    use crate::audio::Chunk;
    use crate::config::RecorderConfig;
    use crate::output::SinkError;
    use crate::pipeline::clock::{SteppingClock, Timestamp};
    use crate::pipeline::observer::NullObserver;

    const CHUNK: usize = 80;

    fn config() -> RecorderConfig {
        let mut cfg = RecorderConfig::default();
        cfg.audio.sample_rate = 8_000;
        cfg.audio.chunk_size = CHUNK;
        cfg.detection.pre_roll_secs = 0.05;
        cfg.detection.voice_min_duration_secs = 0.03;
        cfg.detection.record_after_silence_secs = 0.1;
        cfg.output.pad_silence_secs = 0.0;
        cfg.output.storage_dir = PathBuf::from("unused");
        cfg
    }

    struct Script(VecDeque<Result<Chunk, SourceError>>);

    impl Script {
        fn new() -> Self {
            Self(VecDeque::new())
        }

        fn chunks(mut self, value: i16, n: usize) -> Self {
            for _ in 0..n {
                self.0.push_back(Ok(Chunk::filled(value, CHUNK)));
            }
            self
        }

        fn error(mut self, e: SourceError) -> Self {
            self.0.push_back(Err(e));
            self
        }
    }

    impl ChunkSource for Script {
        fn read_chunk(&mut self) -> Result<Chunk, SourceError> {
            self.0.pop_front().unwrap_or(Err(SourceError::EndOfStream))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        written: Vec<Utterance>,
        fail: bool,
    }

    impl UtteranceSink for MemorySink {
        fn emit(&mut self, utterance: &Utterance) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Io(std::io::Error::other("disk full")));
            }
            self.written.push(utterance.clone());
            Ok(())
        }
    }

    fn recorder(sink: MemorySink) -> Recorder<MemorySink, NullObserver, SteppingClock> {
        Recorder::new(
            CapturePipeline::new(&config()),
            sink,
            NullObserver,
            SteppingClock::new(Timestamp::now(), Duration::from_millis(10)),
            Arc::new(AtomicBool::new(false)),
        )
        .with_reconnect(ReconnectPolicy {
            initial: Duration::from_millis(1),
            max: Duration::from_millis(2),
        })
    }

    fn no_reopen() -> Result<Script, SourceError> {
        Err(SourceError::EndOfStream)
    }

    #[test]
    fn backoff_doubles_up_to_max() {
        let p = ReconnectPolicy::default();
        assert_eq!(p.next(Duration::from_millis(500)), Duration::from_secs(1));
        assert_eq!(p.next(Duration::from_secs(8)), Duration::from_secs(10));
    }

    #[test]
    fn one_burst_writes_one_file() {
        let mut rec = recorder(MemorySink::default());
        let script = Script::new().chunks(0, 10).chunks(10_000, 5).chunks(0, 20);
        let summary = rec.run(script, no_reopen);
        assert_eq!(summary.chunks, 35);
        assert_eq!(summary.utterances_written, 1);
        assert_eq!(rec.sink().written[0].samples.len(), 5 * CHUNK);
    }

    #[test]
    fn transient_errors_keep_recording_state() {
        let mut rec = recorder(MemorySink::default());
        let script = Script::new()
            .chunks(10_000, 2)
            .error(SourceError::Overrun { dropped: 1 })
            .error(SourceError::Stalled(Duration::from_millis(250)))
            .chunks(10_000, 1)
            .chunks(0, 20);
        let summary = rec.run(script, no_reopen);
        assert_eq!(summary.transient_errors, 2);
        assert_eq!(summary.utterances_written, 1);
    }

    #[test]
    fn source_failure_flushes_then_reopens() {
        let mut rec = recorder(MemorySink::default());
        let first = Script::new()
            .chunks(10_000, 4)
            .error(SourceError::Disconnected("unplugged".into()));
        let mut attempts = 0;
        let summary = rec.run(first, || {
            attempts += 1;
            match attempts {
                1 => Err(SourceError::NoDevice),
                2 => Ok(Script::new().chunks(10_000, 3).chunks(0, 20)),
                _ => Err(SourceError::EndOfStream),
            }
        });
        assert_eq!(summary.source_failures, 1);
        assert_eq!(summary.reconnects, 1);
        assert_eq!(summary.utterances_written, 2);
        assert_eq!(rec.sink().written[0].samples.len(), 4 * CHUNK);
    }

    #[test]
    fn sink_failure_is_not_fatal() {
        let mut rec = recorder(MemorySink {
            fail: true,
            ..Default::default()
        });
        let script = Script::new()
            .chunks(10_000, 3)
            .chunks(0, 20)
            .chunks(10_000, 3)
            .chunks(0, 20);
        let summary = rec.run(script, no_reopen);
        assert_eq!(summary.write_failures, 2);
        assert_eq!(summary.utterances_written, 0);
        assert_eq!(summary.chunks, 46);
    }

    #[test]
    fn end_of_input_flushes_recording() {
        let mut rec = recorder(MemorySink::default());
        let summary = rec.run(Script::new().chunks(10_000, 6), no_reopen);
        assert_eq!(summary.utterances_written, 1);
        assert_eq!(rec.sink().written[0].samples.len(), 6 * CHUNK);
    }

    #[test]
    fn shutdown_before_start_reads_nothing() {
        let mut rec = recorder(MemorySink::default());
        rec.shutdown.store(true, Ordering::SeqCst);
        let summary = rec.run(Script::new().chunks(10_000, 6), no_reopen);
        assert_eq!(summary, RunSummary::default());
    }
}
