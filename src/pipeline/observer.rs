//! Per-chunk status reporting.
//!
//! The runner calls a [`StatusObserver`] after every chunk and after every
//! written recording.  [`TerminalStatus`] rewrites a single terminal line
//! with a VU meter, the current state and (while recording) the file name
//! and elapsed time.  [`NullObserver`] discards everything.

use std::io::Write;
use std::time::{Duration, Instant};

use crossterm::terminal::size as terminal_size;

use crate::audio::VuMeter;
use crate::output::Utterance;

use super::machine::ChunkStatus;
use super::state::PipelineState;

/// Half-period of the "sound present" blink while waiting.
const BLINK_PERIOD: Duration = Duration::from_millis(500);

/// Used when the terminal width cannot be queried (e.g. output is piped).
const FALLBACK_WIDTH: usize = 80;

// ---------------------------------------------------------------------------
// StatusObserver
// ---------------------------------------------------------------------------

/// Receives progress from the recorder loop.
pub trait StatusObserver {
    fn on_chunk(&mut self, status: &ChunkStatus);

    /// Called after an utterance has been written successfully.
    fn on_utterance(&mut self, _utterance: &Utterance) {}
}

impl<T: StatusObserver + ?Sized> StatusObserver for &mut T {
    fn on_chunk(&mut self, status: &ChunkStatus) {
        (**self).on_chunk(status);
    }

    fn on_utterance(&mut self, utterance: &Utterance) {
        (**self).on_utterance(utterance);
    }
}

/// Observer that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl StatusObserver for NullObserver {
    fn on_chunk(&mut self, _status: &ChunkStatus) {}
}

// ---------------------------------------------------------------------------
// Line rendering
// ---------------------------------------------------------------------------

/// Render the status text for one chunk, without padding.
///
/// `blink_on` selects the visible phase of the waiting-state indicator,
/// which only lights up when the chunk carries any signal at all.
pub fn render_line(status: &ChunkStatus, meter: &VuMeter, blink_on: bool) -> String {
    let bar = meter.render(status.peak, status.threshold);
    let indicator = match status.state {
        PipelineState::Recording => '⏺',
        PipelineState::Waiting if blink_on && status.peak > 0 => '⏸',
        PipelineState::Waiting => ' ',
    };

    let mut line = format!("VU: [{bar}] | {indicator} {}", status.state.label());
    if status.state.is_recording() {
        if let Some(name) = &status.file_name {
            line.push_str(&format!(" | File: {name}"));
        }
        if let Some(elapsed) = status.elapsed {
            line.push_str(&format!(" | Time: {:.1}s", elapsed.as_secs_f32()));
        }
    }
    line
}

/// Pad `line` with spaces to `width` characters so a shorter line fully
/// overwrites a longer previous one.
fn pad_to_width(mut line: String, width: usize) -> String {
    let len = line.chars().count();
    if len < width {
        line.extend(std::iter::repeat(' ').take(width - len));
    }
    line
}

// ---------------------------------------------------------------------------
// TerminalStatus
// ---------------------------------------------------------------------------

/// Single-line `\r` status display.
pub struct TerminalStatus<W: Write> {
    out: W,
    meter: VuMeter,
    epoch: Instant,
    dirty: bool,
}

impl TerminalStatus<std::io::Stdout> {
    pub fn stdout(meter_width: usize) -> Self {
        Self::new(std::io::stdout(), meter_width)
    }
}

impl<W: Write> TerminalStatus<W> {
    pub fn new(out: W, meter_width: usize) -> Self {
        Self {
            out,
            meter: VuMeter::new(meter_width),
            epoch: Instant::now(),
            dirty: false,
        }
    }

    fn blink_on(&self) -> bool {
        (self.epoch.elapsed().as_millis() / BLINK_PERIOD.as_millis()) % 2 == 1
    }

    fn width() -> usize {
        terminal_size()
            .map(|(cols, _)| usize::from(cols))
            .unwrap_or(FALLBACK_WIDTH)
    }

    /// Move past the status line so the next log line starts clean.
    fn break_line(&mut self) {
        if self.dirty {
            let _ = writeln!(self.out);
            self.dirty = false;
        }
    }
}

impl<W: Write> StatusObserver for TerminalStatus<W> {
    fn on_chunk(&mut self, status: &ChunkStatus) {
        let line = render_line(status, &self.meter, self.blink_on());
        let line = pad_to_width(line, Self::width().saturating_sub(1));
        // Terminal write failures are not worth stopping the recorder for.
        let _ = write!(self.out, "\r{line}");
        let _ = self.out.flush();
        self.dirty = true;
    }

    fn on_utterance(&mut self, _utterance: &Utterance) {
        self.break_line();
    }
}

impl<W: Write> Drop for TerminalStatus<W> {
    fn drop(&mut self) {
        self.break_line();
        let _ = self.out.flush();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting(peak: u16) -> ChunkStatus {
        ChunkStatus {
            peak,
            threshold: 3000,
            state: PipelineState::Waiting,
            elapsed: None,
            file_name: None,
        }
    }

    fn recording() -> ChunkStatus {
        ChunkStatus {
            peak: 32_767,
            threshold: 3000,
            state: PipelineState::Recording,
            elapsed: Some(Duration::from_millis(3_250)),
            file_name: Some("tx_20250307090501.wav".into()),
        }
    }

    #[test]
    fn waiting_line_has_meter_and_label() {
        let line = render_line(&waiting(0), &VuMeter::new(10), false);
        assert_eq!(line, "VU: [|         ] |   Waiting Audio Level");
    }

    #[test]
    fn waiting_indicator_blinks_only_with_signal() {
        let meter = VuMeter::new(10);
        assert!(render_line(&waiting(50), &meter, true).contains('⏸'));
        assert!(!render_line(&waiting(50), &meter, false).contains('⏸'));
        assert!(!render_line(&waiting(0), &meter, true).contains('⏸'));
    }

    #[test]
    fn recording_line_shows_file_and_time() {
        let line = render_line(&recording(), &VuMeter::new(10), false);
        assert!(line.starts_with("VU: [|█████████] | ⏺ Recording in progress"));
        assert!(line.contains("File: tx_20250307090501.wav"));
        assert!(line.ends_with("Time: 3.2s") || line.ends_with("Time: 3.3s"));
    }

    #[test]
    fn padding_reaches_width() {
        assert_eq!(pad_to_width("ab".into(), 5), "ab   ");
        assert_eq!(pad_to_width("abcdef".into(), 3), "abcdef");
    }

    #[test]
    fn terminal_status_rewrites_one_line_and_ends_it_on_drop() {
        let mut buf = Vec::new();
        {
            let mut status = TerminalStatus::new(&mut buf, 10);
            status.on_chunk(&waiting(0));
            status.on_chunk(&recording());
        }
        let out = String::from_utf8(buf).expect("utf8");
        assert_eq!(out.matches('\r').count(), 2);
        assert_eq!(out.matches('\n').count(), 1);
        assert!(out.ends_with('\n'));
    }
}
