//! Text VU meter for the terminal status line.
//!
//! [`VuMeter::render`] maps a chunk's peak amplitude onto a fixed-width bar
//! of `█` cells and overlays a `|` marker where the detection threshold
//! sits, so it is easy to see how close the input is to triggering.
//!
//! # Example
//!
//! ```rust
//! use vox_recorder::audio::VuMeter;
//!
//! let meter = VuMeter::new(10);
//! let bar = meter.render(32_767, 6_554);
//! assert_eq!(bar.chars().count(), 10);
//! assert_eq!(bar, "██|███████");
//! ```

use super::samples::FULL_SCALE;

/// Fixed-width peak meter.
#[derive(Debug, Clone, Copy)]
pub struct VuMeter {
    width: usize,
}

impl Default for VuMeter {
    fn default() -> Self {
        Self { width: 30 }
    }
}

impl VuMeter {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of filled cells for `peak`, clamped to `width`.
    pub fn level(&self, peak: u16) -> usize {
        self.cells(peak).min(self.width)
    }

    /// Render the bar for `peak`, marking `threshold` with `|`.
    ///
    /// The marker is omitted when the threshold maps past the last cell.
    pub fn render(&self, peak: u16, threshold: u16) -> String {
        let level = self.level(peak);
        let marker = self.cells(threshold);

        (0..self.width)
            .map(|i| {
                if i == marker {
                    '|'
                } else if i < level {
                    '█'
                } else {
                    ' '
                }
            })
            .collect()
    }

    fn cells(&self, amplitude: u16) -> usize {
        usize::from(amplitude) * self.width / usize::from(FULL_SCALE as u16)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
