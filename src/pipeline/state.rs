//! Capture state machine states.

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// States of the capture pipeline.
///
/// ```text
/// Waiting ──onset confirmed──▶ Recording
///    ▲                            │
///    └──silence timeout / flush───┘   (utterance emitted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Listening; recent chunks go to the pre-roll buffer.
    #[default]
    Waiting,

    /// Onset confirmed; chunks accumulate into the recording.
    Recording,
}

impl PipelineState {
    pub fn is_recording(&self) -> bool {
        matches!(self, PipelineState::Recording)
    }

    /// Status-line text.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Waiting => "Waiting Audio Level",
            PipelineState::Recording => "Recording in progress",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
