//! Voice-activated recorder.
//!
//! Listens on an audio input, waits for sound above a threshold, records
//! it (including a little audio from just before it started) until the
//! input has been quiet for a while, then normalises, trims, pads and
//! saves each burst as a timestamped WAV file.
//!
//! | Module       | Role                                                   |
//! |--------------|--------------------------------------------------------|
//! | [`audio`]    | chunks, detection, transforms, cpal / WAV sources      |
//! | [`config`]   | `settings.toml`, CLI overrides, derived chunk counts   |
//! | [`output`]   | utterances, WAV sink, storage directory checks         |
//! | [`pipeline`] | capture state machine and the recorder loop            |
//! | [`signal`]   | Ctrl-C / SIGTERM → graceful shutdown flag              |

pub mod audio;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod signal;
