//! Conversion from device-native audio to the recorder's sample format.
//!
//! Capture devices deliver interleaved `f32` at whatever rate they prefer.
//! The recorder works on **mono `i16` at the configured rate**, so each
//! callback buffer goes through:
//!
//! 1. [`downmix_to_mono`]: average interleaved channels.
//! 2. [`StreamResampler`]: cubic rate conversion with `rubato`,
//!    carrying state across callbacks.
//! 3. [`f32_to_i16`]: scale `[-1.0, 1.0]` to the 16-bit range.

use rubato::{FastFixedIn, PolynomialDegree, Resampler, ResamplerConstructionError};

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// * `channels == 1` returns the input unchanged.
/// * `channels == 0` returns an empty vector.
///
/// ```rust
/// use vox_recorder::audio::downmix_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4];
/// let mono = downmix_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// StreamResampler
// ---------------------------------------------------------------------------

/// Input frames handed to rubato per call.
pub const RESAMPLE_BLOCK: usize = 1024;

/// Stateful mono rate converter for a continuous stream.
///
/// Input is accumulated until a full block is available, so the filter state
/// and any leftover samples carry over from one [`process`](Self::process)
/// call to the next and block boundaries are inaudible.  Equal rates make it
/// a passthrough with no rubato session at all.
pub struct StreamResampler {
    /// `None` in passthrough mode.
    resampler: Option<FastFixedIn<f32>>,
    pending: Vec<f32>,
    block: usize,
    output_buf: Vec<Vec<f32>>,
    ratio: f64,
    /// Leading output frames that are filter delay, not signal.
    skip: usize,
    frames_in: u64,
    frames_out: u64,
}

impl StreamResampler {
    pub fn new(
        source_rate: u32,
        target_rate: u32,
        block: usize,
    ) -> Result<Self, ResamplerConstructionError> {
        if source_rate == target_rate {
            return Ok(Self {
                resampler: None,
                pending: Vec::new(),
                block,
                output_buf: Vec::new(),
                ratio: 1.0,
                skip: 0,
                frames_in: 0,
                frames_out: 0,
            });
        }

        let ratio = f64::from(target_rate) / f64::from(source_rate);
        // Fixed ratio, mono.
        let resampler = FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Cubic, block, 1)?;
        let output_buf = vec![vec![0.0; resampler.output_frames_max()]; 1];
        let skip = resampler.output_delay();

        log::debug!("resampling {source_rate} Hz → {target_rate} Hz in {block}-frame blocks");

        Ok(Self {
            resampler: Some(resampler),
            pending: Vec::with_capacity(block * 2),
            block,
            output_buf,
            ratio,
            skip,
            frames_in: 0,
            frames_out: 0,
        })
    }

    pub fn is_passthrough(&self) -> bool {
        self.resampler.is_none()
    }

    /// Feed `samples` and return whatever output is ready (may be empty).
    pub fn process(&mut self, samples: &[f32]) -> Vec<f32> {
        let Some(resampler) = self.resampler.as_mut() else {
            return samples.to_vec();
        };

        self.frames_in += samples.len() as u64;
        self.pending.extend_from_slice(samples);

        let mut out = Vec::new();
        let mut offset = 0;
        while self.pending.len() - offset >= self.block {
            let input = &self.pending[offset..offset + self.block];
            match resampler.process_into_buffer(&[input], &mut self.output_buf, None) {
                Ok((consumed, produced)) => {
                    offset += consumed;
                    emit(
                        &self.output_buf[0][..produced],
                        &mut self.skip,
                        &mut self.frames_out,
                        &mut out,
                    );
                }
                Err(e) => {
                    log::error!("resampler failed, dropping {} frames: {e}", self.block);
                    offset += self.block;
                }
            }
        }
        self.pending.drain(..offset);
        out
    }

    /// Flush the held tail at end of input.
    ///
    /// The total output over the stream's lifetime is
    /// `round(frames_in * target_rate / source_rate)`.
    pub fn finish(&mut self) -> Vec<f32> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Vec::new();
        };

        let expected = (self.frames_in as f64 * self.ratio).round() as u64;
        let mut out = Vec::new();

        let tail = std::mem::take(&mut self.pending);
        let tail_block = [tail.as_slice()];
        let mut wave_in: Option<&[&[f32]]> = Some(&tail_block);
        while self.frames_out < expected {
            match resampler.process_partial_into_buffer(wave_in, &mut self.output_buf, None) {
                Ok((_, 0)) => break,
                Ok((_, produced)) => {
                    emit(
                        &self.output_buf[0][..produced],
                        &mut self.skip,
                        &mut self.frames_out,
                        &mut out,
                    );
                }
                Err(e) => {
                    log::error!("resampler failed while flushing: {e}");
                    break;
                }
            }
            // Past the tail, rubato pads with silence to push out the delay.
            wave_in = None;
        }

        let excess = self.frames_out.saturating_sub(expected) as usize;
        out.truncate(out.len().saturating_sub(excess));
        self.frames_out = self.frames_out.min(expected);
        out
    }
}

/// Append `produced` to `out`, first dropping any remaining filter delay.
fn emit(produced: &[f32], skip: &mut usize, frames_out: &mut u64, out: &mut Vec<f32>) {
    let delayed = (*skip).min(produced.len());
    *skip -= delayed;
    let signal = &produced[delayed..];
    *frames_out += signal.len() as u64;
    out.extend_from_slice(signal);
}

// ---------------------------------------------------------------------------
// f32_to_i16
// ---------------------------------------------------------------------------

/// Convert normalised float samples to 16-bit PCM, clamping out-of-range
/// input.
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- downmix_to_mono ---------------------------------------------------

    #[test]
    fn downmix_already_mono() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&input, 1), input);
    }

    #[test]
    fn downmix_two_channel() {
        let out = downmix_to_mono(&[1.0_f32, -1.0, 0.5, 0.5], 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_zero_channels() {
        assert!(downmix_to_mono(&[1.0_f32, 2.0], 0).is_empty());
    }

    // ---- StreamResampler ---------------------------------------------------

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i % 200) as f32 / 200.0 - 0.5).collect()
    }

    #[test]
    fn equal_rates_pass_through() {
        let mut r = StreamResampler::new(44_100, 44_100, RESAMPLE_BLOCK).expect("resampler");
        assert!(r.is_passthrough());
        let input = ramp(160);
        assert_eq!(r.process(&input), input);
        assert!(r.finish().is_empty());
    }

    #[test]
    fn partial_block_is_held_for_the_next_call() {
        let mut r = StreamResampler::new(48_000, 16_000, 480).expect("resampler");
        assert!(!r.is_passthrough());
        assert!(r.process(&[0.25; 300]).is_empty());
        // Completing the block releases output.
        assert!(!r.process(&[0.25; 300]).is_empty());
    }

    #[test]
    fn callback_sized_blocks_do_not_drift() {
        let mut r = StreamResampler::new(48_000, 44_100, RESAMPLE_BLOCK).expect("resampler");
        let mut total = 0;
        for n in 0..93 {
            total += r.process(&ramp(512 + n % 2)).len();
            // Never ahead of the ideal output count for what has gone in.
            let frames_in = (n + 1) * 512 + (n + 1) / 2;
            assert!(total as f64 <= frames_in as f64 * 44_100.0 / 48_000.0 + 1.0);
        }
        total += r.finish().len();
        let frames_in = 93 * 512 + 46;
        let expected = (frames_in as f64 * 44_100.0 / 48_000.0).round() as usize;
        assert_eq!(total, expected);
    }

    #[test]
    fn split_input_matches_single_pass() {
        let input = ramp(4_096);

        let mut whole = StreamResampler::new(48_000, 44_100, RESAMPLE_BLOCK).expect("resampler");
        let mut one_pass = whole.process(&input);
        one_pass.extend(whole.finish());

        let mut split = StreamResampler::new(48_000, 44_100, RESAMPLE_BLOCK).expect("resampler");
        let mut halves = split.process(&input[..1_000]);
        halves.extend(split.process(&input[1_000..]));
        halves.extend(split.finish());

        assert_eq!(one_pass.len(), 3_763);
        assert_eq!(halves, one_pass);
    }

    #[test]
    fn constant_signal_keeps_amplitude() {
        let mut r = StreamResampler::new(48_000, 44_100, RESAMPLE_BLOCK).expect("resampler");
        let mut out = r.process(&[0.5; 9_600]);
        out.extend(r.finish());
        assert_eq!(out.len(), 8_820);
        for &s in &out[64..out.len() - 64] {
            assert!((s - 0.5).abs() < 1e-3, "amplitude drift: {s}");
        }
    }

    // ---- f32_to_i16 --------------------------------------------------------

    #[test]
    fn f32_to_i16_full_scale_and_clamp() {
        assert_eq!(f32_to_i16(&[1.0, -1.0, 0.0]), vec![32_767, -32_767, 0]);
        assert_eq!(f32_to_i16(&[2.0, -3.0]), vec![32_767, -32_767]);
    }

    #[test]
    fn f32_to_i16_half_scale() {
        assert_eq!(f32_to_i16(&[0.5]), vec![16_383]);
    }
}
