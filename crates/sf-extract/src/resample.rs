//! Sample-Rate Conversion
//!
//! Chunked FFT resampling. The tail is zero-padded to fill the final
//! chunk; the output is trimmed of the resampler's delay and truncated to
//! the rate-scaled expected length.

use rubato::{FftFixedIn, Resampler};

use sf_core::{Sample, Waveform};

use crate::{ExtractError, ExtractResult, ResampleQuality};

/// Resample a mono waveform to `target_rate`.
///
/// Same-rate input is returned as a copy without passing through the
/// filter.
pub fn resample(
    input: &Waveform,
    target_rate: u32,
    quality: ResampleQuality,
) -> ExtractResult<Waveform> {
    if target_rate == 0 {
        return Err(ExtractError::Resample("target rate must be positive".into()));
    }
    if input.sample_rate == 0 {
        return Err(ExtractError::Resample("input rate must be positive".into()));
    }
    if input.sample_rate == target_rate {
        return Ok(input.clone());
    }
    if input.is_empty() {
        return Ok(Waveform::new(Vec::new(), target_rate));
    }

    let (chunk_size, sub_chunks) = match quality {
        ResampleQuality::Fast => (1024, 2),
        ResampleQuality::Best => (1024, 8),
    };
    let mut resampler = FftFixedIn::<Sample>::new(
        input.sample_rate as usize,
        target_rate as usize,
        chunk_size,
        sub_chunks,
        1,
    )
    .map_err(|e| ExtractError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let expected =
        (input.len() as u64 * target_rate as u64 / input.sample_rate as u64) as usize;

    let samples = &input.samples;
    let mut produced: Vec<Sample> = Vec::with_capacity(expected + delay + chunk_size);
    let mut position = 0;
    while produced.len() < expected + delay {
        let needed = resampler.input_frames_next();
        let mut block = vec![0.0; needed];
        let available = samples.len().saturating_sub(position).min(needed);
        block[..available].copy_from_slice(&samples[position..position + available]);
        position += available;

        let output = resampler
            .process(&[block], None)
            .map_err(|e| ExtractError::Resample(e.to_string()))?;
        produced.extend_from_slice(&output[0]);
    }

    let trimmed: Vec<Sample> = produced.into_iter().skip(delay).take(expected).collect();
    Ok(Waveform::new(trimmed, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn sine(samples: usize, freq: f64, rate: u32) -> Waveform {
        let data = (0..samples)
            .map(|i| (2.0 * PI * freq * i as f64 / rate as f64).sin())
            .collect();
        Waveform::new(data, rate)
    }

    #[test]
    fn test_downsample_length() {
        let wave = sine(16000, 440.0, 16000);
        let out = resample(&wave, 8000, ResampleQuality::Fast).unwrap();
        assert_eq!(out.sample_rate, 8000);
        assert_eq!(out.len(), 8000);
    }

    #[test]
    fn test_upsample_length() {
        let wave = sine(8000, 200.0, 8000);
        let out = resample(&wave, 16000, ResampleQuality::Best).unwrap();
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn test_same_rate_is_identity() {
        let wave = sine(1000, 440.0, 16000);
        let out = resample(&wave, 16000, ResampleQuality::Fast).unwrap();
        assert_eq!(out.samples, wave.samples);
    }

    #[test]
    fn test_tone_survives_conversion() {
        // A 440 Hz tone stays a 440 Hz tone: check interior amplitude and
        // zero-crossing rate rather than exact phase
        let wave = sine(16000, 440.0, 16000);
        let out = resample(&wave, 8000, ResampleQuality::Best).unwrap();
        let interior = &out.samples[1000..7000];
        let rms = (interior.iter().map(|x| x * x).sum::<f64>() / interior.len() as f64).sqrt();
        assert_abs_diff_eq!(rms, 1.0 / 2.0_f64.sqrt(), epsilon = 0.02);
        let crossings = interior
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();
        // 440 Hz over 0.75 s gives 660 half-periods
        assert!((crossings as i64 - 660).abs() <= 4, "{crossings} crossings");
    }

    #[test]
    fn test_zero_target_rejected() {
        let wave = sine(100, 440.0, 16000);
        assert!(resample(&wave, 0, ResampleQuality::Fast).is_err());
    }

    #[test]
    fn test_empty_input() {
        let wave = Waveform::new(Vec::new(), 16000);
        let out = resample(&wave, 8000, ResampleQuality::Fast).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.sample_rate, 8000);
    }
}
