//! DSP Integration Tests
//!
//! Exercises the full feature path on synthetic signals:
//! - STFT → ISTFT round trip
//! - Spectrogram → mel → MFCC chain shapes and dynamic range
//! - Delta features over a real spectral stream
//! - Parameter rejection across the public surface

use ndarray::Array2;

use sf_dsp::{
    db_scale, delta, mfcc, pitch_track, power_spectrogram, stft, EdgePolicy, MelFilterbank,
    StftOptions, WindowKind, WindowSpec,
};

const SAMPLE_RATE: u32 = 16000;

/// Generate test sine wave
fn generate_sine(samples: usize, freq: f64) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            (2.0 * std::f64::consts::PI * freq * t).sin()
        })
        .collect()
}

/// Generate deterministic white noise
fn generate_noise(samples: usize) -> Vec<f64> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    (0..samples)
        .map(|i| {
            let mut hasher = DefaultHasher::new();
            i.hash(&mut hasher);
            let h = hasher.finish();
            (h as f64 / u64::MAX as f64) * 2.0 - 1.0
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUND TRIP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_stft_istft_round_trip() {
    let y = generate_sine(8192, 440.0);
    let window = WindowSpec::Named(WindowKind::Hann);
    let transform = stft(&y, 512, 128, &window, &StftOptions::default()).unwrap();
    let reconstructed = sf_dsp::istft(&transform.matrix, 128, &window, false).unwrap();

    let end = reconstructed.len().saturating_sub(512);
    for i in 512..end {
        assert!(
            (y[i] - reconstructed[i]).abs() < 1e-4,
            "sample {i} diverged: {} vs {}",
            y[i],
            reconstructed[i]
        );
    }
}

#[test]
fn test_round_trip_noise_is_valid() {
    let y = generate_noise(4096);
    let window = WindowSpec::Named(WindowKind::Hann);
    let transform = stft(&y, 256, 64, &window, &StftOptions::default()).unwrap();
    let reconstructed = sf_dsp::istft(&transform.matrix, 64, &window, false).unwrap();
    assert!(reconstructed.iter().all(|x| x.is_finite()));
    for i in 256..reconstructed.len() - 256 {
        assert!((y[i] - reconstructed[i]).abs() < 1e-4);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FEATURE CHAIN
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_frame_count_formula() {
    let y = generate_noise(2000);
    let frames = sf_dsp::segment(&y, 400, 160, EdgePolicy::Cut, 0.0).unwrap();
    assert_eq!(frames.ncols(), 11);
}

#[test]
fn test_spectrogram_to_mfcc_chain() {
    let y = generate_sine(16000, 220.0);
    let transform = stft(&y, 400, 160, &WindowSpec::default(), &StftOptions::default()).unwrap();
    let num_frames = transform.num_frames();

    let power = power_spectrogram(&transform.matrix, 2.0);
    assert_eq!(power.shape(), &[201, num_frames]);

    let bank = MelFilterbank::new(SAMPLE_RATE, 400, 40, 0.0, 8000.0, false).unwrap();
    let mel_power = bank.apply(&power).unwrap();
    let log_mel = db_scale(&mel_power, 1.0, 1e-10, Some(80.0)).unwrap();
    assert_eq!(log_mel.shape(), &[40, num_frames]);

    let ceps = mfcc(&log_mel, 13, false).unwrap();
    assert_eq!(ceps.shape(), &[13, num_frames]);
    assert!(ceps.iter().all(|c| c.is_finite()));
}

#[test]
fn test_db_dynamic_range_clipped() {
    let y = generate_sine(8000, 440.0);
    let transform = stft(&y, 512, 128, &WindowSpec::default(), &StftOptions::default()).unwrap();
    let power = power_spectrogram(&transform.matrix, 2.0);
    let db = db_scale(&power, 1.0, 1e-10, Some(80.0)).unwrap();
    let max = db.fold(f64::NEG_INFINITY, |a, &x| a.max(x));
    let min = db.fold(f64::INFINITY, |a, &x| a.min(x));
    assert!(max - min <= 80.0 + 1e-9);
}

#[test]
fn test_mel_filterbank_has_no_dead_channels() {
    let bank = MelFilterbank::new(16000, 512, 40, 0.0, 8000.0, false).unwrap();
    assert_eq!(bank.empty_filters, 0);
    for row in bank.weights.rows() {
        assert!(row.iter().any(|&w| w > 0.0));
    }
}

#[test]
fn test_delta_over_spectral_stream() {
    let y = generate_sine(16000, 330.0);
    let transform = stft(&y, 400, 160, &WindowSpec::default(), &StftOptions::default()).unwrap();
    let power = power_spectrogram(&transform.matrix, 2.0);
    let deltas = delta(&power, 9, 2, true).unwrap();
    assert_eq!(deltas.len(), 2);
    for d in &deltas {
        assert_eq!(d.shape(), power.shape());
        assert!(d.iter().all(|x| x.is_finite()));
    }
}

#[test]
fn test_pitch_on_steady_tone() {
    let y = generate_sine(16000, 440.0);
    let transform = stft(&y, 2048, 512, &WindowSpec::default(), &StftOptions::default()).unwrap();
    let mag = power_spectrogram(&transform.matrix, 1.0);
    let track = pitch_track(&mag, SAMPLE_RATE, 2048, 64.0, 4000.0, 0.8).unwrap();
    assert_eq!(track.len(), transform.num_frames());
    for &f in track.iter() {
        assert!((f - 440.0).abs() < 8.0);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PARAMETER REJECTION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_invalid_parameters_rejected_everywhere() {
    let data = Array2::<f64>::zeros((4, 20));

    // Even delta width
    assert!(delta(&data, 8, 1, true).is_err());
    // Non-positive amin, negative top_db
    assert!(db_scale(&data, 1.0, -1.0, None).is_err());
    assert!(db_scale(&data, 1.0, 1e-10, Some(-1.0)).is_err());
    // Hop exceeding frame length
    let y = generate_noise(1000);
    assert!(sf_dsp::segment(&y, 100, 101, EdgePolicy::Cut, 0.0).is_err());
    // Odd explicit window length against an even FFT size
    let bad_window = WindowSpec::Explicit(vec![1.0; 511]);
    assert!(stft(&y, 512, 128, &bad_window, &StftOptions::default()).is_err());
}
