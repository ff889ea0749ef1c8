//! DSP Performance Benchmarks
//!
//! Measures the cost of the hot feature-extraction stages on one second
//! of 16 kHz audio.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sf_dsp::{
    db_scale, delta, mfcc, power_spectrogram, stft, MelFilterbank, StftOptions, StftPlan,
    WindowSpec,
};

const SAMPLE_RATE: u32 = 16000;
const FFT_SIZES: &[usize] = &[256, 512, 1024, 2048];

/// Generate test audio (440Hz sine wave)
fn generate_test_audio(samples: usize) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_stft(c: &mut Criterion) {
    let mut group = c.benchmark_group("STFT");
    let signal = generate_test_audio(SAMPLE_RATE as usize);

    for &n_fft in FFT_SIZES {
        group.bench_with_input(
            BenchmarkId::new("forward", n_fft),
            &n_fft,
            |b, &n_fft| {
                let plan = StftPlan::new(n_fft, n_fft / 4, &WindowSpec::default()).unwrap();
                b.iter(|| {
                    let out = plan
                        .forward(black_box(&signal), &StftOptions::default())
                        .unwrap();
                    black_box(out.num_frames())
                });
            },
        );
    }

    group.finish();
}

fn bench_istft(c: &mut Criterion) {
    let mut group = c.benchmark_group("ISTFT");
    let signal = generate_test_audio(SAMPLE_RATE as usize);

    for &n_fft in FFT_SIZES {
        group.bench_with_input(
            BenchmarkId::new("overlap_add", n_fft),
            &n_fft,
            |b, &n_fft| {
                let plan = StftPlan::new(n_fft, n_fft / 4, &WindowSpec::default()).unwrap();
                let transform = plan.forward(&signal, &StftOptions::default()).unwrap();
                b.iter(|| {
                    let y = plan.inverse(black_box(&transform.matrix), false).unwrap();
                    black_box(y.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_mel_mfcc(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mel/MFCC");
    let signal = generate_test_audio(SAMPLE_RATE as usize);
    let transform = stft(&signal, 512, 128, &WindowSpec::default(), &StftOptions::default())
        .unwrap();
    let power = power_spectrogram(&transform.matrix, 2.0);
    let bank = MelFilterbank::new(SAMPLE_RATE, 512, 40, 0.0, 8000.0, false).unwrap();

    group.bench_function("filterbank_apply", |b| {
        b.iter(|| {
            let mel = bank.apply(black_box(&power)).unwrap();
            black_box(mel.ncols())
        });
    });

    let log_mel = db_scale(&bank.apply(&power).unwrap(), 1.0, 1e-10, Some(80.0)).unwrap();
    group.bench_function("mfcc", |b| {
        b.iter(|| {
            let ceps = mfcc(black_box(&log_mel), 13, false).unwrap();
            black_box(ceps.ncols())
        });
    });

    group.finish();
}

fn bench_delta(c: &mut Criterion) {
    let mut group = c.benchmark_group("Delta");
    let signal = generate_test_audio(SAMPLE_RATE as usize);
    let transform = stft(&signal, 400, 160, &WindowSpec::default(), &StftOptions::default())
        .unwrap();
    let power = power_spectrogram(&transform.matrix, 2.0);

    for &order in &[1usize, 2] {
        group.bench_with_input(BenchmarkId::new("order", order), &order, |b, &order| {
            b.iter(|| {
                let d = delta(black_box(&power), 9, order, true).unwrap();
                black_box(d.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_stft, bench_istft, bench_mel_mfcc, bench_delta);
criterion_main!(benches);
