//! WAV Input and Output
//!
//! Decodes PCM WAV to a mono `Waveform` (averaging channels, optionally
//! removing the DC offset) and writes mono 16-bit PCM for debug dumps.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use sf_core::{Sample, Waveform};

use crate::{ExtractError, ExtractResult};

/// Read a WAV file into a mono float waveform.
///
/// Accepts 16/24/32-bit integer and 32-bit float PCM; multi-channel input
/// is averaged down to one channel. With `remove_dc_offset` the mean is
/// subtracted after downmixing.
pub fn read_wav(path: impl AsRef<Path>, remove_dc_offset: bool) -> ExtractResult<Waveform> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(ExtractError::UnsupportedAudio("zero channels".into()));
    }

    let interleaved: Vec<Sample> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v as Sample))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ (16 | 24 | 32)) => {
            let scale = (1_i64 << (bits - 1)) as Sample;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as Sample / scale))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => {
            return Err(ExtractError::UnsupportedAudio(format!(
                "{bits}-bit {format:?} PCM"
            )));
        }
    };

    let mut mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<Sample>() / channels as Sample)
            .collect()
    };

    if remove_dc_offset && !mono.is_empty() {
        let mean = mono.iter().sum::<Sample>() / mono.len() as Sample;
        for sample in &mut mono {
            *sample -= mean;
        }
    }

    Ok(Waveform::new(mono, spec.sample_rate))
}

/// Write a mono waveform as 16-bit PCM, clamping to `[-1, 1]`
pub fn write_wav(path: impl AsRef<Path>, waveform: &Waveform) -> ExtractResult<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in &waveform.samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as Sample).round() as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()?;
    Ok(())
}
