//! Sample type and waveform container

use serde::{Deserialize, Serialize};

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;

/// A mono waveform: owned samples plus the rate they carry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waveform {
    /// Sample data, one channel
    pub samples: Vec<Sample>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<Sample>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Peak absolute amplitude
    pub fn peak(&self) -> Sample {
        self.samples.iter().fold(0.0, |acc, &s| acc.max(s.abs()))
    }
}
