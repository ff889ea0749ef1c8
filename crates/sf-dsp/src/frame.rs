//! Frame Segmentation
//!
//! Splits a signal into overlapping fixed-length frames. The matrix form
//! is `[frame_length, num_frames]`, one column per frame; a zero-copy
//! iterator is available for the cut policy.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use sf_core::{Sample, SfError, SfResult};

/// Where an incomplete remainder is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// At the start of the signal
    Pre,
    /// At the end of the signal
    Post,
}

/// Policy for signals that do not fill a whole number of frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgePolicy {
    /// Drop the samples of an incomplete frame
    Cut,
    /// Extend with a fill value until the last frame is complete
    Pad(Orientation),
    /// Extend by recycling the signal's own samples
    Wrap(Orientation),
}

impl Default for EdgePolicy {
    fn default() -> Self {
        Self::Cut
    }
}

fn validate(frame_length: usize, hop_length: usize) -> SfResult<()> {
    if frame_length == 0 {
        return Err(SfError::invalid("frame_length must be positive"));
    }
    if hop_length == 0 || hop_length > frame_length {
        return Err(SfError::invalid(format!(
            "hop_length must be in 1..={frame_length}, got {hop_length}"
        )));
    }
    Ok(())
}

/// Frame count for a signal of `len` samples, assuming `len >= frame_length`
#[inline]
pub fn num_frames(len: usize, frame_length: usize, hop_length: usize) -> usize {
    1 + (len - frame_length) / hop_length
}

/// Zero-copy frames with cut semantics
///
/// Yields `1 + (len - frame_length) / hop_length` borrowed slices.
/// Observably identical to the columns of [`segment`] with `Cut`.
pub fn frame_iter(
    signal: &[Sample],
    frame_length: usize,
    hop_length: usize,
) -> SfResult<impl Iterator<Item = &[Sample]>> {
    validate(frame_length, hop_length)?;
    if signal.len() < frame_length {
        return Err(SfError::InsufficientData {
            needed: frame_length,
            got: signal.len(),
        });
    }
    Ok(signal.windows(frame_length).step_by(hop_length))
}

/// Segment a signal into a `[frame_length, num_frames]` matrix
pub fn segment(
    signal: &[Sample],
    frame_length: usize,
    hop_length: usize,
    edge: EdgePolicy,
    pad_value: Sample,
) -> SfResult<Array2<Sample>> {
    validate(frame_length, hop_length)?;
    if signal.is_empty() {
        return Err(SfError::InsufficientData {
            needed: frame_length,
            got: 0,
        });
    }

    match edge {
        EdgePolicy::Cut => {
            let iter = frame_iter(signal, frame_length, hop_length)?;
            let n = num_frames(signal.len(), frame_length, hop_length);
            Ok(fill_matrix(iter, frame_length, n))
        }
        EdgePolicy::Pad(orientation) | EdgePolicy::Wrap(orientation) => {
            let len = signal.len();
            let target = extended_len(len, frame_length, hop_length);
            if target == len {
                // Already a whole number of frames, no extension needed
                let n = num_frames(len, frame_length, hop_length);
                let iter = signal.windows(frame_length).step_by(hop_length);
                return Ok(fill_matrix(iter, frame_length, n));
            }
            let ext = target - len;
            let mut extended = Vec::with_capacity(target);
            let wrap = matches!(edge, EdgePolicy::Wrap(_));
            match orientation {
                Orientation::Post => {
                    extended.extend_from_slice(signal);
                    for i in 0..ext {
                        extended.push(if wrap { signal[i % len] } else { pad_value });
                    }
                }
                Orientation::Pre => {
                    for i in 0..ext {
                        extended.push(if wrap {
                            // The last `ext` samples, cycling if the
                            // extension exceeds the signal
                            let idx = (len as isize - ext as isize + i as isize)
                                .rem_euclid(len as isize);
                            signal[idx as usize]
                        } else {
                            pad_value
                        });
                    }
                    extended.extend_from_slice(signal);
                }
            }
            let n = num_frames(target, frame_length, hop_length);
            let iter = extended.windows(frame_length).step_by(hop_length);
            Ok(fill_matrix(iter, frame_length, n))
        }
    }
}

/// Smallest length >= `len` that holds a whole number of frames
fn extended_len(len: usize, frame_length: usize, hop_length: usize) -> usize {
    if len < frame_length {
        return frame_length;
    }
    let rem = (len - frame_length) % hop_length;
    if rem == 0 { len } else { len + hop_length - rem }
}

fn fill_matrix<'a>(
    iter: impl Iterator<Item = &'a [Sample]>,
    frame_length: usize,
    n: usize,
) -> Array2<Sample> {
    let mut frames = Array2::zeros((frame_length, n));
    for (j, frame) in iter.enumerate() {
        frames.column_mut(j).assign(&ArrayView1::from(frame));
    }
    frames
}
