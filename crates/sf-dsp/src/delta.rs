//! Delta Features
//!
//! Regression-based local derivative estimates over a sliding window of
//! frames, chained for higher orders.

use ndarray::Array2;

use sf_core::{Sample, SfError, SfResult};

/// Regression kernel of length `width`, normalized so its sum of squares
/// is 1 (scale invariance)
fn regression_kernel(width: usize) -> Vec<Sample> {
    let half_length = 1 + width / 2;
    let taps: Vec<Sample> = (0..width)
        .map(|k| (half_length as isize - 1 - k as isize) as Sample)
        .collect();
    let norm: Sample = taps.iter().map(|&t| t * t).sum();
    taps.into_iter().map(|t| t / norm).collect()
}

/// Causal FIR filter along each row, zero initial state, length-preserving
fn filter_rows(data: &Array2<Sample>, kernel: &[Sample]) -> Array2<Sample> {
    let (d, t) = data.dim();
    let mut out = Array2::zeros((d, t));
    for (row_in, mut row_out) in data.rows().into_iter().zip(out.rows_mut()) {
        for n in 0..t {
            let mut acc = 0.0;
            for (k, &b) in kernel.iter().enumerate() {
                if k > n {
                    break;
                }
                acc += b * row_in[n - k];
            }
            row_out[n] = acc;
        }
    }
    out
}

/// Replicate the first and last column `pad` times on each side
fn edge_pad_columns(data: &Array2<Sample>, pad: usize) -> Array2<Sample> {
    let (d, t) = data.dim();
    let mut out = Array2::zeros((d, t + 2 * pad));
    for j in 0..pad {
        out.column_mut(j).assign(&data.column(0));
        out.column_mut(t + pad + j).assign(&data.column(t - 1));
    }
    for j in 0..t {
        out.column_mut(pad + j).assign(&data.column(j));
    }
    out
}

/// Delta features of orders `1..=order` along the frame axis.
///
/// Input is `[feature_dim, num_frames]`; each order's untrimmed output
/// feeds the next. With `trim`, every order is cropped with the same slice
/// so its column `i` aligns with input frame `i`.
pub fn delta(
    data: &Array2<Sample>,
    width: usize,
    order: usize,
    trim: bool,
) -> SfResult<Vec<Array2<Sample>>> {
    if width < 3 || width % 2 != 1 {
        return Err(SfError::invalid(format!(
            "delta width must be an odd integer >= 3, got {width}"
        )));
    }
    if order == 0 {
        return Err(SfError::invalid("delta order must be a positive integer"));
    }
    let t = data.ncols();
    if t == 0 {
        return Err(SfError::InsufficientData { needed: 1, got: 0 });
    }

    let half_length = 1 + width / 2;
    let kernel = regression_kernel(width);

    let mut current = edge_pad_columns(data, width);
    let padded_len = current.ncols();
    let mut all_deltas = Vec::with_capacity(order);
    for _ in 0..order {
        current = filter_rows(&current, &kernel);
        all_deltas.push(current.clone());
    }

    if trim {
        // One shared slice for every order; the causal filter delays each
        // pass by half the kernel, so the valid region ends half_length
        // columns before the padded end
        let start = padded_len - half_length - t;
        let end = padded_len - half_length;
        all_deltas = all_deltas
            .into_iter()
            .map(|m| m.slice(ndarray::s![.., start..end]).to_owned())
            .collect();
    }
    Ok(all_deltas)
}
