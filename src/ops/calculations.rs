//! Pure numeric helpers used by the operation kernels.
//!
//! Nothing here touches a [`Raster`](crate::raster::Raster); every function
//! is a plain formula on scalars or slices and is unit tested on its own.

use std::f64::consts::SQRT_2;

/// Round half up and clamp into `[0, max_value]`.
///
/// NaN maps to 0.
#[inline]
pub fn round_clamp(value: f64, max_value: u32) -> u32 {
    let rounded = value.round();
    if rounded.is_nan() || rounded <= 0.0 {
        0
    } else if rounded >= max_value as f64 {
        max_value
    } else {
        rounded as u32
    }
}

/// Clamp a signed integer into `[0, max_value]`.
#[inline]
pub fn clamp_i64(value: i64, max_value: u32) -> u32 {
    value.clamp(0, max_value as i64) as u32
}

/// BT.709 luma, rounded and clamped.
pub fn luma(pixel: [u32; 3], max_value: u32) -> u32 {
    let [r, g, b] = pixel.map(f64::from);
    round_clamp(0.2126 * r + 0.7152 * g + 0.0722 * b, max_value)
}

/// Integer mean of the three channels.
pub fn intensity(pixel: [u32; 3]) -> u32 {
    let [r, g, b] = pixel.map(u64::from);
    ((r + g + b) / 3) as u32
}

/// Rows of the sepia tone matrix, applied as `out[i] = row[i] · (r, g, b)`.
pub const SEPIA: [[f64; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Apply a 3×3 colour matrix to one pixel, rounding and clamping each output.
pub fn apply_color_matrix(matrix: &[[f64; 3]; 3], pixel: [u32; 3], max_value: u32) -> [u32; 3] {
    let [r, g, b] = pixel.map(f64::from);
    matrix.map(|row| round_clamp(row[0] * r + row[1] * g + row[2] * b, max_value))
}

/// Coefficients `(a, b, c)` of the quadratic `a·x² + b·x + c` through
/// `(x0, y0)`, `(x1, y1)`, `(x2, y2)`, by Lagrange interpolation.
///
/// The three `x` values must be distinct.
pub fn lagrange_quadratic(points: [(f64, f64); 3]) -> (f64, f64, f64) {
    let [(x0, y0), (x1, y1), (x2, y2)] = points;
    let a0 = y0 / ((x0 - x1) * (x0 - x2));
    let a1 = y1 / ((x1 - x0) * (x1 - x2));
    let a2 = y2 / ((x2 - x0) * (x2 - x1));

    let a = a0 + a1 + a2;
    let b = -(a0 * (x1 + x2) + a1 * (x0 + x2) + a2 * (x0 + x1));
    let c = a0 * x1 * x2 + a1 * x0 * x2 + a2 * x0 * x1;
    (a, b, c)
}

/// Source index sampled for output index `i` when shrinking an axis of
/// `source_len` cells to `target_len` cells.
///
/// Corners map to corners: `round(i · (source_len − 1) / (target_len − 1))`.
/// A single-cell target samples index 0.
pub fn downscale_source_index(i: u32, source_len: u32, target_len: u32) -> u32 {
    if target_len <= 1 {
        return 0;
    }
    let scaled = i as f64 * (source_len - 1) as f64 / (target_len - 1) as f64;
    (scaled.round() as u32).min(source_len - 1)
}

/// Smallest power of two `>= n` (and at least 1).
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// One forward Haar step over `data`: pairwise averages into the first
/// half, pairwise differences into the second, both scaled by `1/√2`.
///
/// `data.len()` must be even. `scratch` must be at least as long as `data`.
pub fn haar_step(data: &mut [f64], scratch: &mut [f64]) {
    let half = data.len() / 2;
    for i in 0..half {
        let a = data[2 * i];
        let b = data[2 * i + 1];
        scratch[i] = (a + b) / SQRT_2;
        scratch[half + i] = (a - b) / SQRT_2;
    }
    data.copy_from_slice(&scratch[..data.len()]);
}

/// Exact inverse of [`haar_step`].
pub fn inverse_haar_step(data: &mut [f64], scratch: &mut [f64]) {
    let half = data.len() / 2;
    for i in 0..half {
        let avg = data[i];
        let diff = data[half + i];
        scratch[2 * i] = (avg + diff) / SQRT_2;
        scratch[2 * i + 1] = (avg - diff) / SQRT_2;
    }
    data.copy_from_slice(&scratch[..data.len()]);
}

/// Magnitude below which coefficients are discarded so that `percent`% of
/// the distinct magnitudes in `coefficients` are dropped.
///
/// Distinct magnitudes are sorted ascending and the one at
/// `floor(n · percent / 100)` becomes the threshold. At 100% every
/// coefficient goes, so the threshold is infinite.
pub fn compression_threshold(coefficients: &[f64], percent: f64) -> f64 {
    let mut magnitudes: Vec<f64> = coefficients.iter().map(|c| c.abs()).collect();
    magnitudes.sort_by(f64::total_cmp);
    magnitudes.dedup();

    let k = (magnitudes.len() as f64 * percent / 100.0).floor() as usize;
    magnitudes.get(k).copied().unwrap_or(f64::INFINITY)
}

/// First column that keeps the original pixel in a split view of `width`
/// columns at `percent`.
pub fn split_column(width: u32, percent: f64) -> u32 {
    ((width as f64 * percent / 100.0).floor() as u32).min(width)
}
