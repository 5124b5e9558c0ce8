//! Per-pixel tone operations.
//!
//! Each output pixel depends only on the input pixel at the same position
//! (plus, for colour correction, statistics gathered over the whole raster).

use super::calculations::{
    SEPIA, apply_color_matrix, clamp_i64, intensity, lagrange_quadratic, luma, round_clamp,
};
use super::check_input;
use super::params::{ColorCorrection, Component, Levels};
use crate::error::OpResult;
use crate::raster::Raster;
use std::collections::BTreeMap;

/// Add `delta` to every channel, clamping into `[0, max_value]`.
///
/// Negative deltas darken.
pub fn brighten(raster: &Raster, delta: i64) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let max = raster.max_value();
    Ok(raster.map_pixels(|p| p.map(|c| clamp_i64((c as i64).saturating_add(delta), max))))
}

/// Replace every pixel with a grey pixel holding the chosen component.
pub fn extract_component(raster: &Raster, component: Component) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let max = raster.max_value();
    Ok(raster.map_pixels(|p| {
        let v = match component {
            Component::Red => p[0],
            Component::Green => p[1],
            Component::Blue => p[2],
            Component::Luma => luma(p, max),
            Component::Intensity => intensity(p),
            Component::Value => p[0].max(p[1]).max(p[2]),
        };
        [v; 3]
    }))
}

/// Classic sepia tone matrix.
pub fn sepia(raster: &Raster) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let max = raster.max_value();
    Ok(raster.map_pixels(|p| apply_color_matrix(&SEPIA, p, max)))
}

/// Align the histogram peaks of the three channels.
///
/// Each channel's peak is the most frequent value inside the meaningful
/// range (ties go to the lowest value). Every channel is then shifted by
/// `average_peak - channel_peak`. A channel with no meaningful values is left
/// alone and does not take part in the average.
pub fn color_correct(raster: &Raster, params: ColorCorrection) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let max = raster.max_value();

    let peaks = channel_peaks(raster, params);
    let present: Vec<u64> = peaks.iter().flatten().map(|&p| p as u64).collect();
    if present.is_empty() {
        return Ok(raster.clone());
    }
    let average = (present.iter().sum::<u64>() / present.len() as u64) as i64;
    let shifts = peaks.map(|peak| peak.map_or(0, |p| average - p as i64));

    Ok(raster.map_pixels(|p| [0, 1, 2].map(|c| clamp_i64(p[c] as i64 + shifts[c], max))))
}

/// Most frequent meaningful value per channel, or `None` when a channel has
/// no meaningful values at all.
pub(crate) fn channel_peaks(raster: &Raster, params: ColorCorrection) -> [Option<u32>; 3] {
    let max = raster.max_value();
    let mut histograms: [BTreeMap<u32, u64>; 3] = Default::default();
    for pixel in raster.pixels() {
        for (histogram, &value) in histograms.iter_mut().zip(pixel) {
            if params.is_meaningful(value, max) {
                *histogram.entry(value).or_default() += 1;
            }
        }
    }

    histograms.map(|histogram| {
        let mut best: Option<(u32, u64)> = None;
        // Ascending keys with a strict comparison keep the lowest value on ties.
        for (value, count) in histogram {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((value, count));
            }
        }
        best.map(|(value, _)| value)
    })
}

/// Remap every channel through the quadratic that sends `black → 0`,
/// `mid → max/2` and `white → max`.
pub fn adjust_levels(raster: &Raster, levels: Levels) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let max = raster.max_value();
    levels.check(max)?;

    let (a, b, c) = lagrange_quadratic([
        (levels.black as f64, 0.0),
        (levels.mid as f64, max as f64 / 2.0),
        (levels.white as f64, max as f64),
    ]);
    Ok(raster.map_pixels(|p| {
        p.map(|v| {
            let v = v as f64;
            round_clamp(a * v * v + b * v + c, max)
        })
    }))
}
