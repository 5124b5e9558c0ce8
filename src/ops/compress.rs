//! Lossy compression through a 2-D Haar wavelet.
//!
//! Each channel is padded with zeros so that both axes are powers of two,
//! transformed, thresholded so that the requested share of distinct
//! coefficient magnitudes is discarded, inverted and cropped back to the
//! source size. Channels are processed one at a time, so only a single
//! padded plane is alive at once.

use super::calculations::{compression_threshold, haar_step, inverse_haar_step, next_power_of_two};
use super::check_input;
use super::params::Percent;
use super::plane::Plane;
use crate::error::OpResult;
use crate::raster::Raster;

/// Compress `raster` by discarding `ratio`% of its distinct Haar magnitudes.
///
/// 0% reproduces the input. 100% zeroes every coefficient and yields black.
pub fn compress(raster: &Raster, ratio: Percent) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let (width, height) = (raster.width() as usize, raster.height() as usize);
    let padded_w = next_power_of_two(width);
    let padded_h = next_power_of_two(height);
    let mut scratch = vec![0.0; padded_w.max(padded_h)];
    let mut column = vec![0.0; padded_h];
    let mut pixels = vec![[0; 3]; width * height];

    for channel in 0..3 {
        let mut plane = Plane::from_channel_padded(raster, channel, padded_w, padded_h);
        forward(&mut plane, &mut column, &mut scratch);

        let threshold = compression_threshold(plane.values(), ratio.value());
        for v in plane.values_mut() {
            if v.abs() < threshold {
                *v = 0.0;
            }
        }

        inverse(&mut plane, &mut column, &mut scratch);
        plane.write_channel(&mut pixels, width, channel, raster.max_value());
    }

    Raster::new(raster.width(), raster.height(), raster.max_value(), pixels)
}

/// Extents `(width, height)` of the block each level transforms, largest
/// first. Both axes halve per level; an axis that reaches 1 stays there
/// while the other keeps going.
fn levels(width: usize, height: usize) -> Vec<(usize, usize)> {
    let (mut w, mut h) = (width, height);
    let mut out = Vec::new();
    while w > 1 || h > 1 {
        out.push((w, h));
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    out
}

/// Multi-level transform: rows then columns of the top-left block, per level.
fn forward(plane: &mut Plane, column: &mut [f64], scratch: &mut [f64]) {
    for (w, h) in levels(plane.width(), plane.height()) {
        if w > 1 {
            for y in 0..h {
                haar_step(&mut plane.row_mut(y)[..w], scratch);
            }
        }
        if h > 1 {
            transform_columns(plane, w, h, column, scratch, haar_step);
        }
    }
}

/// Undo [`forward`]: levels smallest first, columns then rows.
fn inverse(plane: &mut Plane, column: &mut [f64], scratch: &mut [f64]) {
    for (w, h) in levels(plane.width(), plane.height()).into_iter().rev() {
        if h > 1 {
            transform_columns(plane, w, h, column, scratch, inverse_haar_step);
        }
        if w > 1 {
            for y in 0..h {
                inverse_haar_step(&mut plane.row_mut(y)[..w], scratch);
            }
        }
    }
}

/// Apply `step` to the first `height` cells of each of the first `width`
/// columns.
fn transform_columns(
    plane: &mut Plane,
    width: usize,
    height: usize,
    column: &mut [f64],
    scratch: &mut [f64],
    step: fn(&mut [f64], &mut [f64]),
) {
    for x in 0..width {
        for (y, cell) in column[..height].iter_mut().enumerate() {
            *cell = plane.get(x, y);
        }
        step(&mut column[..height], scratch);
        for (y, &value) in column[..height].iter().enumerate() {
            plane.set(x, y, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn percent(p: f64) -> Percent {
        Percent::new(p).unwrap()
    }

    #[test]
    fn forward_then_inverse_is_lossless() {
        for (w, h) in [(7, 5), (3, 9), (1, 6), (6, 1)] {
            let image = sample_raster(w, h, 3);
            let (pw, ph) = (next_power_of_two(w as usize), next_power_of_two(h as usize));
            let mut plane = Plane::from_channel_padded(&image, 1, pw, ph);
            let original = plane.clone();
            let mut scratch = vec![0.0; pw.max(ph)];
            let mut column = vec![0.0; ph];
            forward(&mut plane, &mut column, &mut scratch);
            inverse(&mut plane, &mut column, &mut scratch);
            for (got, want) in plane.values().iter().zip(original.values()) {
                assert!((got - want).abs() < 1e-9, "{w}x{h}: {got} vs {want}");
            }
        }
    }

    #[test]
    fn levels_halve_each_axis_independently() {
        assert_eq!(levels(4, 4), vec![(4, 4), (2, 2)]);
        assert_eq!(levels(8, 2), vec![(8, 2), (4, 1), (2, 1)]);
        assert_eq!(levels(1, 4), vec![(1, 4), (1, 2)]);
        assert!(levels(1, 1).is_empty());
    }

    #[test]
    fn long_strip_pads_each_axis_separately() {
        let image = sample_raster(1, 20_000, 5);
        let lossless = compress(&image, percent(0.0)).unwrap();
        assert_close(&lossless, &image, 2);

        let result = compress(&image, percent(60.0)).unwrap();
        assert_eq!(result.dimensions(), (1, 20_000));
        assert_channels_in_range(&result);
    }

    #[test]
    fn zero_percent_reproduces_input() {
        for image in sample_rasters() {
            assert_eq!(compress(&image, percent(0.0)).unwrap(), image);
        }
    }

    #[test]
    fn full_compression_is_black() {
        let image = sample_raster(6, 3, 11);
        let result = compress(&image, percent(100.0)).unwrap();
        assert!(result.pixels().iter().all(|p| *p == [0, 0, 0]));
        assert_eq!(result.dimensions(), (6, 3));
    }

    #[test]
    fn half_compression_of_small_raster() {
        let image = raster(&[
            vec![[100, 150, 200], [150, 200, 250]],
            vec![[200, 250, 100], [250, 100, 150]],
        ]);
        let result = compress(&image, percent(50.0)).unwrap();
        assert_eq!(
            result.to_rows(),
            vec![
                vec![[125, 125, 225], [125, 225, 225]],
                vec![[225, 225, 125], [225, 125, 125]],
            ]
        );
    }

    #[test]
    fn heavy_compression_flattens_checkerboard() {
        let rows: Vec<Vec<[u32; 3]>> = (0..4)
            .map(|y| {
                (0..4)
                    .map(|x| if (x + y) % 2 == 0 { [0; 3] } else { [255; 3] })
                    .collect()
            })
            .collect();
        let result = compress(&raster(&rows), percent(75.0)).unwrap();
        for p in result.pixels() {
            for &c in p {
                assert!((125..=130).contains(&c), "channel {c} not near mid grey");
            }
        }
    }

    #[test]
    fn non_square_input_is_cropped_back() {
        let image = sample_raster(5, 2, 7);
        let result = compress(&image, percent(30.0)).unwrap();
        assert_eq!(result.dimensions(), (5, 2));
        assert_eq!(result.max_value(), image.max_value());
    }
}
