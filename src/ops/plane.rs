//! Single-channel `f64` working buffers.
//!
//! Kernels that need intermediate precision (convolution, the Haar wavelet)
//! pull each channel out into a [`Plane`] allocated once at its final size,
//! work on it in place, and fold the three planes back into a [`Raster`].

use super::calculations::round_clamp;
use crate::raster::{Pixel, Raster};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Plane {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Plane {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Copy channel `channel` of `raster` into the top-left corner of a
    /// zero-filled plane of `width × height` (which must be at least as large
    /// as the raster).
    pub fn from_channel_padded(
        raster: &Raster,
        channel: usize,
        width: usize,
        height: usize,
    ) -> Self {
        debug_assert!(width >= raster.width() as usize && height >= raster.height() as usize);
        let mut plane = Self::zeros(width, height);
        for (y, row) in raster.rows().enumerate() {
            let dst = &mut plane.data[y * width..y * width + row.len()];
            for (cell, pixel) in dst.iter_mut().zip(row) {
                *cell = pixel[channel] as f64;
            }
        }
        plane
    }

    pub fn from_channel(raster: &Raster, channel: usize) -> Self {
        Self::from_channel_padded(
            raster,
            channel,
            raster.width() as usize,
            raster.height() as usize,
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        self.data[y * self.width + x] = value;
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [f64] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Round and clamp the top-left `width`-column window into channel
    /// `channel` of a row-major pixel buffer, dropping any padding.
    pub fn write_channel(&self, pixels: &mut [Pixel], width: usize, channel: usize, max: u32) {
        for (i, pixel) in pixels.iter_mut().enumerate() {
            pixel[channel] = round_clamp(self.get(i % width, i / width), max);
        }
    }
}

/// Fold three planes back into a raster of `width × height`, cropping any
/// padding and rounding/clamping every value into `[0, max_value]`.
pub(crate) fn planes_to_raster(
    planes: &[Plane; 3],
    width: u32,
    height: u32,
    max_value: u32,
) -> Raster {
    Raster::from_fn(width, height, max_value, |x, y| {
        let (x, y) = (x as usize, y as usize);
        [0, 1, 2].map(|c| round_clamp(planes[c].get(x, y), max_value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_plane_is_zero_filled() {
        let raster = Raster::from_rows(255, &[vec![[1, 2, 3], [4, 5, 6]]]).unwrap();
        let plane = Plane::from_channel_padded(&raster, 1, 4, 2);
        assert_eq!(plane.values(), &[2.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn planes_round_trip_and_crop() {
        let raster = Raster::from_rows(
            255,
            &[vec![[1, 2, 3], [4, 5, 6]], vec![[7, 8, 9], [10, 11, 12]]],
        )
        .unwrap();
        let planes = [0, 1, 2].map(|c| Plane::from_channel_padded(&raster, c, 4, 4));
        assert_eq!(planes_to_raster(&planes, 2, 2, 255), raster);
    }

    #[test]
    fn write_channel_crops_and_clamps() {
        let mut plane = Plane::zeros(4, 2);
        plane.values_mut().copy_from_slice(&[1.4, -3.0, 9.0, 9.0, 300.0, 2.5, 9.0, 9.0]);
        let mut pixels = vec![[7, 7, 7]; 4];
        plane.write_channel(&mut pixels, 2, 1, 255);
        assert_eq!(pixels, vec![[7, 1, 7], [7, 0, 7], [7, 255, 7], [7, 3, 7]]);
    }
}
