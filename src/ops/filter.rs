//! Square-kernel convolution.
//!
//! Neighbours that fall outside the raster contribute zero and the divisor is
//! never renormalised, so borders darken under blur. Each channel is
//! convolved independently in `f64` and rounded once at the end.

use super::check_input;
use super::plane::{Plane, planes_to_raster};
use crate::error::{OpError, OpResult};
use crate::raster::Raster;

/// Odd-sized square convolution kernel, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f64>,
    divisor: f64,
}

impl Kernel {
    pub fn new(size: usize, weights: Vec<f64>, divisor: f64) -> OpResult<Self> {
        if size == 0 || size % 2 == 0 {
            return Err(OpError::invalid_argument(format!(
                "kernel size must be odd, got {size}"
            )));
        }
        if weights.len() != size * size {
            return Err(OpError::invalid_argument(format!(
                "{size}x{size} kernel needs {} weights, got {}",
                size * size,
                weights.len()
            )));
        }
        if divisor == 0.0 || !divisor.is_finite() {
            return Err(OpError::invalid_argument("kernel divisor must be finite and non-zero"));
        }
        Ok(Self {
            size,
            weights,
            divisor,
        })
    }

    /// `[[1,2,1],[2,4,2],[1,2,1]] / 16`.
    pub fn gaussian_3x3() -> Self {
        Self {
            size: 3,
            weights: vec![1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0],
            divisor: 16.0,
        }
    }

    /// 5×5: centre 1, inner ring 1/4, outer ring −1/8.
    pub fn sharpen_5x5() -> Self {
        let weights = (0..25)
            .map(|i| {
                let (dx, dy) = ((i % 5) as i32 - 2, (i / 5) as i32 - 2);
                match dx.abs().max(dy.abs()) {
                    0 => 1.0,
                    1 => 0.25,
                    _ => -0.125,
                }
            })
            .collect();
        Self {
            size: 5,
            weights,
            divisor: 1.0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn divisor(&self) -> f64 {
        self.divisor
    }

    fn weight(&self, kx: usize, ky: usize) -> f64 {
        self.weights[ky * self.size + kx]
    }
}

/// Convolve every channel of `raster` with `kernel`.
pub fn convolve(raster: &Raster, kernel: &Kernel) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let (width, height) = (raster.width() as usize, raster.height() as usize);
    let radius = (kernel.size / 2) as isize;

    let planes = [0, 1, 2].map(|c| {
        let source = Plane::from_channel(raster, c);
        let mut out = Plane::zeros(width, height);
        for y in 0..height {
            for x in 0..width {
                let mut sum = 0.0;
                for ky in 0..kernel.size {
                    let sy = y as isize + ky as isize - radius;
                    if sy < 0 || sy >= height as isize {
                        continue;
                    }
                    for kx in 0..kernel.size {
                        let sx = x as isize + kx as isize - radius;
                        if sx < 0 || sx >= width as isize {
                            continue;
                        }
                        sum += source.get(sx as usize, sy as usize) * kernel.weight(kx, ky);
                    }
                }
                out.set(x, y, sum / kernel.divisor);
            }
        }
        out
    });

    Ok(planes_to_raster(
        &planes,
        raster.width(),
        raster.height(),
        raster.max_value(),
    ))
}

pub fn blur(raster: &Raster) -> OpResult<Raster> {
    convolve(raster, &Kernel::gaussian_3x3())
}

pub fn sharpen(raster: &Raster) -> OpResult<Raster> {
    convolve(raster, &Kernel::sharpen_5x5())
}
