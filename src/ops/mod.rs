//! The operation library: pure raster transforms.
//!
//! | Operation | Function | Module |
//! |---|---|---|
//! | Brighten / darken | [`brighten`] | [`tone`] |
//! | Component extraction | [`extract_component`] | [`tone`] |
//! | Sepia | [`sepia`] | [`tone`] |
//! | Colour correction | [`color_correct`] | [`tone`] |
//! | Levels | [`adjust_levels`] | [`tone`] |
//! | Horizontal / vertical flip | [`flip_horizontal`], [`flip_vertical`] | [`geometry`] |
//! | Downscale | [`downscale`] | [`geometry`] |
//! | Blur (3×3) / sharpen (5×5) | [`blur`], [`sharpen`] | [`filter`] |
//! | Haar compression | [`compress`] | [`compress`](mod@compress) |
//! | Channel combine / split | [`combine`], [`split_channels`] | [`channels`] |
//! | Histogram plot | [`histogram`] | [`histogram`](mod@histogram) |
//!
//! Every function validates its raster arguments before doing any work,
//! returns a freshly allocated [`Raster`], and is deterministic: identical
//! inputs give identical outputs. Channel values are rounded and clamped into
//! `[0, max_value]` wherever arithmetic could leave that range.
//!
//! The module is split into:
//! - **Calculations**: scalar formulas (rounding, luma, Lagrange, Haar steps)
//! - **Parameters**: validated parameter types
//! - **Plane**: per-channel `f64` buffers used by the convolution and wavelet kernels
//! - **Kernels**: one module per family of operations

pub mod calculations;
pub mod channels;
pub mod compress;
pub mod filter;
pub mod geometry;
pub mod histogram;
pub mod params;
mod plane;
pub mod tone;

pub use channels::{combine, split_channels};
pub use compress::compress;
pub use filter::{Kernel, blur, convolve, sharpen};
pub use geometry::{downscale, flip_horizontal, flip_vertical};
pub use histogram::histogram;
pub use params::{ColorCorrection, Component, Levels, Percent};
pub use tone::{adjust_levels, brighten, color_correct, extract_component, sepia};

use crate::error::{OpError, OpResult};
use crate::raster::Raster;

/// Re-check a raster argument, reporting failures as invalid arguments.
pub(crate) fn check_input(raster: &Raster, role: &str) -> OpResult<()> {
    raster
        .validate()
        .map_err(|e| OpError::invalid_argument(format!("{role} raster is invalid: {e}")))
}
