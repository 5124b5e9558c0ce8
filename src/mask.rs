//! Selective application of an operation.
//!
//! [`apply_mask`] runs an operation over the whole image and then picks, per
//! pixel, either the transformed or the original value: pure black in the
//! mask selects the transformed pixel, anything else keeps the original.
//! There is no blending.
//!
//! [`split_view`] is the column-wise counterpart used for before/after
//! previews.

use crate::error::{OpError, OpResult};
use crate::ops::{self, Component, Percent, calculations::split_column, check_input};
use crate::raster::{BLACK, Raster};
use std::fmt;
use std::str::FromStr;

/// Operations that may be applied through a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskableOp {
    Blur,
    Sharpen,
    Sepia,
    Component(Component),
}

impl MaskableOp {
    pub fn all() -> impl Iterator<Item = MaskableOp> {
        [MaskableOp::Blur, MaskableOp::Sharpen, MaskableOp::Sepia]
            .into_iter()
            .chain(Component::ALL.into_iter().map(MaskableOp::Component))
    }

    /// Command-line name, e.g. `blur` or `luma-component`.
    pub fn name(self) -> String {
        match self {
            MaskableOp::Blur => "blur".to_string(),
            MaskableOp::Sharpen => "sharpen".to_string(),
            MaskableOp::Sepia => "sepia".to_string(),
            MaskableOp::Component(c) => format!("{c}-component"),
        }
    }

    /// Case-insensitive lookup by command-line name.
    pub fn from_name(name: &str) -> OpResult<Self> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "blur" => Ok(MaskableOp::Blur),
            "sharpen" => Ok(MaskableOp::Sharpen),
            "sepia" => Ok(MaskableOp::Sepia),
            other => other
                .strip_suffix("-component")
                .and_then(|c| c.parse::<Component>().ok())
                .map(MaskableOp::Component)
                .ok_or_else(|| OpError::unsupported(format!("unknown operation '{name}'"))),
        }
    }

    pub fn apply(self, raster: &Raster) -> OpResult<Raster> {
        match self {
            MaskableOp::Blur => ops::blur(raster),
            MaskableOp::Sharpen => ops::sharpen(raster),
            MaskableOp::Sepia => ops::sepia(raster),
            MaskableOp::Component(c) => ops::extract_component(raster, c),
        }
    }
}

impl fmt::Display for MaskableOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for MaskableOp {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Apply `op` where `mask` is pure black, keep `image` elsewhere.
pub fn apply_mask(image: &Raster, mask: &Raster, op: MaskableOp) -> OpResult<Raster> {
    check_input(image, "image")?;
    check_input(mask, "mask")?;
    if !image.same_size(mask) {
        return Err(OpError::dimension_mismatch(format!(
            "mask is {}x{}, image is {}x{}",
            mask.width(),
            mask.height(),
            image.width(),
            image.height()
        )));
    }

    let full = op.apply(image)?;
    Ok(Raster::from_fn(
        image.width(),
        image.height(),
        image.max_value(),
        |x, y| {
            if mask.pixel(x, y) == BLACK {
                full.pixel(x, y)
            } else {
                image.pixel(x, y)
            }
        },
    ))
}

/// [`apply_mask`] with the operation given by name.
pub fn apply_mask_named(image: &Raster, mask: &Raster, op_name: &str) -> OpResult<Raster> {
    apply_mask(image, mask, MaskableOp::from_name(op_name)?)
}

/// Transformed pixels left of `floor(width · percent / 100)`, original pixels
/// from there on.
pub fn split_view(original: &Raster, transformed: &Raster, percent: Percent) -> OpResult<Raster> {
    check_input(original, "original")?;
    check_input(transformed, "transformed")?;
    if !original.same_size(transformed) || original.max_value() != transformed.max_value() {
        return Err(OpError::dimension_mismatch(
            "split view needs rasters of equal size and ceiling",
        ));
    }

    let boundary = split_column(original.width(), percent.value());
    Ok(Raster::from_fn(
        original.width(),
        original.height(),
        original.max_value(),
        |x, y| {
            if x < boundary {
                transformed.pixel(x, y)
            } else {
                original.pixel(x, y)
            }
        },
    ))
}
