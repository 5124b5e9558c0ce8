//! Operations that move pixels without changing their values.

use super::calculations::downscale_source_index;
use super::check_input;
use crate::error::{OpError, OpResult};
use crate::raster::Raster;

/// Mirror left to right.
pub fn flip_horizontal(raster: &Raster) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let last = raster.width() - 1;
    Ok(Raster::from_fn(
        raster.width(),
        raster.height(),
        raster.max_value(),
        |x, y| raster.pixel(last - x, y),
    ))
}

/// Mirror top to bottom.
pub fn flip_vertical(raster: &Raster) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let last = raster.height() - 1;
    Ok(Raster::from_fn(
        raster.width(),
        raster.height(),
        raster.max_value(),
        |x, y| raster.pixel(x, last - y),
    ))
}

/// Nearest-sample shrink to `width × height`.
///
/// Each output pixel copies one source pixel chosen by
/// [`downscale_source_index`] on each axis, so the four corners of the source
/// always survive. Enlarging is not supported.
pub fn downscale(raster: &Raster, width: u32, height: u32) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let (src_w, src_h) = raster.dimensions();
    if width == 0 || height == 0 || width > src_w || height > src_h {
        return Err(OpError::invalid_argument(format!(
            "cannot downscale {src_w}x{src_h} to {width}x{height}: \
             target must be non-zero and no larger than the source"
        )));
    }

    let columns: Vec<u32> = (0..width)
        .map(|x| downscale_source_index(x, src_w, width))
        .collect();
    let rows: Vec<u32> = (0..height)
        .map(|y| downscale_source_index(y, src_h, height))
        .collect();

    Ok(Raster::from_fn(width, height, raster.max_value(), |x, y| {
        raster.pixel(columns[x as usize], rows[y as usize])
    }))
}
