//! Splitting a raster into per-channel rasters and combining them back.

use super::check_input;
use super::params::Component;
use super::tone::extract_component;
use crate::error::{OpError, OpResult};
use crate::raster::Raster;

/// Take channel 0 from `red`, channel 1 from `green` and channel 2 from
/// `blue`.
///
/// All three rasters must agree on width, height and `max_value`.
pub fn combine(red: &Raster, green: &Raster, blue: &Raster) -> OpResult<Raster> {
    check_input(red, "red")?;
    check_input(green, "green")?;
    check_input(blue, "blue")?;

    for (role, other) in [("green", green), ("blue", blue)] {
        if !red.same_size(other) || red.max_value() != other.max_value() {
            return Err(OpError::dimension_mismatch(format!(
                "{role} source is {}x{} (max {}), red source is {}x{} (max {})",
                other.width(),
                other.height(),
                other.max_value(),
                red.width(),
                red.height(),
                red.max_value()
            )));
        }
    }

    Ok(Raster::from_fn(
        red.width(),
        red.height(),
        red.max_value(),
        |x, y| [red.pixel(x, y)[0], green.pixel(x, y)[1], blue.pixel(x, y)[2]],
    ))
}

/// Red, green and blue component rasters, in that order.
pub fn split_channels(raster: &Raster) -> OpResult<[Raster; 3]> {
    Ok([
        extract_component(raster, Component::Red)?,
        extract_component(raster, Component::Green)?,
        extract_component(raster, Component::Blue)?,
    ])
}
