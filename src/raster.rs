//! The raster value type.
//!
//! A [`Raster`] is an immutable `width × height` grid of three-channel pixels,
//! each channel bounded by `max_value`. Pixels are stored row-major in a single
//! flat buffer sized up front; every operation in [`ops`](crate::ops) reads one
//! raster and builds a fresh one.
//!
//! Construction is the only place invariants are established:
//!
//! - `width > 0`, `height > 0`, `max_value > 0`
//! - `pixels.len() == width * height`
//! - every channel lies in `[0, max_value]`
//!
//! After that a raster can only be read, cloned, or dropped.

use crate::error::{OpError, OpResult};

/// One pixel: three channel intensities, conventionally red, green, blue.
pub type Pixel = [u32; 3];

/// The selector value used by masks.
pub const BLACK: Pixel = [0, 0, 0];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    max_value: u32,
    pixels: Vec<Pixel>,
}

impl Raster {
    /// Build a raster from a row-major pixel buffer.
    pub fn new(width: u32, height: u32, max_value: u32, pixels: Vec<Pixel>) -> OpResult<Self> {
        let expected = pixel_count(width, height)?;
        if max_value == 0 {
            return Err(OpError::invalid_argument("max_value must be positive"));
        }
        if pixels.len() != expected {
            return Err(OpError::InvalidDimensions(format!(
                "{width}x{height} raster needs {expected} pixels, got {}",
                pixels.len()
            )));
        }
        let raster = Self {
            width,
            height,
            max_value,
            pixels,
        };
        raster.validate()?;
        Ok(raster)
    }

    /// Build a raster from nested rows (`rows[y][x]`).
    ///
    /// Height is the number of rows; width is the length of the first row.
    /// Ragged rows are rejected.
    pub fn from_rows(max_value: u32, rows: &[Vec<Pixel>]) -> OpResult<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some(y) = rows.iter().position(|row| row.len() != width) {
            return Err(OpError::InvalidDimensions(format!(
                "row {y} has {} pixels, expected {width}",
                rows[y].len()
            )));
        }
        let width = u32::try_from(width)
            .map_err(|_| OpError::InvalidDimensions("width exceeds u32".into()))?;
        let height = u32::try_from(height)
            .map_err(|_| OpError::InvalidDimensions("height exceeds u32".into()))?;
        Self::new(width, height, max_value, rows.concat())
    }

    /// A raster where every pixel is `pixel`.
    pub fn filled(width: u32, height: u32, max_value: u32, pixel: Pixel) -> OpResult<Self> {
        let count = pixel_count(width, height)?;
        Self::new(width, height, max_value, vec![pixel; count])
    }

    /// Build a raster by evaluating `f(x, y)` for every cell.
    ///
    /// Callers guarantee `f` only yields in-range channels; operations get
    /// that from [`round_clamp`](crate::ops::calculations::round_clamp) or
    /// by copying channels out of an already-valid raster.
    pub(crate) fn from_fn(
        width: u32,
        height: u32,
        max_value: u32,
        mut f: impl FnMut(u32, u32) -> Pixel,
    ) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        let raster = Self {
            width,
            height,
            max_value,
            pixels,
        };
        debug_assert!(raster.validate().is_ok(), "operation produced an invalid raster");
        raster
    }

    /// Same geometry and ceiling as `self`, pixels mapped one to one.
    pub(crate) fn map_pixels(&self, mut f: impl FnMut(Pixel) -> Pixel) -> Self {
        let pixels: Vec<Pixel> = self.pixels.iter().map(|&p| f(p)).collect();
        let raster = Self {
            width: self.width,
            height: self.height,
            max_value: self.max_value,
            pixels,
        };
        debug_assert!(raster.validate().is_ok(), "operation produced an invalid raster");
        raster
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel at column `x`, row `y`. Panics when out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        self.pixels[self.index(x, y)]
    }

    /// Pixel at column `x`, row `y`, or `None` when out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        (x < self.width && y < self.height).then(|| self.pixel(x, y))
    }

    /// Row-major pixel buffer.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> {
        self.pixels.chunks_exact(self.width as usize)
    }

    /// Nested copy of the grid (`rows[y][x]`), mostly for tests and display.
    pub fn to_rows(&self) -> Vec<Vec<Pixel>> {
        self.rows().map(<[Pixel]>::to_vec).collect()
    }

    /// True when `other` has the same width and height.
    pub fn same_size(&self, other: &Raster) -> bool {
        self.dimensions() == other.dimensions()
    }

    /// Re-check every construction invariant.
    pub fn validate(&self) -> OpResult<()> {
        let expected = pixel_count(self.width, self.height)?;
        if self.pixels.len() != expected {
            return Err(OpError::InvalidDimensions(format!(
                "{}x{} raster holds {} pixels",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        for (i, pixel) in self.pixels.iter().enumerate() {
            if let Some(&value) = pixel.iter().find(|&&c| c > self.max_value) {
                let i = i as u32;
                return Err(OpError::ChannelOutOfRange {
                    x: i % self.width,
                    y: i / self.width,
                    value,
                    max_value: self.max_value,
                });
            }
        }
        Ok(())
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} raster",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }
}

fn pixel_count(width: u32, height: u32) -> OpResult<usize> {
    if width == 0 || height == 0 {
        return Err(OpError::InvalidDimensions(format!(
            "width and height must be positive, got {width}x{height}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| OpError::InvalidDimensions(format!("{width}x{height} overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn new_rejects_zero_width() {
        let err = Raster::new(0, 2, 255, vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDimensions);
    }

    #[test]
    fn new_rejects_wrong_buffer_length() {
        let err = Raster::new(2, 2, 255, vec![BLACK; 3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDimensions);
    }

    #[test]
    fn new_rejects_channel_above_max() {
        let err = Raster::new(2, 1, 100, vec![[0, 0, 0], [10, 101, 0]]).unwrap_err();
        assert_eq!(
            err,
            OpError::ChannelOutOfRange {
                x: 1,
                y: 0,
                value: 101,
                max_value: 100
            }
        );
    }

    #[test]
    fn new_rejects_zero_max_value() {
        let err = Raster::new(1, 1, 0, vec![BLACK]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn from_rows_reads_height_then_width() {
        let raster = Raster::from_rows(
            255,
            &[vec![[10, 20, 30]], vec![[40, 50, 60]], vec![[70, 80, 90]]],
        )
        .unwrap();
        assert_eq!(raster.dimensions(), (1, 3));
        assert_eq!(raster.pixel(0, 2), [70, 80, 90]);
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let err = Raster::from_rows(255, &[vec![BLACK, BLACK], vec![BLACK]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDimensions);
    }

    #[test]
    fn from_rows_rejects_empty() {
        let err = Raster::from_rows(255, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDimensions);
    }

    #[test]
    fn get_is_bounds_checked() {
        let raster = Raster::filled(2, 2, 255, [1, 2, 3]).unwrap();
        assert_eq!(raster.get(1, 1), Some([1, 2, 3]));
        assert_eq!(raster.get(2, 0), None);
    }

    #[test]
    fn to_rows_round_trips() {
        let rows = vec![vec![[1, 2, 3], [4, 5, 6]], vec![[7, 8, 9], [10, 11, 12]]];
        let raster = Raster::from_rows(255, &rows).unwrap();
        assert_eq!(raster.to_rows(), rows);
    }
}
