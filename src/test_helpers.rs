//! Shared test utilities for the rasterscript test suite.
//!
//! Provides raster builders, a small deterministic corpus of sample rasters,
//! script fixtures on disk, and assertions with readable failure messages.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let image = raster(&[vec![[10, 20, 30], [40, 50, 60]]]);
//! let flat = uniform(3, 3, [100, 150, 200]);
//!
//! for image in sample_rasters() {
//!     assert_channels_in_range(&ops::blur(&image).unwrap());
//! }
//!
//! let tmp = script_dir(&[("main.txt", "load in.png img\nsave out.png img\n")]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::raster::{Pixel, Raster};

// =========================================================================
// Raster builders (ceiling 255)
// =========================================================================

/// Raster from rows of pixels with a ceiling of 255. Panics on bad input.
pub fn raster(rows: &[Vec<Pixel>]) -> Raster {
    Raster::from_rows(255, rows).unwrap_or_else(|e| panic!("bad test raster: {e}"))
}

/// `width × height` raster where every pixel is `pixel`.
pub fn uniform(width: u32, height: u32, pixel: Pixel) -> Raster {
    Raster::filled(width, height, 255, pixel).unwrap_or_else(|e| panic!("bad test raster: {e}"))
}

/// Pseudo-random raster, identical for identical arguments.
pub fn sample_raster(width: u32, height: u32, seed: u64) -> Raster {
    sample_raster_with_max(width, height, 255, seed)
}

pub fn sample_raster_with_max(width: u32, height: u32, max_value: u32, seed: u64) -> Raster {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) % (max_value as u64 + 1)) as u32
    };
    let pixels = (0..width * height)
        .map(|_| [next(), next(), next()])
        .collect();
    Raster::new(width, height, max_value, pixels).unwrap_or_else(|e| panic!("bad test raster: {e}"))
}

/// A handful of shapes and ceilings that every operation should cope with:
/// a single pixel, a row, a column, odd and even sizes, and a non-255
/// ceiling.
pub fn sample_rasters() -> Vec<Raster> {
    vec![
        sample_raster(1, 1, 1),
        sample_raster(5, 1, 2),
        sample_raster(1, 4, 3),
        sample_raster(3, 3, 4),
        sample_raster(6, 4, 5),
        sample_raster(7, 5, 6),
        sample_raster_with_max(4, 3, 100, 7),
    ]
}

// =========================================================================
// Script fixtures
// =========================================================================

/// Write each `(file name, contents)` pair into a fresh temp directory.
pub fn script_dir(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (name, contents) in files {
        write_file(tmp.path(), name, contents);
    }
    tmp
}

pub fn write_file(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents)
        .unwrap_or_else(|e| panic!("cannot write fixture {name}: {e}"));
}

// =========================================================================
// Assertions
// =========================================================================

/// Every channel of `raster` lies in `[0, max_value]`.
pub fn assert_channels_in_range(raster: &Raster) {
    let max = raster.max_value();
    for (i, pixel) in raster.pixels().iter().enumerate() {
        assert!(
            pixel.iter().all(|&c| c <= max),
            "pixel {i} = {pixel:?} exceeds ceiling {max}"
        );
    }
}

/// Same geometry and every channel within `tolerance` of `expected`.
pub fn assert_close(actual: &Raster, expected: &Raster, tolerance: u32) {
    assert_eq!(actual.dimensions(), expected.dimensions(), "dimensions differ");
    for (i, (a, e)) in actual.pixels().iter().zip(expected.pixels()).enumerate() {
        for c in 0..3 {
            assert!(
                a[c].abs_diff(e[c]) <= tolerance,
                "pixel {i} channel {c}: {} vs {} (tolerance {tolerance})",
                a[c],
                e[c]
            );
        }
    }
}
