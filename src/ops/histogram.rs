//! Histogram plot rendered as a raster.
//!
//! The plot is always 256×256 with a ceiling of 255: a white background, a
//! light grey grid every 32 pixels, and one line graph per channel (red,
//! green, then blue, later channels drawn on top). Bin `i` sits in column `i`
//! and its height is the bin count scaled against the tallest bin across all
//! three channels.

use super::check_input;
use crate::error::OpResult;
use crate::raster::{Pixel, Raster};

pub const PLOT_SIZE: u32 = 256;
pub const GRID_SPACING: u32 = 32;

const BACKGROUND: Pixel = [255, 255, 255];
const GRID: Pixel = [220, 220, 220];
const LINE_COLORS: [Pixel; 3] = [[255, 0, 0], [0, 255, 0], [0, 0, 255]];

/// Per-channel counts over 256 bins. A value `v` lands in bin
/// `v · 255 / max_value`.
pub fn channel_counts(raster: &Raster) -> [[u64; 256]; 3] {
    let max = raster.max_value() as u64;
    let mut counts = [[0u64; 256]; 3];
    for pixel in raster.pixels() {
        for (channel, &value) in counts.iter_mut().zip(pixel) {
            channel[(value as u64 * 255 / max) as usize] += 1;
        }
    }
    counts
}

pub fn histogram(raster: &Raster) -> OpResult<Raster> {
    check_input(raster, "source")?;
    let counts = channel_counts(raster);
    let tallest = counts.iter().flatten().copied().max().unwrap_or(0).max(1);

    let mut canvas = vec![BACKGROUND; (PLOT_SIZE * PLOT_SIZE) as usize];
    for y in 0..PLOT_SIZE {
        for x in 0..PLOT_SIZE {
            if x % GRID_SPACING == 0 || y % GRID_SPACING == 0 {
                canvas[(y * PLOT_SIZE + x) as usize] = GRID;
            }
        }
    }

    let top = (PLOT_SIZE - 1) as i64;
    for (channel, color) in counts.iter().zip(LINE_COLORS) {
        let height = |bin: usize| -> i64 {
            let scaled = channel[bin] as f64 * top as f64 / tallest as f64;
            top - scaled.round() as i64
        };
        for bin in 1..channel.len() {
            let from = (bin as i64 - 1, height(bin - 1));
            let to = (bin as i64, height(bin));
            draw_line(&mut canvas, from, to, color);
        }
    }

    Raster::new(PLOT_SIZE, PLOT_SIZE, 255, canvas)
}

/// Bresenham line between two points, inclusive of both ends.
fn draw_line(canvas: &mut [Pixel], from: (i64, i64), to: (i64, i64), color: Pixel) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let size = PLOT_SIZE as i64;

    loop {
        if (0..size).contains(&x) && (0..size).contains(&y) {
            canvas[(y * size + x) as usize] = color;
        }
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
