//! Typed parameters for the operation library.
//!
//! Range checks live in the constructors, so an operation that receives one of
//! these types never has to re-validate it.
//!
//! ## Types
//!
//! - [`Component`]: which channel or channel combination to extract.
//! - [`Percent`]: a value in `[0, 100]`, used by compression and split view.
//! - [`Levels`]: black/mid/white points for the levels curve.
//! - [`ColorCorrection`]: histogram clipping for colour correction.

use crate::error::{OpError, OpResult};
use std::fmt;
use std::str::FromStr;

/// Component extracted into all three output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Red,
    Green,
    Blue,
    /// BT.709 weighted sum.
    Luma,
    /// Integer mean of the channels.
    Intensity,
    /// Largest channel.
    Value,
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::Red,
        Component::Green,
        Component::Blue,
        Component::Luma,
        Component::Intensity,
        Component::Value,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Component::Red => "red",
            Component::Green => "green",
            Component::Blue => "blue",
            Component::Luma => "luma",
            Component::Intensity => "intensity",
            Component::Value => "value",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Component {
    type Err = OpError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Component::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| OpError::unsupported(format!("unknown component '{s}'")))
    }
}

/// A percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percent(f64);

impl Percent {
    pub fn new(value: f64) -> OpResult<Self> {
        if !(0.0..=100.0).contains(&value) {
            return Err(OpError::invalid_argument(format!(
                "percentage must be within [0, 100], got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Black, mid and white points of a levels adjustment.
///
/// Checked against a raster's ceiling when applied, since the same points may
/// be reused on rasters with different `max_value`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    pub black: u32,
    pub mid: u32,
    pub white: u32,
}

impl Levels {
    pub fn new(black: u32, mid: u32, white: u32) -> Self {
        Self { black, mid, white }
    }

    /// Require `0 <= black < mid < white <= max_value`.
    pub fn check(&self, max_value: u32) -> OpResult<()> {
        if self.black < self.mid && self.mid < self.white && self.white <= max_value {
            Ok(())
        } else {
            Err(OpError::invalid_argument(format!(
                "levels need black < mid < white <= {max_value}, got {} {} {}",
                self.black, self.mid, self.white
            )))
        }
    }
}

/// Histogram clipping used by colour correction.
///
/// A channel value `v` is counted only when `clip < v < max_value - clip`,
/// which keeps blown-out and crushed pixels from dominating the peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCorrection {
    pub clip: u32,
}

impl ColorCorrection {
    pub const DEFAULT_CLIP: u32 = 10;

    pub fn new(clip: u32) -> Self {
        Self { clip }
    }

    /// Whether `value` falls inside the counted range for `max_value`.
    pub fn is_meaningful(&self, value: u32, max_value: u32) -> bool {
        value > self.clip && value.saturating_add(self.clip) < max_value
    }
}

impl Default for ColorCorrection {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CLIP)
    }
}
