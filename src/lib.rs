//! # rasterscript
//!
//! A deterministic raster transform engine driven by a line-oriented command
//! language. Images are plain pixel grids; every operation takes rasters in
//! and hands a new raster back.
//!
//! # Architecture
//!
//! ```text
//! script line ─► command::parse_line ─► Command
//!                                         │
//!                Interpreter ◄────────────┘
//!                 │   registry: name → Raster
//!                 │   codec:    load / save (external files)
//!                 ▼
//!               ops::* / mask::*  ─► new Raster ─► registry
//! ```
//!
//! - The operation library ([`ops`], [`mask`]) is pure: identical inputs give
//!   identical outputs and inputs are never mutated.
//! - The [`interpreter`] is the only stateful piece. Each instance owns its
//!   own [`registry::Registry`], so several can run side by side.
//! - File formats live behind the [`codec::RasterCodec`] trait. The kernels
//!   never see a file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`raster`] | The `Raster` value type: geometry, ceiling, validation |
//! | [`ops`] | Tone, filter, geometry, wavelet compression, channel and histogram operations |
//! | [`mask`] | Mask compositing and the split-view preview |
//! | [`registry`] | Name → raster storage for one session |
//! | [`command`] | The textual protocol: tokenizing and typed `Command`s |
//! | [`interpreter`] | Executes commands, runs scripts, applies the error policy |
//! | [`codec`] | Image file import/export on the `image` crate |
//! | [`config`] | `rasterscript.toml` loading, merging and validation |
//! | [`error`] | Shared error categories and the operation error type |
//! | [`output`] | CLI output formatting |
//!
//! # Numeric Conventions
//!
//! Channel values are `u32` in `[0, max_value]`. Whenever arithmetic leaves
//! the integers (filters, sepia, levels, the wavelet) the result is rounded
//! half up and clamped back into range, so no operation can produce an
//! out-of-range raster.

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod mask;
pub mod ops;
pub mod output;
pub mod raster;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_helpers;
