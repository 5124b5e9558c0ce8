//! Error taxonomy shared by the operation library and the interpreter.
//!
//! Each module owns its own error enum ([`OpError`] here,
//! [`CodecError`](crate::codec::CodecError),
//! [`CommandError`](crate::command::CommandError),
//! [`ConfigError`](crate::config::ConfigError)). They all map onto the same
//! small set of [`ErrorKind`]s so callers can branch on the category without
//! caring which layer failed.

use std::fmt;
use thiserror::Error;

/// Category of a failure, independent of the layer that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad parameter range, malformed numeric token, wrong operand count.
    InvalidArgument,
    /// Operands with unequal geometry or channel ceiling.
    DimensionMismatch,
    /// Unknown component, operation, or command name.
    UnsupportedOption,
    /// Registry lookup miss.
    NotFound,
    /// A channel value outside `[0, max_value]`.
    ChannelOutOfRange,
    /// Zero width or height, or a pixel buffer of the wrong length.
    InvalidDimensions,
    /// Codec or filesystem failure in an external collaborator.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::DimensionMismatch => "dimension mismatch",
            ErrorKind::UnsupportedOption => "unsupported option",
            ErrorKind::NotFound => "not found",
            ErrorKind::ChannelOutOfRange => "channel out of range",
            ErrorKind::InvalidDimensions => "invalid dimensions",
            ErrorKind::Io => "i/o",
        };
        f.write_str(name)
    }
}

/// Failure of a raster construction or a pixel operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
    #[error("Channel value {value} outside [0, {max_value}] at pixel ({x}, {y})")]
    ChannelOutOfRange {
        x: u32,
        y: u32,
        value: u32,
        max_value: u32,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("Unsupported option: {0}")]
    UnsupportedOption(String),
}

impl OpError {
    pub fn invalid_argument<T: Into<String>>(msg: T) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn dimension_mismatch<T: Into<String>>(msg: T) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    pub fn unsupported<T: Into<String>>(msg: T) -> Self {
        Self::UnsupportedOption(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OpError::InvalidDimensions(_) => ErrorKind::InvalidDimensions,
            OpError::ChannelOutOfRange { .. } => ErrorKind::ChannelOutOfRange,
            OpError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            OpError::DimensionMismatch(_) => ErrorKind::DimensionMismatch,
            OpError::UnsupportedOption(_) => ErrorKind::UnsupportedOption,
        }
    }
}

/// Result type for raster operations.
pub type OpResult<T> = std::result::Result<T, OpError>;
