//! Raster import and export.
//!
//! The transform core never reads or writes files. The interpreter goes
//! through a [`RasterCodec`] for `load` and `save`, so tests can swap in the
//! in-memory [`MockCodec`](tests::MockCodec).
//!
//! ## Formats
//!
//! | Extension | Format |
//! |---|---|
//! | `png` | PNG |
//! | `jpg`, `jpeg` | JPEG |
//! | `ppm`, `pgm`, `pbm`, `pnm` | PNM (written as binary PPM) |
//! | `bmp` | BMP |
//! | `tif`, `tiff` | TIFF |
//!
//! Decoded images are converted to 8-bit RGB, so loaded rasters always have a
//! ceiling of 255. Rasters with any other ceiling are rescaled to 8 bits on
//! save.

use crate::error::ErrorKind;
use crate::ops::calculations::round_clamp;
use crate::raster::{Pixel, Raster};
use image::{ImageFormat, ImageReader, RgbImage};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: String, message: String },
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::UnsupportedFormat(_) => ErrorKind::UnsupportedOption,
            CodecError::Io(_) | CodecError::Decode { .. } | CodecError::Encode { .. } => {
                ErrorKind::Io
            }
        }
    }
}

/// Loads rasters from, and saves rasters to, some external store.
pub trait RasterCodec {
    fn load(&self, path: &Path) -> Result<Raster, CodecError>;

    fn save(&self, raster: &Raster, path: &Path) -> Result<(), CodecError>;
}

const FORMATS: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("ppm", ImageFormat::Pnm),
    ("pgm", ImageFormat::Pnm),
    ("pbm", ImageFormat::Pnm),
    ("pnm", ImageFormat::Pnm),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
];

/// Extensions [`ImageCodec`] understands, lowercase.
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    FORMATS.iter().map(|(ext, _)| *ext)
}

/// Format for `path`, chosen by extension (case-insensitive).
pub fn format_for_path(path: &Path) -> Result<ImageFormat, CodecError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| CodecError::UnsupportedFormat(path.display().to_string()))?;
    FORMATS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, format)| *format)
        .ok_or_else(|| CodecError::UnsupportedFormat(ext.to_string()))
}

/// File codec built on the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }
}

impl RasterCodec for ImageCodec {
    fn load(&self, path: &Path) -> Result<Raster, CodecError> {
        let format = format_for_path(path)?;
        let decode_error = |message: String| CodecError::Decode {
            path: path.display().to_string(),
            message,
        };

        let mut reader = ImageReader::open(path)?;
        reader.set_format(format);
        let rgb = reader.decode().map_err(|e| decode_error(e.to_string()))?.to_rgb8();

        let (width, height) = rgb.dimensions();
        let pixels: Vec<Pixel> = rgb.pixels().map(|p| p.0.map(u32::from)).collect();
        Raster::new(width, height, 255, pixels).map_err(|e| decode_error(e.to_string()))
    }

    fn save(&self, raster: &Raster, path: &Path) -> Result<(), CodecError> {
        let format = format_for_path(path)?;
        let encoded = to_rgb8(raster);
        encoded
            .save_with_format(path, format)
            .map_err(|e| CodecError::Encode {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }
}

/// Pack a raster into 8-bit RGB, rescaling when its ceiling is not 255.
pub fn to_rgb8(raster: &Raster) -> RgbImage {
    let max = raster.max_value();
    let mut bytes = Vec::with_capacity(raster.pixels().len() * 3);
    for pixel in raster.pixels() {
        for &channel in pixel {
            let value = if max == 255 {
                channel
            } else {
                round_clamp(channel as f64 * 255.0 / max as f64, 255)
            };
            bytes.push(value as u8);
        }
    }
    RgbImage::from_fn(raster.width(), raster.height(), |x, y| {
        let i = ((y * raster.width() + x) * 3) as usize;
        image::Rgb([bytes[i], bytes[i + 1], bytes[i + 2]])
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory codec that records every call.
    ///
    /// Saved rasters can be loaded back under the same path.
    #[derive(Default)]
    pub struct MockCodec {
        pub files: Mutex<HashMap<PathBuf, Raster>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Load(String),
        Save { path: String, width: u32, height: u32 },
    }

    impl MockCodec {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(path: impl Into<PathBuf>, raster: Raster) -> Self {
            let codec = Self::new();
            codec.files.lock().unwrap().insert(path.into(), raster);
            codec
        }

        pub fn file(&self, path: impl AsRef<Path>) -> Option<Raster> {
            self.files.lock().unwrap().get(path.as_ref()).cloned()
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl RasterCodec for MockCodec {
        fn load(&self, path: &Path) -> Result<Raster, CodecError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Load(path.to_string_lossy().to_string()));
            self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
                CodecError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no mock file at {}", path.display()),
                ))
            })
        }

        fn save(&self, raster: &Raster, path: &Path) -> Result<(), CodecError> {
            self.operations.lock().unwrap().push(RecordedOp::Save {
                path: path.to_string_lossy().to_string(),
                width: raster.width(),
                height: raster.height(),
            });
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), raster.clone());
            Ok(())
        }
    }

    // =========================================================================
    // mock
    // =========================================================================

    #[test]
    fn mock_round_trips_saved_raster() {
        let codec = MockCodec::new();
        let image = uniform(2, 1, [1, 2, 3]);
        codec.save(&image, Path::new("out.png")).unwrap();
        assert_eq!(codec.load(Path::new("out.png")).unwrap(), image);
        assert_eq!(
            codec.get_operations(),
            vec![
                RecordedOp::Save {
                    path: "out.png".to_string(),
                    width: 2,
                    height: 1
                },
                RecordedOp::Load("out.png".to_string()),
            ]
        );
    }

    #[test]
    fn mock_missing_file_is_io_error() {
        let err = MockCodec::new().load(Path::new("missing.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    // =========================================================================
    // formats
    // =========================================================================

    #[test]
    fn format_by_extension_ignores_case() {
        assert_eq!(format_for_path(Path::new("a.PNG")).unwrap(), ImageFormat::Png);
        assert_eq!(format_for_path(Path::new("a.jpeg")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(format_for_path(Path::new("dir/a.ppm")).unwrap(), ImageFormat::Pnm);
    }

    #[test]
    fn every_listed_extension_resolves() {
        for ext in supported_extensions() {
            let path = format!("image.{}", ext.to_uppercase());
            assert!(format_for_path(Path::new(&path)).is_ok(), "{path}");
        }
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        for path in ["a.gif", "a.webp", "noext"] {
            let err = format_for_path(Path::new(path)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedOption, "{path}");
        }
    }

    #[test]
    fn rgb8_rescales_other_ceilings() {
        let image = Raster::from_rows(100, &[vec![[0, 50, 100]]]).unwrap();
        let packed = to_rgb8(&image);
        assert_eq!(packed.get_pixel(0, 0).0, [0, 128, 255]);
    }

    // =========================================================================
    // image codec on disk
    // =========================================================================

    #[test]
    fn png_round_trip_is_exact() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("sample.png");
        let image = sample_raster(5, 3, 42);
        let codec = ImageCodec::new();
        codec.save(&image, &path).unwrap();
        assert_eq!(codec.load(&path).unwrap(), image);
    }

    #[test]
    fn ppm_round_trip_is_exact() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("sample.ppm");
        let image = sample_raster(4, 4, 7);
        let codec = ImageCodec::new();
        codec.save(&image, &path).unwrap();
        assert_eq!(codec.load(&path).unwrap(), image);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = ImageCodec::new()
            .load(&tmp.path().join("absent.png"))
            .unwrap_err();
        assert!(matches!(err, CodecError::Io(_)));
    }

    #[test]
    fn load_garbage_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = ImageCodec::new().load(&path).unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }
}
