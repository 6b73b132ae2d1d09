//! Image decoding for the annotation session.
//!
//! Decoding sits behind the `ImageDecoder` trait so the session can be driven
//! by a stub in tests and by `FileDecoder` in the application.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use image::imageops::FilterType;

/// Error raised when a single image cannot be opened or decoded.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Cannot load image {path:?}: {message}")]
pub struct DecodeError {
    /// Image that failed.
    pub path: PathBuf,
    /// Human-readable cause.
    pub message: String,
}

impl DecodeError {
    /// Create a new decode error for `path`.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Source of decoded bitmaps.
pub trait ImageDecoder {
    /// Decode the image at `path`.
    fn decode(&self, path: &Path) -> Result<DynamicImage, DecodeError>;
}

/// Decoder reading images from disk with the `image` crate.
///
/// The format is guessed from the file contents, so a mislabeled extension
/// still decodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
        let reader = image::ImageReader::open(path)
            .map_err(|e| DecodeError::new(path, e.to_string()))?
            .with_guessed_format()
            .map_err(|e| DecodeError::new(path, e.to_string()))?;

        let img = reader
            .decode()
            .map_err(|e| DecodeError::new(path, e.to_string()))?;

        log::trace!(
            "FileDecoder: decoded {:?} ({}x{})",
            path,
            img.width(),
            img.height()
        );
        Ok(img)
    }
}

/// Resize to exactly `width` x `height` with nearest-neighbour sampling.
///
/// Nearest keeps hard pixel edges when enlarging small particle images.
pub fn resize_nearest(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if img.width() == width && img.height() == height {
        return img.clone();
    }
    img.resize_exact(width, height, FilterType::Nearest)
}
