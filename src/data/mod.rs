//! Image decoding collaborator.
//!
//! - `ImageDecoder`: trait the session decodes through
//! - `FileDecoder`: filesystem implementation backed by the `image` crate
//! - `resize_nearest`: nearest-neighbour resampling used for the preview

mod decoder;

pub use decoder::{DecodeError, FileDecoder, ImageDecoder, resize_nearest};
