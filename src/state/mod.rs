//! Session state management modules.

mod project;
mod session;

pub use project::{IMAGE_EXTENSIONS, ImageSet, is_image_filename};
pub use session::{
    CurrentImage, DecodedImage, FolderOutcome, ImageView, Progress, Session, SessionError,
};
