//! Image Set discovery for an opened folder.

use std::path::{Path, PathBuf};

/// Recognized image extensions, matched case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff"];

/// Check if a filename has a recognized image extension.
pub fn is_image_filename(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Ordered, immutable list of image filenames found in one folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSet {
    folder: PathBuf,
    images: Vec<String>,
}

impl ImageSet {
    /// Scan `folder` non-recursively for recognized image files.
    ///
    /// Names are sorted lexicographically. The result may be empty.
    pub fn scan(folder: &Path) -> std::io::Result<Self> {
        let mut images: Vec<String> = std::fs::read_dir(folder)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_image_filename(name))
            .collect();

        images.sort();

        log::info!("Scanned folder {:?}: found {} images", folder, images.len());

        Ok(Self {
            folder: folder.to_path_buf(),
            images,
        })
    }

    /// Folder the set was scanned from.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Filenames in display order.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Filename at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.images.get(index).map(String::as_str)
    }

    /// Full path of the image at `index`.
    pub fn path_of(&self, index: usize) -> Option<PathBuf> {
        self.get(index).map(|name| self.folder.join(name))
    }
}
