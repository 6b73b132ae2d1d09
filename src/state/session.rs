//! Annotation session state machine.
//!
//! The session owns the annotation map, the Image Set of the opened folder,
//! the cursor into it and the decoded bitmaps for the image under the cursor.
//! Every operation runs to completion and returns a snapshot for rendering.
//!
//! ```text
//!   Empty --open_folder (images found)--> Loaded
//!   Loaded --next / previous / select_class--> Loaded
//!   Loaded --open_folder (no images)--> Empty
//! ```

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::AppConfig;
use crate::data::{DecodeError, ImageDecoder, resize_nearest};
use crate::format::{AnnotationMap, CsvStore, StoreError};
use crate::scaling::{OriginalDisplay, Preview, decide_original_display, decide_preview};
use crate::state::ImageSet;

/// Errors returned by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The operation needs an opened folder with at least one image
    #[error("No images loaded")]
    NoImages,

    /// Class index outside the configured range
    #[error("Class index {index} is out of range (0..{class_count})")]
    InvalidClass { index: usize, class_count: usize },

    /// The folder could not be listed
    #[error("Failed to read folder {path:?}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Loading or persisting the store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of opening a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderOutcome {
    /// Folder contained images; the cursor is on the first one.
    Loaded { count: usize },
    /// No recognized images; the session is now empty.
    NoImages,
}

/// Bitmaps and display descriptors for one successfully decoded image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub original: OriginalDisplay,
    pub preview: Preview,
    original_bitmap: Option<DynamicImage>,
    preview_bitmap: DynamicImage,
}

impl DecodedImage {
    fn new(img: DynamicImage, preview_bound: u32, original_bound: u32) -> Self {
        let (width, height) = (img.width(), img.height());
        let original = decide_original_display(width, height, original_bound);
        let preview = decide_preview(width, height, preview_bound);
        let preview_bitmap = resize_nearest(&img, preview.width, preview.height);

        Self {
            original,
            preview,
            original_bitmap: original.show.then_some(img),
            preview_bitmap,
        }
    }

    /// Native bitmap, present only when the original pane draws it.
    pub fn original_bitmap(&self) -> Option<&DynamicImage> {
        self.original_bitmap.as_ref()
    }

    /// Preview bitmap sized to the preview bound.
    pub fn preview_bitmap(&self) -> &DynamicImage {
        &self.preview_bitmap
    }
}

/// The image under the cursor.
#[derive(Debug, Clone)]
pub enum CurrentImage {
    Decoded(DecodedImage),
    /// Decoding failed. Only this image is affected.
    Failed(DecodeError),
}

/// Progress counters shown alongside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based position of the cursor.
    pub position: usize,
    /// Number of images in the folder.
    pub total: usize,
    /// Number of entries in the annotation map.
    pub annotated: usize,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Image {} / {} ({} annotated)",
            self.position, self.total, self.annotated
        )
    }
}

/// Render-ready snapshot of the image under the cursor.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    pub filename: &'a str,
    pub image: &'a CurrentImage,
    /// Recorded class for this image, `None` if unlabeled.
    pub selection: Option<usize>,
    pub progress: Progress,
}

impl ImageView<'_> {
    /// One-line caption with filename and both sizes.
    pub fn caption(&self) -> String {
        match self.image {
            CurrentImage::Decoded(img) => format!(
                "{} - Original: {}x{}px | Resized: {}x{}px",
                self.filename,
                img.original.width,
                img.original.height,
                img.preview.width,
                img.preview.height
            ),
            CurrentImage::Failed(e) => format!("{} - {}", self.filename, e),
        }
    }
}

#[derive(Debug)]
enum SessionState {
    Empty,
    Loaded(LoadedFolder),
}

#[derive(Debug)]
struct LoadedFolder {
    images: ImageSet,
    cursor: usize,
    current: CurrentImage,
}

/// A labeling session over one store and, at any time, one folder.
pub struct Session<D> {
    config: AppConfig,
    store: CsvStore,
    decoder: D,
    annotations: AnnotationMap,
    state: SessionState,
    dirty: bool,
}

impl<D: ImageDecoder> Session<D> {
    /// Create a session over an already loaded annotation map.
    pub fn new(config: AppConfig, store: CsvStore, decoder: D, annotations: AnnotationMap) -> Self {
        Self {
            config,
            store,
            decoder,
            annotations,
            state: SessionState::Empty,
            dirty: false,
        }
    }

    /// Load the store and create an empty session over it.
    pub fn open(config: AppConfig, store: CsvStore, decoder: D) -> Result<Self, StoreError> {
        let annotations = store.load(config.class_count())?;
        Ok(Self::new(config, store, decoder, annotations))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &CsvStore {
        &self.store
    }

    /// The full annotation map, including images outside the open folder.
    pub fn annotations(&self) -> &AnnotationMap {
        &self.annotations
    }

    /// True when no folder with images is open.
    pub fn is_empty(&self) -> bool {
        matches!(self.state, SessionState::Empty)
    }

    /// Cursor position, `None` when empty.
    pub fn cursor(&self) -> Option<usize> {
        match &self.state {
            SessionState::Empty => None,
            SessionState::Loaded(folder) => Some(folder.cursor),
        }
    }

    /// Images of the open folder, `None` when empty.
    pub fn image_set(&self) -> Option<&ImageSet> {
        match &self.state {
            SessionState::Empty => None,
            SessionState::Loaded(folder) => Some(&folder.images),
        }
    }

    /// Whether the last save failed and the store is behind the map.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Scan `path` and replace the Image Set.
    ///
    /// The annotation map is never touched. A folder without images leaves
    /// the session empty and is reported as `FolderOutcome::NoImages`. A folder
    /// that cannot be read is an error and the previous state is kept.
    pub fn open_folder(&mut self, path: &Path) -> Result<FolderOutcome, SessionError> {
        let images = ImageSet::scan(path).map_err(|source| SessionError::Scan {
            path: path.to_path_buf(),
            source,
        })?;

        if images.is_empty() {
            log::warn!("No images found in folder {:?}", path);
            self.state = SessionState::Empty;
            return Ok(FolderOutcome::NoImages);
        }

        let count = images.len();
        let current = self.decode_at(&images, 0);
        self.state = SessionState::Loaded(LoadedFolder {
            images,
            cursor: 0,
            current,
        });
        Ok(FolderOutcome::Loaded { count })
    }

    /// Snapshot of the image under the cursor, `None` when empty.
    pub fn current_view(&self) -> Option<ImageView<'_>> {
        let SessionState::Loaded(folder) = &self.state else {
            return None;
        };
        let filename = folder.images.get(folder.cursor)?;

        Some(ImageView {
            filename,
            image: &folder.current,
            selection: self.annotations.get(filename).copied(),
            progress: Progress {
                position: folder.cursor + 1,
                total: folder.images.len(),
                annotated: self.annotations.len(),
            },
        })
    }

    /// Label the current image with `index` and persist the store.
    ///
    /// The label stays in memory even when the save fails; the error is
    /// returned and `is_dirty` reports the pending write until a later
    /// save succeeds.
    pub fn select_class(&mut self, index: usize) -> Result<ImageView<'_>, SessionError> {
        let class_count = self.config.class_count();
        if index >= class_count {
            return Err(SessionError::InvalidClass { index, class_count });
        }

        let filename = self
            .current_filename()
            .ok_or(SessionError::NoImages)?
            .to_string();

        log::debug!(
            "Labeled {} as {} ({})",
            filename,
            index,
            self.config.class_name(index).unwrap_or_default()
        );
        self.annotations.insert(filename, index);
        self.save()?;

        self.current_view().ok_or(SessionError::NoImages)
    }

    /// Move to the next image. No-op on the last one.
    pub fn next(&mut self) -> Result<ImageView<'_>, SessionError> {
        self.step(1)
    }

    /// Move to the previous image. No-op on the first one.
    pub fn previous(&mut self) -> Result<ImageView<'_>, SessionError> {
        self.step(-1)
    }

    /// Count of labels per class index over the whole annotation map.
    pub fn statistics(&self) -> Vec<usize> {
        let mut counts = vec![0; self.config.class_count()];
        for &class_index in self.annotations.values() {
            if let Some(count) = counts.get_mut(class_index) {
                *count += 1;
            }
        }
        counts
    }

    /// Statistics paired with class names, in key order.
    pub fn labeled_statistics(&self) -> Vec<(&str, usize)> {
        self.config
            .classes()
            .iter()
            .map(String::as_str)
            .zip(self.statistics())
            .collect()
    }

    /// Write the full annotation map to the store.
    pub fn save(&mut self) -> Result<(), SessionError> {
        match self.store.save(&self.annotations, self.config.classes()) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to save annotations: {}", e);
                self.dirty = true;
                Err(e.into())
            }
        }
    }

    fn current_filename(&self) -> Option<&str> {
        match &self.state {
            SessionState::Empty => None,
            SessionState::Loaded(folder) => folder.images.get(folder.cursor),
        }
    }

    fn step(&mut self, delta: isize) -> Result<ImageView<'_>, SessionError> {
        let SessionState::Loaded(folder) = &self.state else {
            return Err(SessionError::NoImages);
        };

        let last = folder.images.len() - 1;
        let target = folder.cursor.saturating_add_signed(delta).min(last);
        if target != folder.cursor {
            let current = self.decode_at(&folder.images, target);
            if let SessionState::Loaded(folder) = &mut self.state {
                folder.cursor = target;
                folder.current = current;
            }
        }

        self.current_view().ok_or(SessionError::NoImages)
    }

    fn decode_at(&self, images: &ImageSet, index: usize) -> CurrentImage {
        let Some(path) = images.path_of(index) else {
            return CurrentImage::Failed(DecodeError::new(images.folder(), "index out of range"));
        };

        match self.decoder.decode(&path) {
            Ok(img) => CurrentImage::Decoded(DecodedImage::new(
                img,
                self.config.resized_image_size(),
                self.config.max_original_display_size(),
            )),
            Err(e) => {
                log::warn!("{}", e);
                CurrentImage::Failed(e)
            }
        }
    }
}
