//! Habit Tagger - single-label image annotation
//!
//! Labels each image of a folder with exactly one of up to nine classes and
//! keeps the labels in a resumable CSV store.
//!
//! - [`config`]: startup configuration and its validation
//! - [`format`]: the CSV annotation store
//! - [`scaling`]: how source images map to the two display panes
//! - [`data`]: image decoding
//! - [`state`]: the annotation session state machine
//! - [`keybindings`]: keyboard shortcuts for the terminal front end

pub mod config;
pub mod data;
pub mod format;
pub mod keybindings;
pub mod scaling;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use format::{AnnotationMap, CsvStore, StoreError};
pub use state::{FolderOutcome, ImageView, Session, SessionError};
