//! Annotation store.
//!
//! The store is a flat CSV file mapping image filenames to a single class
//! index. It is loaded once at startup and fully rewritten on every change.
//!
//! ## File Format
//!
//! ```text
//! filename,class_index,class_name
//! img_0001.png,0,column
//! img_0002.png,2,irregular
//! ```
//!
//! Rows are sorted by filename. Entries for images outside the currently
//! opened folder are kept.

mod csv_store;
mod error;

use std::collections::BTreeMap;

pub use csv_store::{CsvStore, HEADER, read_from, to_bytes};
pub use error::StoreError;

/// Filename to class index. Ordered so serialization is deterministic.
pub type AnnotationMap = BTreeMap<String, usize>;
