//! CSV annotation store.
//!
//! One row per labeled image with the header `filename,class_index,class_name`.
//! `class_index` is authoritative; `class_name` is written for readability
//! and ignored on load.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::format::AnnotationMap;
use crate::format::error::StoreError;

/// Header row written at the top of every store file.
pub const HEADER: [&str; 3] = ["filename", "class_index", "class_name"];

/// Flat-file store holding the filename to class index mapping.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Create a store backed by the file at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store, validating every class index against `class_count`.
    ///
    /// A missing file is a first run and yields an empty map. Any row that
    /// cannot be interpreted fails the whole load so no labels are silently
    /// dropped. Repeated filenames keep the last occurrence.
    pub fn load(&self, class_count: usize) -> Result<AnnotationMap, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No annotation store at {:?}, starting empty", self.path);
                return Ok(AnnotationMap::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let map = read_from(&bytes, class_count)?;
        log::info!("Loaded {} annotations from {:?}", map.len(), self.path);
        Ok(map)
    }

    /// Overwrite the store with the full map, sorted by filename.
    ///
    /// Class names are resolved from `classes` at write time. The file is
    /// written to a temporary sibling and renamed into place.
    pub fn save(&self, map: &AnnotationMap, classes: &[String]) -> Result<(), StoreError> {
        let bytes = to_bytes(map, classes)?;
        write_atomic(&self.path, &bytes).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Saved {} annotations to {:?}", map.len(), self.path);
        Ok(())
    }
}

/// Parse store contents.
pub fn read_from(bytes: &[u8], class_count: usize) -> Result<AnnotationMap, StoreError> {
    let mut map = AnnotationMap::new();

    // A zero-length file carries no rows to lose.
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(map);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| StoreError::malformed(1, e.to_string()))?
        .clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(StoreError::MissingColumn { column: name })
    };
    let filename_col = column("filename")?;
    let class_col = column("class_index")?;

    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(csv::Position::line).unwrap_or(0);
            StoreError::malformed(line, e.to_string())
        })?;
        let line = record.position().map(csv::Position::line).unwrap_or(0);

        let filename = record.get(filename_col).unwrap_or_default();
        if filename.is_empty() {
            return Err(StoreError::malformed(line, "missing filename"));
        }

        let raw_index = record.get(class_col).unwrap_or_default().trim();
        let class_index: usize = raw_index.parse().map_err(|_| {
            StoreError::malformed(
                line,
                format!("class_index '{}' is not a non-negative integer", raw_index),
            )
        })?;

        if class_index >= class_count {
            return Err(StoreError::ClassOutOfRange {
                filename: filename.to_string(),
                class_index,
                class_count,
            });
        }

        map.insert(filename.to_string(), class_index);
    }

    Ok(map)
}

/// Serialize the map to store contents.
pub fn to_bytes(map: &AnnotationMap, classes: &[String]) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for (filename, &class_index) in map {
        let class_name = classes
            .get(class_index)
            .ok_or_else(|| StoreError::UnnamedClass {
                filename: filename.clone(),
                class_index,
                class_count: classes.len(),
            })?;
        let index = class_index.to_string();
        writer.write_record([filename.as_str(), index.as_str(), class_name.as_str()])?;
    }

    writer.into_inner().map_err(|e| {
        let io = std::io::Error::new(e.error().kind(), e.error().to_string());
        StoreError::Csv(io.into())
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("annotations");
    let tmp = parent.join(format!(".{}.tmp", file_name));

    let result = std::fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| std::fs::rename(&tmp, path));

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<String> {
        vec!["column".to_string(), "plate".to_string(), "irregular".to_string()]
    }

    fn sample_map() -> AnnotationMap {
        let mut map = AnnotationMap::new();
        map.insert("b.png".to_string(), 1);
        map.insert("a.png".to_string(), 0);
        map.insert("c, with comma.png".to_string(), 2);
        map
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("annotations.csv"));
        assert!(store.load(3).unwrap().is_empty());
    }

    #[test]
    fn test_save_format() {
        let bytes = to_bytes(&sample_map(), &classes()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "filename,class_index,class_name\n\
             a.png,0,column\n\
             b.png,1,plate\n\
             \"c, with comma.png\",2,irregular\n"
        );
    }

    #[test]
    fn test_empty_map_writes_header() {
        let bytes = to_bytes(&AnnotationMap::new(), &classes()).unwrap();
        assert_eq!(bytes, b"filename,class_index,class_name\n");
        assert!(read_from(&bytes, 3).unwrap().is_empty());
    }

    #[test]
    fn test_save_load_fixed_point() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("annotations.csv"));

        store.save(&sample_map(), &classes()).unwrap();
        let first = std::fs::read(store.path()).unwrap();

        let loaded = store.load(3).unwrap();
        assert_eq!(loaded, sample_map());

        store.save(&loaded, &classes()).unwrap();
        let second = std::fs::read(store.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("annotations.csv"));

        store.save(&sample_map(), &classes()).unwrap();
        let mut smaller = AnnotationMap::new();
        smaller.insert("z.png".to_string(), 2);
        store.save(&smaller, &classes()).unwrap();

        assert_eq!(store.load(3).unwrap(), smaller);
        // No temporary file is left behind.
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_class_name_resolved_at_write_time() {
        let stored = b"filename,class_index,class_name\na.png,1,old name\n";
        let map = read_from(stored, 3).unwrap();
        assert_eq!(map.get("a.png"), Some(&1));

        let text = String::from_utf8(to_bytes(&map, &classes()).unwrap()).unwrap();
        assert!(text.contains("a.png,1,plate\n"));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let stored = b"filename,class_index,class_name\na.png,0,x\na.png,2,y\n";
        let map = read_from(stored, 3).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a.png"), Some(&2));
    }

    #[test]
    fn test_column_order_by_header() {
        let stored = b"class_index,filename\n1,a.png\n";
        let map = read_from(stored, 3).unwrap();
        assert_eq!(map.get("a.png"), Some(&1));
    }

    #[test]
    fn test_non_integer_class_index_fails() {
        let stored = b"filename,class_index,class_name\na.png,0,x\nb.png,two,y\n";
        let err = read_from(stored, 3).unwrap_err();
        match err {
            StoreError::MalformedRow { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("'two'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_class_index_fails() {
        let stored = b"filename,class_index,class_name\na.png,-1,x\n";
        assert!(matches!(
            read_from(stored, 3),
            Err(StoreError::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_filename_fails() {
        let stored = b"filename,class_index,class_name\n,0,x\n";
        let err = read_from(stored, 3).unwrap_err();
        assert!(err.to_string().contains("missing filename"));
    }

    #[test]
    fn test_short_row_fails() {
        let stored = b"filename,class_index,class_name\na.png\n";
        assert!(matches!(
            read_from(stored, 3),
            Err(StoreError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_missing_column_fails() {
        let stored = b"name,class\na.png,0\n";
        assert!(matches!(
            read_from(stored, 3),
            Err(StoreError::MissingColumn { column: "filename" })
        ));
    }

    #[test]
    fn test_out_of_range_class_fails() {
        let stored = b"filename,class_index,class_name\na.png,3,x\n";
        let err = read_from(stored, 3).unwrap_err();
        assert!(matches!(
            err,
            StoreError::ClassOutOfRange {
                class_index: 3,
                class_count: 3,
                ..
            }
        ));
        assert!(!err.is_save_error());
    }

    #[test]
    fn test_unnamed_class_is_save_error() {
        let mut map = AnnotationMap::new();
        map.insert("a.png".to_string(), 5);
        let err = to_bytes(&map, &classes()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnnamedClass {
                class_index: 5,
                class_count: 3,
                ..
            }
        ));
        assert!(err.is_save_error());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory in place of the store makes the rename fail.
        let target = dir.path().join("annotations.csv");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"").unwrap();

        let store = CsvStore::new(&target);
        let err = store.save(&sample_map(), &classes()).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(!dir.path().join(".annotations.csv.tmp").exists());
    }

    #[test]
    fn test_empty_file_is_empty() {
        assert!(read_from(b"", 3).unwrap().is_empty());
    }

    #[test]
    fn test_save_error_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("missing").join("annotations.csv"));
        let err = store.save(&sample_map(), &classes()).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(err.is_save_error());
    }
}
