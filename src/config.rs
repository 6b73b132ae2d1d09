//! Configuration file support.
//!
//! The configuration is a JSON object naming the annotation classes, the
//! store file and the two display bounds. It is validated once at startup;
//! any problem is fatal and reported by field name.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

/// Highest number of classes, one per digit key `1`..`9`.
pub const MAX_CLASSES: usize = 9;

/// Default config filename looked up when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Configuration payload as written, before validation.
///
/// Every field is optional so a missing key is reported by name instead of
/// as a generic deserialization error. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    classes: Option<Value>,
    annotations_file: Option<Value>,
    resized_image_size: Option<Value>,
    max_original_display_size: Option<Value>,
}

/// Validated, immutable application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    classes: Vec<String>,
    annotations_file: PathBuf,
    resized_image_size: u32,
    max_original_display_size: u32,
}

impl AppConfig {
    /// Parse and validate a JSON configuration payload.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// `classes` (a list of strings, 1 to 9 entries), then `annotations_file`,
    /// `resized_image_size` and `max_original_display_size`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Validate an already-parsed payload.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        if !value.is_object() {
            return Err(ConfigError::InvalidField {
                field: "<root>",
                reason: "the configuration must be a JSON object".to_string(),
            });
        }
        let raw = RawConfig::deserialize(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let classes = parse_classes(raw.classes.as_ref())?;
        let annotations_file = parse_path(raw.annotations_file.as_ref(), "annotations_file")?;
        let resized_image_size =
            parse_positive(raw.resized_image_size.as_ref(), "resized_image_size")?;
        let max_original_display_size = parse_positive(
            raw.max_original_display_size.as_ref(),
            "max_original_display_size",
        )?;

        Ok(Self {
            classes,
            annotations_file,
            resized_image_size,
            max_original_display_size,
        })
    }

    /// Read and validate the configuration file at `path`.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!(
            "Loaded configuration from {:?} ({} classes)",
            path,
            config.class_count()
        );
        Ok(config)
    }

    /// Class labels in key order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of configured classes, always in `1..=MAX_CLASSES`.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Label for a class index, if it is in range.
    pub fn class_name(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Store path resolved against `base` (normally the config file's folder).
    /// Absolute paths are returned unchanged.
    pub fn annotations_path(&self, base: &Path) -> PathBuf {
        base.join(&self.annotations_file)
    }

    /// Longest side of the resized preview, in pixels.
    pub fn resized_image_size(&self) -> u32 {
        self.resized_image_size
    }

    /// Largest longest-side at which the original is still drawn natively.
    pub fn max_original_display_size(&self) -> u32 {
        self.max_original_display_size
    }
}

fn parse_classes(raw: Option<&Value>) -> Result<Vec<String>, ConfigError> {
    let raw = raw.ok_or(ConfigError::MissingField { field: "classes" })?;

    let items = raw.as_array().ok_or_else(|| ConfigError::InvalidField {
        field: "classes",
        reason: "must be a list of strings".to_string(),
    })?;

    let mut classes = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(name) if !name.is_empty() => classes.push(name.to_string()),
            Some(_) => {
                return Err(ConfigError::InvalidField {
                    field: "classes",
                    reason: format!("entry {} is an empty string", i + 1),
                });
            }
            None => {
                return Err(ConfigError::InvalidField {
                    field: "classes",
                    reason: format!("entry {} is not a string", i + 1),
                });
            }
        }
    }

    if classes.is_empty() {
        return Err(ConfigError::NoClasses);
    }
    if classes.len() > MAX_CLASSES {
        return Err(ConfigError::TooManyClasses {
            count: classes.len(),
        });
    }

    Ok(classes)
}

fn parse_path(raw: Option<&Value>, field: &'static str) -> Result<PathBuf, ConfigError> {
    let raw = raw.ok_or(ConfigError::MissingField { field })?;
    match raw.as_str() {
        Some(s) if !s.is_empty() => Ok(PathBuf::from(s)),
        _ => Err(ConfigError::InvalidField {
            field,
            reason: "must be a non-empty string".to_string(),
        }),
    }
}

fn parse_positive(raw: Option<&Value>, field: &'static str) -> Result<u32, ConfigError> {
    let raw = raw.ok_or(ConfigError::MissingField { field })?;
    raw.as_u64()
        .filter(|&n| n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ConfigError::InvalidField {
            field,
            reason: format!("must be a positive integer (got {})", raw),
        })
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file does not exist
    #[error("Configuration file {path:?} not found")]
    NotFound { path: PathBuf },

    /// I/O error when reading the config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON format error in configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Required field is absent
    #[error("The '{field}' field is required in the configuration file")]
    MissingField { field: &'static str },

    /// Field is present but has the wrong type or value
    #[error("Invalid '{field}' field: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Empty class list
    #[error("The configuration must contain at least one class")]
    NoClasses,

    /// More classes than digit shortcuts
    #[error(
        "Number of classes must not exceed 9 (currently {count}); keyboard shortcuts are limited to keys 1-9"
    )]
    TooManyClasses { count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(classes: Value) -> Value {
        json!({
            "classes": classes,
            "annotations_file": "annotations.csv",
            "resized_image_size": 200,
            "max_original_display_size": 400,
        })
    }

    #[test]
    fn test_valid_config() {
        let config = AppConfig::from_value(&payload(json!(["column", "plate"]))).unwrap();
        assert_eq!(config.classes(), ["column", "plate"]);
        assert_eq!(config.class_count(), 2);
        assert_eq!(
            config.annotations_path(Path::new("/data")),
            Path::new("/data/annotations.csv")
        );
        assert_eq!(config.resized_image_size(), 200);
        assert_eq!(config.max_original_display_size(), 400);
        assert_eq!(config.class_name(1), Some("plate"));
        assert_eq!(config.class_name(2), None);
    }

    #[test]
    fn test_class_count_bounds() {
        for count in 1..=MAX_CLASSES {
            let classes: Vec<String> = (0..count).map(|i| format!("c{}", i)).collect();
            assert!(AppConfig::from_value(&payload(json!(classes))).is_ok());
        }

        let err = AppConfig::from_value(&payload(json!([]))).unwrap_err();
        assert!(matches!(err, ConfigError::NoClasses));
        assert!(err.to_string().contains("at least one class"));

        let ten: Vec<String> = (0..10).map(|i| format!("c{}", i)).collect();
        let err = AppConfig::from_value(&payload(json!(ten))).unwrap_err();
        assert!(matches!(err, ConfigError::TooManyClasses { count: 10 }));
        assert!(err.to_string().contains("must not exceed 9"));
    }

    #[test]
    fn test_duplicate_classes_allowed() {
        let config = AppConfig::from_value(&payload(json!(["a", "a"]))).unwrap();
        assert_eq!(config.class_count(), 2);
    }

    #[test]
    fn test_classes_must_be_strings() {
        let err = AppConfig::from_value(&payload(json!("column"))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { field: "classes", .. }));

        let err = AppConfig::from_value(&payload(json!(["a", 3]))).unwrap_err();
        assert!(err.to_string().contains("entry 2 is not a string"));

        let err = AppConfig::from_value(&payload(json!(["a", ""]))).unwrap_err();
        assert!(err.to_string().contains("empty string"));
    }

    #[test]
    fn test_missing_fields_in_order() {
        let err = AppConfig::from_value(&json!({})).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "classes" }));

        // Class checks run before the other fields are consulted.
        let err = AppConfig::from_value(&json!({ "classes": [] })).unwrap_err();
        assert!(matches!(err, ConfigError::NoClasses));

        let err = AppConfig::from_value(&json!({ "classes": ["a"] })).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "annotations_file"
            }
        ));

        let err = AppConfig::from_value(&json!({
            "classes": ["a"],
            "annotations_file": "a.csv",
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "resized_image_size"
            }
        ));

        let err = AppConfig::from_value(&json!({
            "classes": ["a"],
            "annotations_file": "a.csv",
            "resized_image_size": 100,
        }))
        .unwrap_err();
        assert!(
            err.to_string()
                .contains("'max_original_display_size' field is required")
        );
    }

    #[test]
    fn test_sizes_must_be_positive_integers() {
        for bad in [json!(0), json!(-5), json!(1.5), json!("100")] {
            let mut value = payload(json!(["a"]));
            value["resized_image_size"] = bad;
            let err = AppConfig::from_value(&value).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidField {
                    field: "resized_image_size",
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut value = payload(json!(["a"]));
        value["window_title"] = json!("ignored");
        assert!(AppConfig::from_value(&value).is_ok());
    }

    #[test]
    fn test_from_json_reports_fields_by_name() {
        let err = AppConfig::from_json(r#"{ "annotations_file": "a.csv" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "classes" }));

        let err = AppConfig::from_json(
            r#"{ "classes": ["a"], "annotations_file": "a.csv",
                 "resized_image_size": 100, "max_original_display_size": "big" }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "max_original_display_size",
                ..
            }
        ));

        let config = AppConfig::from_json(&payload(json!(["a"])).to_string()).unwrap();
        assert_eq!(config.max_original_display_size(), 400);
    }

    #[test]
    fn test_root_must_be_object() {
        let err = AppConfig::from_value(&json!(["a"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { field: "<root>", .. }));
    }

    #[test]
    fn test_invalid_json() {
        let err = AppConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));

        std::fs::write(&path, payload(json!(["a", "b"])).to_string()).unwrap();
        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(
            config.annotations_path(dir.path()),
            dir.path().join("annotations.csv")
        );
    }
}
