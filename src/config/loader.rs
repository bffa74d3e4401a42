//! Config file format selection and decoding.
//!
//! The format is chosen from the file extension alone:
//! `.json` → JSON, `.yaml` / `.yml` → YAML, anything else is rejected.
//! Both decoders normalise into a `serde_json` object so the rest of the
//! resolver works on a single value model.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};

use super::error::ResolveError;
use crate::constants::{EXT_JSON, EXT_YAML, EXT_YML};

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Json => write!(f, "JSON"),
            ConfigFormat::Yaml => write!(f, "YAML"),
        }
    }
}

impl ConfigFormat {
    /// Select a decoder by inspecting the path's extension.
    ///
    /// Matching is case-sensitive; `config.JSON` is rejected. A dotfile
    /// such as `.yaml` counts as having the extension `.yaml`.
    pub fn from_path(path: &Path) -> Result<Self, ResolveError> {
        let extension = extension_of(path);
        match extension.as_deref() {
            Some(EXT_JSON) => Ok(ConfigFormat::Json),
            Some(EXT_YAML) | Some(EXT_YML) => Ok(ConfigFormat::Yaml),
            other => Err(ResolveError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: other.map(|e| format!(".{e}")).unwrap_or_default(),
            }),
        }
    }

    /// Decode `content` into a top-level mapping.
    ///
    /// An empty YAML document (or one holding only comments) decodes to an
    /// empty mapping. Any other non-mapping top level is an error.
    pub fn decode(self, content: &str) -> Result<Map<String, Value>, String> {
        let value = match self {
            ConfigFormat::Json => {
                serde_json::from_str::<Value>(content).map_err(|e| e.to_string())?
            }
            ConfigFormat::Yaml => {
                let yaml: serde_yaml_ng::Value =
                    serde_yaml_ng::from_str(content).map_err(|e| e.to_string())?;
                serde_json::to_value(yaml).map_err(|e| e.to_string())?
            }
        };

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(format!(
                "expected a mapping at the top level, found {}",
                value_kind(&other)
            )),
        }
    }
}

fn extension_of(path: &Path) -> Option<Cow<'_, str>> {
    if let Some(ext) = path.extension() {
        return Some(ext.to_string_lossy());
    }
    // `Path::extension` is `None` for `.yaml`.
    match path.file_name()?.to_string_lossy() {
        Cow::Borrowed(name) => name.strip_prefix('.').filter(|e| !e.is_empty()).map(Cow::Borrowed),
        Cow::Owned(name) => name
            .strip_prefix('.')
            .filter(|e| !e.is_empty())
            .map(|e| Cow::Owned(e.to_string())),
    }
}

/// Read and decode the config file at `path`.
///
/// The format is checked before the file is touched, so an unsupported
/// extension never results in a read.
pub fn load_document(path: &Path) -> Result<(ConfigFormat, Map<String, Value>), ResolveError> {
    let format = ConfigFormat::from_path(path)?;

    let content = std::fs::read_to_string(path).map_err(|e| ResolveError::FileAccess {
        path: path.to_path_buf(),
        source: e,
    })?;

    let values = format
        .decode(&content)
        .map_err(|message| ResolveError::FileFormat {
            path: path.to_path_buf(),
            format,
            message,
        })?;

    Ok((format, values))
}

/// Human-readable name of a JSON value's type, for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorKind;

    #[test]
    fn format_from_known_extensions() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("app.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("/etc/app/config.yaml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("conf.d/app.yml")).unwrap(),
            ConfigFormat::Yaml
        );
    }

    #[test]
    fn format_rejects_toml() {
        let err = ConfigFormat::from_path(Path::new("config.toml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert!(err.to_string().contains(".toml"));
    }

    #[test]
    fn format_rejects_missing_extension() {
        let err = ConfigFormat::from_path(Path::new("/etc/app/config")).unwrap_err();
        match err {
            ResolveError::UnsupportedFormat { extension, .. } => assert!(extension.is_empty()),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn dotfile_name_is_its_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("/etc/app/.yaml")).unwrap(),
            ConfigFormat::Yaml
        );
        let err = ConfigFormat::from_path(Path::new("/etc/app/.hidden")).unwrap_err();
        assert!(err.to_string().contains("'.hidden'"), "got: {err}");
    }

    #[test]
    fn format_is_case_sensitive() {
        let err = ConfigFormat::from_path(Path::new("config.JSON")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn decode_json_object() {
        let map = ConfigFormat::Json
            .decode(r#"{"port": 8080, "host": "0.0.0.0"}"#)
            .unwrap();
        assert_eq!(map["port"], 8080);
        assert_eq!(map["host"], "0.0.0.0");
    }

    #[test]
    fn decode_yaml_object() {
        let map = ConfigFormat::Yaml
            .decode("port: 8080\ntags:\n  - a\n  - b\n")
            .unwrap();
        assert_eq!(map["port"], 8080);
        assert_eq!(map["tags"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn decode_empty_yaml_is_empty_mapping() {
        assert!(ConfigFormat::Yaml.decode("").unwrap().is_empty());
        assert!(ConfigFormat::Yaml.decode("# nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_top_level_list() {
        let err = ConfigFormat::Yaml.decode("- a\n- b\n").unwrap_err();
        assert!(err.contains("mapping"), "got: {err}");
        let err = ConfigFormat::Json.decode("[1, 2]").unwrap_err();
        assert!(err.contains("a list"), "got: {err}");
    }

    #[test]
    fn decode_malformed_json() {
        assert!(ConfigFormat::Json.decode("{ not json").is_err());
    }

    #[test]
    fn load_document_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.yml");
        std::fs::write(&path, "host: example.org\n").unwrap();

        let (format, values) = load_document(&path).unwrap();
        assert_eq!(format, ConfigFormat::Yaml);
        assert_eq!(values["host"], "example.org");
    }

    #[test]
    fn load_document_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileAccess);
    }

    #[test]
    fn load_document_checks_format_before_reading() {
        // The file does not exist; the extension check must fail first.
        let err = load_document(Path::new("/nonexistent/layerconf/config.toml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn load_document_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "port: [unclosed\n").unwrap();

        let err = load_document(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileFormat);
        assert!(err.to_string().contains("parse"));
    }
}
