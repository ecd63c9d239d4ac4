//! YAML reading and writing for entity files

pub mod diagnostics;

use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

pub use diagnostics::{YamlError, YamlSyntaxError};

/// Parse an entity file, reporting syntax or shape errors at their location
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml_str(&content, &path.display().to_string())
}

/// Parse YAML text; `filename` labels the diagnostic
pub fn parse_yaml_str<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content)
        .map_err(|e| Box::new(YamlSyntaxError::from_serde_error(&e, content, filename)).into())
}

/// Serialize an entity and write it, replacing any previous contents
pub fn write_yaml_file<T: Serialize>(path: &Path, value: &T) -> Result<(), YamlError> {
    let yaml = serde_yml::to_string(value).map_err(|e| YamlError::Serialize(e.to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_write_then_parse() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/sample.yaml");
        let sample = Sample {
            name: "x".to_string(),
            count: 3,
        };
        write_yaml_file(&path, &sample).unwrap();
        let parsed: Sample = parse_yaml_file(&path).unwrap();
        assert_eq!(parsed, sample);
    }

    #[test]
    fn test_shape_error_is_syntax_diagnostic() {
        let err = parse_yaml_str::<Sample>("name: x\ncount: many\n", "s.yaml").unwrap_err();
        assert!(matches!(err, YamlError::Syntax(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_yaml_file::<Sample>(Path::new("/nonexistent/x.yaml")).unwrap_err();
        assert!(matches!(err, YamlError::Io(_)));
    }
}
