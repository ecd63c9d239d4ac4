//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::matrix::SeverityThresholds;
use crate::analysis::metrics::RecommendationThresholds;
use crate::core::Project;

/// Default audit log page size
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Default evidence size limit (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Comply configuration with layered hierarchy
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Acting user recorded on new entities and audit entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,

    /// Audit list page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,

    /// Largest accepted evidence upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<SeverityThresholds>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<RecommendationThresholds>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // Global user config (~/.config/comply/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // Project config (.comply/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.comply_dir().join("config.yaml"))
            {
                config.merge(project_config);
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        config.check_severity();
        config
    }

    /// Out-of-order thresholds fall back to the defaults
    fn check_severity(&mut self) {
        if let Some(t) = self.severity.filter(|t| !t.is_ascending()) {
            tracing::warn!(
                baixo = t.baixo,
                medio = t.medio,
                alto = t.alto,
                "severity thresholds must satisfy baixo <= medio <= alto; using defaults"
            );
            self.severity = None;
        }
    }

    pub(crate) fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Option<Config>>(&contents) {
            // A file holding only comments parses as null
            Ok(parsed) => Some(parsed.unwrap_or_default()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    /// Environment overrides: COMPLY_AUTHOR, COMPLY_PAGE_SIZE
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(author) = var("COMPLY_AUTHOR").filter(|a| !a.trim().is_empty()) {
            self.author = Some(author);
        }
        if let Some(size) = var("COMPLY_PAGE_SIZE") {
            match size.parse::<usize>() {
                Ok(n) if n > 0 => self.page_size = Some(n),
                _ => tracing::warn!(value = %size, "ignoring invalid COMPLY_PAGE_SIZE"),
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "comply")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.page_size.is_some() {
            self.page_size = other.page_size;
        }
        if other.max_upload_bytes.is_some() {
            self.max_upload_bytes = other.max_upload_bytes;
        }
        if other.severity.is_some() {
            self.severity = other.severity;
        }
        if other.recommendations.is_some() {
            self.recommendations = other.recommendations;
        }
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    pub fn page_size(&self) -> usize {
        self.page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn severity(&self) -> SeverityThresholds {
        self.severity.unwrap_or_default()
    }

    pub fn recommendations(&self) -> RecommendationThresholds {
        self.recommendations.unwrap_or_default()
    }

    /// Fully resolved view used by `comply config show`
    pub fn effective(&self) -> serde_json::Value {
        serde_json::json!({
            "author": self.author(),
            "default_format": self.default_format.clone().unwrap_or_else(|| "auto".to_string()),
            "page_size": self.page_size(),
            "max_upload_bytes": self.max_upload_bytes(),
            "severity": self.severity(),
            "recommendations": self.recommendations(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.page_size(), 10);
        assert_eq!(config.max_upload_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.severity(), SeverityThresholds::default());
    }

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut base = Config {
            author: Some("global".to_string()),
            page_size: Some(20),
            ..Default::default()
        };
        base.merge(Config {
            author: Some("project".to_string()),
            ..Default::default()
        });
        assert_eq!(base.author.as_deref(), Some("project"));
        assert_eq!(base.page_size(), 20);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "COMPLY_AUTHOR" => Some("dpo".to_string()),
            "COMPLY_PAGE_SIZE" => Some("25".to_string()),
            _ => None,
        });
        assert_eq!(config.author(), "dpo");
        assert_eq!(config.page_size(), 25);
    }

    #[test]
    fn test_invalid_env_page_size_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "COMPLY_PAGE_SIZE").then(|| "0".to_string()));
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_project_file_with_thresholds() {
        let tmp = tempfile::tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();
        std::fs::write(
            project.comply_dir().join("config.yaml"),
            "author: ana\nseverity:\n  baixo: 4\n  medio: 9\n  alto: 16\n",
        )
        .unwrap();

        let config = Config::read_file(&project.comply_dir().join("config.yaml")).unwrap();
        assert_eq!(config.author.as_deref(), Some("ana"));
        assert_eq!(config.severity().medio, 9);
    }

    #[test]
    fn test_unordered_severity_falls_back_to_defaults() {
        let mut config: Config = serde_yml::from_str("severity:\n  baixo: 15\n  medio: 5\n").unwrap();
        assert!(!config.severity().is_ascending());
        config.check_severity();
        assert_eq!(config.severity(), SeverityThresholds::default());

        let mut ordered: Config =
            serde_yml::from_str("severity:\n  baixo: 4\n  medio: 9\n  alto: 16\n").unwrap();
        ordered.check_severity();
        assert_eq!(ordered.severity().alto, 16);
    }

    #[test]
    fn test_commented_default_file_parses_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();
        let config = Config::read_file(&project.comply_dir().join("config.yaml")).unwrap();
        assert!(config.author.is_none());
    }
}
