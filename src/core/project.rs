//! Project discovery and structure

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Name of the marker directory at the project root
pub const MARKER_DIR: &str = ".comply";

/// Suffix of every stored entity file
pub const ENTITY_SUFFIX: &str = ".comply.yaml";

/// Represents a compliance project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .comply/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(MARKER_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path.
    ///
    /// With `force`, an existing `.comply/` is reused and its config rewritten.
    pub fn init(path: &Path, force: bool) -> Result<Self, ProjectError> {
        std::fs::create_dir_all(path).map_err(|e| ProjectError::IoError(e.to_string()))?;
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let marker = root.join(MARKER_DIR);
        if marker.exists() && !force {
            return Err(ProjectError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&marker).map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(marker.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        let audit = marker.join("audit.jsonl");
        if !audit.exists() {
            std::fs::write(&audit, "").map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        for dir in Self::entity_dirs() {
            std::fs::create_dir_all(root.join(dir))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        tracing::debug!(root = %root.display(), "initialized project");
        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# Comply project configuration

# Acting user recorded in audit entries (falls back to git user.name, then $USER)
# author: ""

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Audit log page size
# page_size: 10

# Largest accepted evidence file, in bytes
# max_upload_bytes: 10485760

# Risk matrix severity bands (nivel <= baixo -> baixo, <= medio -> medio, <= alto -> alto)
# severity:
#   baixo: 5
#   medio: 12
#   alto: 20

# Dashboard recommendation gates
# recommendations:
#   high_risk_items: 0
#   overall_conformity: 50
#   category_conformity: 30
#   pending_items: 10
"#
    }

    fn entity_dirs() -> [&'static str; 5] {
        ["checklists", "risks", "trainings", "notifications", "evidence"]
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .comply configuration directory
    pub fn comply_dir(&self) -> PathBuf {
        self.root.join(MARKER_DIR)
    }

    /// Path of the append-only audit log
    pub fn audit_path(&self) -> PathBuf {
        self.comply_dir().join("audit.jsonl")
    }

    /// Directory holding stored evidence files for one item
    pub fn evidence_dir(&self, item_id: &EntityId) -> PathBuf {
        self.root.join("evidence").join(item_id.to_string())
    }

    /// Get the path for an entity file
    pub fn entity_path(&self, id: &EntityId) -> PathBuf {
        self.root
            .join(Self::entity_directory(id.prefix()))
            .join(format!("{}{}", id, ENTITY_SUFFIX))
    }

    /// Get the directory for a given entity prefix.
    ///
    /// Child records (items, evidence, assessments, plans) live inside
    /// their parent's file, so they map to the parent's directory.
    pub fn entity_directory(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Chk | EntityPrefix::Item | EntityPrefix::Evd => "checklists",
            EntityPrefix::Risk | EntityPrefix::Asmt | EntityPrefix::Plan => "risks",
            EntityPrefix::Trn => "trainings",
            EntityPrefix::Ntf => "notifications",
            EntityPrefix::Log => MARKER_DIR,
        }
    }

    /// Iterate all entity files of a given prefix type
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        let dir = self.root.join(Self::entity_directory(prefix));
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(ENTITY_SUFFIX))
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("not a comply project (searched from {searched_from:?})")]
    #[diagnostic(
        code(comply::project::not_found),
        help("run 'comply init' to create one")
    )]
    NotFound { searched_from: PathBuf },

    #[error("comply project already exists at {0:?}")]
    #[diagnostic(code(comply::project::exists), help("use --force to reinitialize"))]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    #[diagnostic(code(comply::project::io))]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();

        assert!(project.comply_dir().join("config.yaml").exists());
        assert!(project.audit_path().exists());
        for dir in ["checklists", "risks", "trainings", "notifications", "evidence"] {
            assert!(project.root().join(dir).is_dir(), "missing {}", dir);
        }
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), false).unwrap();

        let err = Project::init(tmp.path(), false).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
        assert!(Project::init(tmp.path(), true).is_ok());
    }

    #[test]
    fn test_force_keeps_audit_history() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();
        std::fs::write(project.audit_path(), "{\"x\":1}\n").unwrap();

        Project::init(tmp.path(), true).unwrap();
        let contents = std::fs::read_to_string(project.audit_path()).unwrap();
        assert_eq!(contents, "{\"x\":1}\n");
    }

    #[test]
    fn test_project_discover_from_subdirectory() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), false).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_marker() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_entity_path_uses_parent_directory() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();
        let id = EntityId::new(EntityPrefix::Risk);
        let path = project.entity_path(&id);
        assert!(path.starts_with(project.root().join("risks")));
        assert!(path.to_string_lossy().ends_with(".comply.yaml"));
    }
}
