//! Evidence upload: validation and ingestion into the project

use chrono::Utc;
use miette::Diagnostic;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;
use crate::entities::checklist::Evidence;

/// Accepted extensions and the MIME type recorded for each
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("txt", "text/plain"),
];

#[derive(Debug, Error, Diagnostic)]
pub enum UploadError {
    #[error("no file at {0}")]
    #[diagnostic(code(comply::upload::missing), help("select a file to upload"))]
    Missing(PathBuf),

    #[error("file is too large: {size} bytes (limit {max} bytes)")]
    #[diagnostic(code(comply::upload::too_large))]
    TooLarge { size: u64, max: u64 },

    #[error("file type not allowed: {0}")]
    #[diagnostic(
        code(comply::upload::type_not_allowed),
        help("accepted formats: PDF, PNG, JPG, DOC, DOCX, XLS, XLSX, TXT")
    )]
    TypeNotAllowed(String),

    #[error("upload failed: {0}")]
    #[diagnostic(code(comply::upload::io))]
    Io(String),
}

/// MIME type for an accepted file name, by extension
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    ALLOWED_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// A source file that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedFile {
    pub path: PathBuf,
    pub size: u64,
    pub mime_type: &'static str,
}

/// Check existence, size and type without touching the project
pub fn validate(source: &Path, max_bytes: u64) -> Result<ValidatedFile, UploadError> {
    let meta = std::fs::metadata(source).map_err(|_| UploadError::Missing(source.to_path_buf()))?;
    if !meta.is_file() {
        return Err(UploadError::Missing(source.to_path_buf()));
    }
    if meta.len() > max_bytes {
        return Err(UploadError::TooLarge {
            size: meta.len(),
            max: max_bytes,
        });
    }
    let mime_type = mime_type_for(source).ok_or_else(|| {
        UploadError::TypeNotAllowed(
            source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    })?;

    Ok(ValidatedFile {
        path: source.to_path_buf(),
        size: meta.len(),
        mime_type,
    })
}

/// Copy a validated file to `evidence/<item>/<evidence-id>.<ext>` and describe it
pub fn ingest(
    project: &Project,
    item_id: &EntityId,
    file: &ValidatedFile,
    uploaded_by: &str,
    note: Option<String>,
) -> Result<Evidence, UploadError> {
    let io = |e: std::io::Error| UploadError::Io(e.to_string());

    let contents = std::fs::read(&file.path).map_err(io)?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    let digest = format!("{:x}", hasher.finalize());

    let id = EntityId::new(EntityPrefix::Evd);
    let original_name = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = file
        .path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let dir = project.evidence_dir(item_id);
    std::fs::create_dir_all(&dir).map_err(io)?;
    let target = dir.join(format!("{}.{}", id, ext));
    std::fs::write(&target, &contents).map_err(io)?;

    let relative = target
        .strip_prefix(project.root())
        .unwrap_or(&target)
        .to_string_lossy()
        .replace('\\', "/");
    tracing::info!(item = %item_id, path = %relative, size = file.size, "evidence stored");

    Ok(Evidence {
        id,
        original_name,
        path: relative,
        mime_type: Some(file.mime_type.to_string()),
        size: file.size,
        sha256: Some(digest),
        note,
        uploaded_at: Utc::now(),
        uploaded_by: uploaded_by.to_string(),
    })
}

/// Delete stored evidence files, and their item directory once it is empty.
/// Missing files are ignored.
pub fn remove_files(project: &Project, evidence: &[Evidence]) {
    let evidence_root = project.root().join("evidence");
    for e in evidence {
        let path = project.root().join(&e.path);
        if path.exists() {
            if let Err(err) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %err, "could not remove evidence file");
            }
        }
        // remove_dir refuses non-empty directories, so siblings survive
        if let Some(dir) = path.parent() {
            if dir.starts_with(&evidence_root) && dir != evidence_root.as_path() {
                let _ = std::fs::remove_dir(dir);
            }
        }
    }
}
