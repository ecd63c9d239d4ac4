//! Append-only audit trail stored as JSON Lines

use miette::Diagnostic;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entities::audit_log::AuditLog;

#[derive(Debug, Error, Diagnostic)]
pub enum AuditError {
    #[error("cannot write audit log {path}: {message}")]
    #[diagnostic(code(comply::audit::write))]
    Write { path: PathBuf, message: String },

    #[error("cannot read audit log {path}: {message}")]
    #[diagnostic(code(comply::audit::read))]
    Read { path: PathBuf, message: String },
}

/// Handle on the project's audit log file
#[derive(Debug, Clone)]
pub struct AuditTrail {
    path: PathBuf,
}

impl AuditTrail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Existing lines are never rewritten.
    pub fn append(&self, entry: &AuditLog) -> Result<(), AuditError> {
        let write_err = |message: String| AuditError::Write {
            path: self.path.clone(),
            message,
        };
        let line = serde_json::to_string(entry).map_err(|e| write_err(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| write_err(e.to_string()))?;
        writeln!(file, "{}", line).map_err(|e| write_err(e.to_string()))?;
        tracing::debug!(
            action = %entry.action_type,
            entity = %entry.entity_type,
            "audit entry recorded"
        );
        Ok(())
    }

    /// Read every entry in file order. Malformed lines are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<AuditLog>, AuditError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let read_err = |message: String| AuditError::Read {
            path: self.path.clone(),
            message,
        };
        let file = std::fs::File::open(&self.path).map_err(|e| read_err(e.to_string()))?;

        let mut entries = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| read_err(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditLog>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(line = n + 1, error = %e, "skipping malformed audit entry"),
            }
        }
        Ok(entries)
    }
}
