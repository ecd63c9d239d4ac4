//! YAML error diagnostics pointing at the offending location

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Error in an entity file, with source location
#[derive(Debug, Error, Diagnostic)]
#[error("invalid entity file: {message}")]
#[diagnostic(code(comply::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    /// Create a diagnostic from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while reading or writing entity files
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] Box<YamlSyntaxError>),

    #[error("could not serialize entity: {0}")]
    #[diagnostic(code(comply::yaml::serialize))]
    Serialize(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(comply::yaml::io))]
    Io(#[from] std::io::Error),
}

/// Convert a 1-based line/column to a byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        match source.match_indices('\n').nth(line - 2) {
            Some((pos, _)) => pos + 1,
            None => return source.len().saturating_sub(1),
        }
    };

    let line_text = source[line_start..].split('\n').next().unwrap_or("");
    let within = line_text
        .char_indices()
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(line_text.len());
    line_start + within
}

/// Suggestions for common mistakes in hand-edited entity files
fn generate_help(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("unknown variant") {
        return Some(
            "Enumerated fields use lowercase snake_case values, e.g. status: em_andamento"
                .to_string(),
        );
    }

    if msg.contains("missing field") {
        return Some("A required field is missing. Compare with a file created by comply.".to_string());
    }

    if msg.contains("tab") {
        return Some("YAML requires spaces for indentation, not tabs.".to_string());
    }

    if msg.contains("duplicate") {
        return Some("Each key can only appear once. Remove or rename the duplicate key.".to_string());
    }

    if msg.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have incorrect indentation.".to_string());
    }

    if msg.contains("premature end of input") || msg.contains("input contains invalid characters") {
        return Some("Dates use YYYY-MM-DD and timestamps RFC 3339.".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 3), 14);
        assert_eq!(line_col_to_offset(source, 9, 1), 16);
    }

    #[test]
    fn test_help_generation() {
        assert!(generate_help("status: unknown variant `done`").is_some());
        assert!(generate_help("missing field `name`").is_some());
        assert!(generate_help("found tab character").is_some());
        assert!(generate_help("some random error").is_none());
    }

    #[test]
    fn test_from_serde_error_keeps_message() {
        let source = "a: [1, 2\n";
        let err = serde_yml::from_str::<serde_json::Value>(source).unwrap_err();
        let diag = YamlSyntaxError::from_serde_error(&err, source, "x.yaml");
        assert!(!diag.message().is_empty());
    }
}
