//! Shared helper functions for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::identity::EntityId;

/// Format an EntityId for display, truncating if too long
pub fn format_short_id(id: &EntityId) -> String {
    format_short_id_str(&id.to_string())
}

/// Same as [`format_short_id`] for an ID already rendered as text
pub fn format_short_id_str(id: &str) -> String {
    truncate_str(id, 16)
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output (RFC 4180)
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Resolve `auto` against the configured default, then against the command's own default
pub fn resolve_format(global: &GlobalOpts, config: &Config, fallback: OutputFormat) -> OutputFormat {
    use clap::ValueEnum;

    let configured = config
        .default_format
        .as_deref()
        .and_then(|f| OutputFormat::from_str(f, true).ok());
    match (global.format, configured) {
        (OutputFormat::Auto, Some(f)) if f != OutputFormat::Auto => f,
        (OutputFormat::Auto, _) => fallback,
        (f, _) => f,
    }
}

/// Print `{"success": true, "data": ...}`
pub fn print_json<T: Serialize + ?Sized>(data: &T) -> Result<()> {
    let envelope = serde_json::json!({
        "success": true,
        "data": data,
    });
    println!("{}", serde_json::to_string_pretty(&envelope).into_diagnostic()?);
    Ok(())
}

pub fn print_yaml<T: Serialize + ?Sized>(data: &T) -> Result<()> {
    print!("{}", serde_yml::to_string(data).into_diagnostic()?);
    Ok(())
}

/// Print data in a structured format; returns false for formats the caller renders itself
pub fn print_structured<T: Serialize + ?Sized>(format: OutputFormat, data: &T) -> Result<bool> {
    match format {
        OutputFormat::Json => print_json(data).map(|_| true),
        OutputFormat::Yaml => print_yaml(data).map(|_| true),
        _ => Ok(false),
    }
}

/// Confirmation line printed after a successful change
pub fn success(global: &GlobalOpts, message: impl std::fmt::Display) {
    if !global.quiet {
        println!("{} {}", style("✓").green(), message);
    }
}

/// Ask before a destructive action. `--yes` skips the prompt; without a terminal it is required.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !console::user_attended() {
        return Err(miette::miette!(
            help = "pass --yes to confirm without a prompt",
            "refusing to delete without confirmation"
        ));
    }
    dialoguer::Confirm::with_theme(&dialoguer::theme::ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// "-" for missing optional values
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Risk);
        let formatted = format_short_id(&id);
        assert_eq!(formatted.chars().count(), 16);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str_counts_characters() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("Adequação à LGPD", 8), "Adequ...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_resolve_format() {
        let global = GlobalOpts {
            format: OutputFormat::Auto,
            quiet: false,
            verbose: false,
            project: None,
        };
        let mut config = Config::default();
        assert_eq!(resolve_format(&global, &config, OutputFormat::Tsv), OutputFormat::Tsv);

        config.default_format = Some("json".to_string());
        assert_eq!(resolve_format(&global, &config, OutputFormat::Tsv), OutputFormat::Json);

        let explicit = GlobalOpts {
            format: OutputFormat::Md,
            ..global
        };
        assert_eq!(resolve_format(&explicit, &config, OutputFormat::Tsv), OutputFormat::Md);
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some(3)), "3");
        assert_eq!(or_dash::<u8>(None), "-");
    }
}
