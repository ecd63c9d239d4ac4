//! Table formatting for CLI list commands
//!
//! Every list command builds [`TableRow`]s of typed [`CellValue`]s and hands
//! them to a [`TableFormatter`], which renders TSV, CSV, Markdown or bare IDs.

use chrono::{DateTime, Local, NaiveDate, Utc};
use console::{style, StyledObject};

use crate::analysis::format::{Badge, Tone};
use crate::cli::helpers::{escape_csv, format_short_id_str, truncate_str};
use crate::cli::OutputFormat;

/// Apply a badge's tone as a terminal color
pub fn styled_badge(badge: &Badge) -> StyledObject<String> {
    let text = badge.label.to_string();
    match badge.tone {
        Tone::Success => style(text).green(),
        Tone::Warning => style(text).yellow(),
        Tone::Danger => style(text).red(),
        Tone::Info => style(text).cyan(),
        Tone::Primary => style(text).blue(),
        Tone::Accent => style(text).magenta(),
        Tone::Neutral => style(text).dim(),
    }
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Entity ID (truncated, cyan)
    Id(String),
    /// Plain text, truncated to the column
    Text(String),
    /// Colored label from the formatter tables
    Badge(Badge),
    /// Conformity percentage colored by threshold
    Percent(u32),
    Date(Option<NaiveDate>),
    DateTime(DateTime<Utc>),
    Number(i64),
    Empty,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn opt_text(s: Option<&str>) -> Self {
        s.map_or(CellValue::Empty, |s| CellValue::Text(s.to_string()))
    }

    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => {
                format!("{:<width$}", style(format_short_id_str(id)).cyan(), width = width)
            }
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width.saturating_sub(2)), width = width)
            }
            CellValue::Badge(badge) => format!("{:<width$}", styled_badge(badge), width = width),
            CellValue::Percent(p) => {
                let badge = crate::analysis::format::conformity(*p);
                format!("{:>width$}", styled_badge(&badge), width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            _ => format!("{:<width$}", self.format_md(), width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Badge(badge) => escape_csv(&badge.label),
            CellValue::Empty => String::new(),
            _ => escape_csv(&self.raw()),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Badge(badge) => badge.label.to_string(),
            CellValue::Empty => "-".to_string(),
            CellValue::Date(None) => "-".to_string(),
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d %H:%M").to_string()
            }
            _ => self.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Raw string value (no formatting, for ID output)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => s.clone(),
            CellValue::Badge(badge) => badge.label.to_string(),
            CellValue::Percent(p) => format!("{}%", p),
            CellValue::Date(d) => d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Id(id) => id.chars().count().min(16),
            CellValue::Date(_) => 10,
            CellValue::DateTime(_) => 16,
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub short_id: String,
    pub full_id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    /// `position` is the row's 1-based place in the listing, which becomes its alias
    pub fn new(full_id: String, prefix: &str, position: usize) -> Self {
        Self {
            short_id: format!("{}@{}", prefix, position),
            full_id,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    entity_prefix: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str, entity_prefix: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            entity_prefix,
            show_summary: true,
        }
    }

    /// Hide the trailing "N found" line (piping, quiet mode)
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Output rows in the specified format
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        match format {
            OutputFormat::Csv => self.output_csv(rows),
            OutputFormat::Md => self.output_md(rows),
            OutputFormat::Id => {
                for row in rows {
                    println!("{}", row.full_id);
                }
            }
            _ => self.output_tsv(rows),
        }
    }

    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let short_width = rows
            .iter()
            .map(|r| r.short_id.len())
            .max()
            .unwrap_or(5)
            .max(5);
        let mut widths = vec![short_width];

        for col in self.columns {
            let max_content = rows
                .iter()
                .filter_map(|r| r.get(col.key))
                .map(CellValue::display_width)
                .max()
                .unwrap_or(0);
            // +2 leaves room for the truncation marker
            let natural = col.header.len().max(max_content.saturating_add(2));
            widths.push(natural.min(col.width));
        }
        widths
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let mut header = vec![format!("{:<w$}", style("SHORT").bold().dim(), w = widths[0])];
        for (col, w) in self.columns.iter().zip(&widths[1..]) {
            header.push(format!("{:<w$}", style(col.header).bold(), w = *w));
        }
        println!("{}", header.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let mut parts = vec![format!("{:<w$}", style(&row.short_id).cyan(), w = widths[0])];
            for (col, w) in self.columns.iter().zip(&widths[1..]) {
                parts.push(match row.get(col.key) {
                    Some(value) => value.format_tsv(*w),
                    None => format!("{:<w$}", "-", w = *w),
                });
            }
            println!("{}", parts.join(" "));
        }

        if self.show_summary {
            println!();
            println!(
                "{} {}(s) found. Use {} to reference by short ID.",
                style(rows.len()).cyan(),
                self.entity_name,
                style(format!("{}@N", self.entity_prefix)).cyan()
            );
        }
    }

    fn output_csv(&self, rows: &[TableRow]) {
        let mut header = vec!["short_id", "id"];
        header.extend(self.columns.iter().filter(|c| c.key != "id").map(|c| c.key));
        println!("{}", header.join(","));

        for row in rows {
            let mut values = vec![row.short_id.clone(), row.full_id.clone()];
            for col in self.columns.iter().filter(|c| c.key != "id") {
                values.push(row.get(col.key).map(CellValue::format_csv).unwrap_or_default());
            }
            println!("{}", values.join(","));
        }
    }

    fn output_md(&self, rows: &[TableRow]) {
        let mut header = vec!["Short"];
        header.extend(self.columns.iter().map(|c| c.header));
        println!("| {} |", header.join(" | "));
        println!("|{}", "---|".repeat(header.len()));

        for row in rows {
            let mut values = vec![row.short_id.clone()];
            for col in self.columns {
                values.push(
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            println!("| {} |", values.join(" | "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::format;

    #[test]
    fn test_cell_raw_and_md() {
        assert_eq!(CellValue::Percent(30).raw(), "30%");
        assert_eq!(CellValue::Empty.format_md(), "-");
        assert_eq!(CellValue::text("a|b").format_md(), "a\\|b");
        assert_eq!(CellValue::Badge(format::item_status("concluido")).format_csv(), "Concluído");
        assert_eq!(
            CellValue::Date(NaiveDate::from_ymd_opt(2025, 1, 31)).raw(),
            "2025-01-31"
        );
    }

    #[test]
    fn test_row_short_id_and_lookup() {
        let row = TableRow::new("RISK-1".to_string(), "RISK", 3).cell("title", CellValue::text("Vazamento"));
        assert_eq!(row.short_id, "RISK@3");
        assert!(row.get("title").is_some());
        assert!(row.get("status").is_none());
    }

    #[test]
    fn test_widths_respect_caps() {
        const COLUMNS: &[ColumnDef] = &[
            ColumnDef::new("id", "ID", 17),
            ColumnDef::new("title", "TITLE", 10),
        ];
        let rows = vec![TableRow::new("CHK-1".to_string(), "CHK", 1)
            .cell("id", CellValue::Id("CHK-1".to_string()))
            .cell("title", CellValue::text("um título bastante longo"))];
        let widths = TableFormatter::new(COLUMNS, "checklist", "CHK").calculate_widths(&rows);
        assert_eq!(widths, vec![5, 7, 10]);
    }
}
