//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    audit::AuditCommands, checklist::ChecklistCommands, completions::CompletionsArgs,
    config::ConfigCommands, dashboard::DashboardArgs, init::InitArgs, notify::NotifyCommands,
    risk::RiskCommands, training::TrainingCommands,
};

#[derive(Parser)]
#[command(name = "comply")]
#[command(author, version, about = "LGPD compliance toolkit")]
#[command(
    long_about = "Manage LGPD compliance checklists, risks, trainings, notifications and the audit trail as plain-text files."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .comply/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new compliance project
    Init(InitArgs),

    /// Compliance checklists, their items and evidence
    #[command(subcommand)]
    Checklist(ChecklistCommands),

    /// Risk register: assessments, treatment plans, matrix
    #[command(subcommand)]
    Risk(RiskCommands),

    /// Data-protection trainings and assignments
    #[command(subcommand)]
    Training(TrainingCommands),

    /// Notifications and deadline checks
    #[command(subcommand)]
    Notify(NotifyCommands),

    /// Audit trail queries, statistics and export
    #[command(subcommand)]
    Audit(AuditCommands),

    /// Compliance dashboard with metrics and recommendations
    Dashboard(DashboardArgs),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (tables for lists, cards for show)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON envelope {"success": true, "data": ...}
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
