//! `comply init` command - Initialize a new compliance project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::GlobalOpts;
use crate::core::context::AppContext;
use crate::core::project::{Project, ProjectError};
use crate::entities::audit_log::{ActionType, AuditLog, EntityType};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Force initialization even if .comply/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        if !global.quiet {
            println!(
                "{} Created directory {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    match Project::init(&path, args.force) {
        Ok(project) => {
            let ctx = AppContext::from_project(project);
            ctx.record(AuditLog::new(
                ActionType::Create,
                EntityType::System,
                "Projeto de conformidade inicializado",
            ))?;

            if global.quiet {
                return Ok(());
            }
            println!(
                "{} Initialized comply project at {}",
                style("✓").green(),
                style(ctx.project().root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(ctx.project().root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Create your first checklist",
                style("comply checklist new \"Adequação LGPD\"").yellow()
            );
            println!("  {} Register a risk", style("comply risk new").yellow());
            println!("  {} See where you stand", style("comply dashboard").yellow());
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} comply project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("comply init --force").yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_structure(root: &Path) {
    let entries = [
        ".comply/",
        ".comply/config.yaml",
        ".comply/audit.jsonl",
        "checklists/",
        "risks/",
        "trainings/",
        "notifications/",
        "evidence/",
    ];

    for entry in entries {
        if root.join(entry).exists() {
            println!("  {}", style(entry).dim());
        }
    }
}
