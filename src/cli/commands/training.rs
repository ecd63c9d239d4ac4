//! `comply training` command - Trainings and their assignments

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::analysis::format;
use crate::cli::commands::open_context;
use crate::cli::helpers::{confirm, or_dash, print_structured, resolve_format, success};
use crate::cli::table::{styled_badge, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::context::AppContext;
use crate::core::identity::EntityPrefix;
use crate::core::store::Store;
use crate::entities::audit_log::{ActionType, AuditLog, EntityType};
use crate::entities::training::{Assignment, Training, TrainingStatus};
use crate::entities::ValidationError;

#[derive(Subcommand, Debug)]
pub enum TrainingCommands {
    /// List trainings with their completion
    List(ListArgs),

    /// Create a training
    New(NewArgs),

    /// Show a training and its assignments
    Show(ShowArgs),

    /// Assign a training to one or more users
    Assign(AssignArgs),

    /// Mark a training as started
    Start(StatusArgs),

    /// Mark a training as completed
    Complete(CompleteArgs),

    /// Per-user progress and completion percentage
    Progress(ShowArgs),

    /// Deactivate a training (or remove it with --purge)
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Include inactive trainings
    #[arg(long)]
    pub all: bool,

    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Only trainings assigned to this user
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    pub title: String,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Link to the course material
    #[arg(long)]
    pub url: Option<String>,

    /// Estimated duration in minutes
    #[arg(long)]
    pub duration: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Training ID, ID fragment or short ID (TRN@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AssignArgs {
    /// Training ID, ID fragment or short ID (TRN@N)
    pub id: String,

    /// Users to assign
    #[arg(required = true, num_args = 1..)]
    pub users: Vec<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Training ID, ID fragment or short ID (TRN@N)
    pub id: String,

    /// User whose status changes (default: the configured author)
    #[arg(long, short = 'u')]
    pub user: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CompleteArgs {
    /// Training ID, ID fragment or short ID (TRN@N)
    pub id: String,

    /// User whose status changes (default: the configured author)
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// Assessment score, 0-100
    #[arg(long)]
    pub score: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    pub id: String,

    /// Remove the file instead of deactivating
    #[arg(long)]
    pub purge: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: TrainingCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TrainingCommands::List(args) => run_list(args, global),
        TrainingCommands::New(args) => run_new(args, global),
        TrainingCommands::Show(args) => run_show(args, global),
        TrainingCommands::Assign(args) => run_assign(args, global),
        TrainingCommands::Start(args) => {
            run_transition(args.id, args.user, TrainingStatus::EmAndamento, None, global)
        }
        TrainingCommands::Complete(args) => run_transition(
            args.id,
            args.user,
            TrainingStatus::Concluido,
            args.score,
            global,
        ),
        TrainingCommands::Progress(args) => run_progress(args, global),
        TrainingCommands::Delete(args) => run_delete(args, global),
    }
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("title", "TITLE", 34),
    ColumnDef::new("category", "CATEGORY", 16),
    ColumnDef::new("duration", "MIN", 5),
    ColumnDef::new("assigned", "ASSIGNED", 9),
    ColumnDef::new("done", "DONE", 6),
    ColumnDef::new("completion", "COMPLETION", 11),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut trainings = ctx.store.load_all::<Training>()?;

    trainings.retain(|t| {
        (args.all || t.active)
            && args.category.as_ref().map_or(true, |c| {
                t.category
                    .as_ref()
                    .is_some_and(|tc| tc.to_lowercase() == c.to_lowercase())
            })
            && args
                .user
                .as_ref()
                .map_or(true, |u| t.assignment(u).is_some())
    });

    if args.count {
        println!("{}", trainings.len());
        return Ok(());
    }

    let format = resolve_format(global, &ctx.config, OutputFormat::Tsv);
    if print_structured(format, &trainings)? {
        return Ok(());
    }
    if trainings.is_empty() {
        println!("No trainings found.");
        return Ok(());
    }

    ctx.remember_listing(EntityPrefix::Trn, trainings.iter().map(|t| t.id.to_string()));
    let rows: Vec<TableRow> = trainings
        .iter()
        .enumerate()
        .map(|(n, t)| {
            TableRow::new(t.id.to_string(), "TRN", n + 1)
                .cell("id", CellValue::Id(t.id.to_string()))
                .cell("title", CellValue::text(&t.title))
                .cell("category", CellValue::opt_text(t.category.as_deref()))
                .cell(
                    "duration",
                    t.duration_minutes
                        .map_or(CellValue::Empty, |d| CellValue::Number(d as i64)),
                )
                .cell("assigned", CellValue::Number(t.assignments.len() as i64))
                .cell("done", CellValue::Number(t.completed_count() as i64))
                .cell("completion", CellValue::Percent(t.completion_pct()))
        })
        .collect();

    let mut formatter = TableFormatter::new(LIST_COLUMNS, "training", "TRN");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, format);
    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let title = args.title.trim();
    if title.is_empty() {
        return Err(ValidationError::Required("title").into());
    }

    let mut training = Training::new(title.to_string(), ctx.actor().to_string());
    training.description = args.description;
    training.category = args.category;
    training.material_url = args.url;
    training.duration_minutes = args.duration;
    ctx.store.save(&training)?;
    ctx.record(
        AuditLog::new(
            ActionType::Create,
            EntityType::Treinamento,
            format!("Treinamento criado: {}", training.title),
        )
        .on(&training.id),
    )?;

    if global.format == OutputFormat::Id {
        println!("{}", training.id);
        return Ok(());
    }
    success(global, format!("Created training {}", style(&training.id).cyan()));
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let training: Training = ctx.store.get(&ctx.resolve(&args.id))?;

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &training)? {
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&training.id).cyan());
    println!("{}: {}", style("Title").bold(), style(&training.title).yellow());
    println!("{}: {}", style("Category").bold(), or_dash(training.category.as_deref()));
    println!(
        "{}: {}",
        style("Duration").bold(),
        or_dash(training.duration_minutes.map(|d| format!("{} min", d)))
    );
    println!("{}: {}", style("Material").bold(), or_dash(training.material_url.as_deref()));
    if !training.active {
        println!("{}: {}", style("Status").bold(), style("inativo").dim());
    }
    if let Some(ref description) = training.description {
        println!();
        println!("{}", description);
    }
    println!("{}", style("─".repeat(60)).dim());
    print_assignments(&training);
    Ok(())
}

fn print_assignments(training: &Training) {
    if training.assignments.is_empty() {
        println!("Not assigned to anyone yet.");
        return;
    }
    for a in &training.assignments {
        println!(
            "  {:<20} {} due: {}{}",
            a.user,
            styled_badge(&format::training_status(a.status.as_str())),
            or_dash(a.due),
            a.score.map(|s| format!(" score: {}", s)).unwrap_or_default()
        );
    }
    println!(
        "{}: {} of {} ({})",
        style("Completion").bold(),
        training.completed_count(),
        training.assignments.len(),
        styled_badge(&format::conformity(training.completion_pct()))
    );
}

fn run_assign(args: AssignArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut training: Training = ctx.store.get(&ctx.resolve(&args.id))?;

    let users: Vec<String> = args
        .users
        .iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();
    if users.is_empty() {
        return Err(ValidationError::Required("users").into());
    }

    let report = training.assign(users, args.due);
    ctx.store.save(&training)?;
    ctx.record(
        AuditLog::new(
            ActionType::Update,
            EntityType::Treinamento,
            format!("Treinamento atribuído: {}", training.title),
        )
        .on(&training.id)
        .with_data(serde_json::json!({
            "atribuidos": report.assigned,
            "ja_atribuidos": report.already_assigned,
            "prazo": args.due,
        })),
    )?;

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &report)? {
        return Ok(());
    }
    if !report.assigned.is_empty() {
        success(
            global,
            format!(
                "Assigned {} to {}",
                style(&training.id).cyan(),
                report.assigned.join(", ")
            ),
        );
    }
    if !report.already_assigned.is_empty() && !global.quiet {
        println!(
            "{} Already assigned: {}",
            style("!").yellow(),
            report.already_assigned.join(", ")
        );
    }
    Ok(())
}

fn run_transition(
    id: String,
    user: Option<String>,
    next: TrainingStatus,
    score: Option<f64>,
    global: &GlobalOpts,
) -> Result<()> {
    let ctx = open_context(global)?;
    let mut training: Training = ctx.store.get(&ctx.resolve(&id))?;
    let user = user.unwrap_or_else(|| ctx.actor().to_string());

    if let Some(score) = score {
        if !(0.0..=100.0).contains(&score) {
            return Err(ValidationError::OutOfRange {
                field: "score",
                value: score as i64,
                min: 0,
                max: 100,
            }
            .into());
        }
    }

    let assignment = training.update_status(&user, next)?;
    let stamped = assignment.started_at.or(assignment.completed_at);
    let position = training.assignments.iter().position(|a| a.user == user);
    if let (Some(score), Some(pos)) = (score, position) {
        training.assignments[pos].score = Some(score);
    }
    ctx.store.save(&training)?;

    ctx.record(
        AuditLog::new(
            ActionType::Update,
            EntityType::StatusTreinamento,
            format!("Status do treinamento '{}' alterado para {}", training.title, next),
        )
        .on(&training.id)
        .with_data(serde_json::json!({
            "usuario": user,
            "status": next.as_str(),
            "nota": score,
        })),
    )?;
    tracing::debug!(training = %training.id, %user, status = %next, ?stamped, "training status updated");

    success(
        global,
        format!(
            "{} {} for {}",
            style(&training.id).cyan(),
            styled_badge(&format::training_status(next.as_str())),
            user
        ),
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct Progress<'a> {
    id: String,
    title: &'a str,
    assigned: usize,
    completed: usize,
    completion_pct: u32,
    assignments: &'a [Assignment],
}

fn progress(training: &Training) -> Progress<'_> {
    Progress {
        id: training.id.to_string(),
        title: &training.title,
        assigned: training.assignments.len(),
        completed: training.completed_count(),
        completion_pct: training.completion_pct(),
        assignments: &training.assignments,
    }
}

fn run_progress(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let training: Training = ctx.store.get(&ctx.resolve(&args.id))?;

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &progress(&training))? {
        return Ok(());
    }
    println!("{} {}", style(&training.id).cyan(), style(&training.title).yellow());
    print_assignments(&training);
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut training: Training = ctx.store.get(&ctx.resolve(&args.id))?;

    if args.purge {
        let prompt = format!(
            "Delete training '{}' with {} assignment(s)?",
            training.title,
            training.assignments.len()
        );
        if !confirm(&prompt, args.yes)? {
            println!("Cancelled.");
            return Ok(());
        }
        ctx.store.remove::<Training>(&training.id)?;
        record_removal(&ctx, &training, "Treinamento excluído")?;
        success(global, format!("Deleted training {}", style(&training.id).cyan()));
        return Ok(());
    }

    if !training.active {
        success(global, format!("{} is already inactive", training.id));
        return Ok(());
    }
    training.active = false;
    ctx.store.save(&training)?;
    record_removal(&ctx, &training, "Treinamento desativado")?;
    success(
        global,
        format!("Deactivated training {}", style(&training.id).cyan()),
    );
    Ok(())
}

fn record_removal(ctx: &AppContext, training: &Training, what: &str) -> Result<()> {
    ctx.record(
        AuditLog::new(
            ActionType::Delete,
            EntityType::Treinamento,
            format!("{}: {}", what, training.title),
        )
        .on(&training.id),
    )?;
    Ok(())
}
