//! `comply audit` command - Query, summarize and export the audit trail

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::analysis::audit_query::{
    self, entity_history, newest_first, user_activity, AuditFilter, AuditQuery, AuditStats,
    ExportFormat, HISTORY_LIMIT,
};
use crate::analysis::format;
use crate::cli::commands::open_context;
use crate::cli::helpers::{or_dash, print_structured, resolve_format, success};
use crate::cli::table::{styled_badge, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::StoreError;
use crate::entities::audit_log::{ActionType, AuditLog, EntityType};

#[derive(Subcommand, Debug)]
pub enum AuditCommands {
    /// List audit entries, newest first, one page at a time
    List(ListArgs),

    /// Show one audit entry in full
    Show(ShowArgs),

    /// Actions recorded against one entity
    History(HistoryArgs),

    /// Actions performed by one user
    User(UserArgs),

    /// Counts by action, entity and user, plus the last 7 days
    Stats,

    /// Export matching entries as CSV or JSON
    Export(ExportArgs),
}

/// Filter criteria shared by `list` and `export`
#[derive(clap::Args, Debug, Default)]
pub struct FilterArgs {
    /// Acting user
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// Action type (create, update, delete, upload, export, ...)
    #[arg(long, short = 'a')]
    pub action: Option<ActionType>,

    /// Entity type (checklist, checklist_item, risco, treinamento, ...)
    #[arg(long, short = 'e')]
    pub entity: Option<EntityType>,

    #[arg(long)]
    pub entity_id: Option<String>,

    /// From this day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Through this day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Text in the description or additional data
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

impl FilterArgs {
    fn into_filter(self) -> AuditFilter {
        AuditFilter {
            user_id: self.user,
            action_type: self.action,
            entity_type: self.entity,
            entity_id: self.entity_id,
            start_date: self.from,
            end_date: self.to,
            search: self.search,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Page number, starting at 1
    #[arg(long, short = 'p', default_value_t = 1)]
    pub page: usize,

    /// Entries per page (default: configured page_size)
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Audit entry ID or fragment
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Entity type (checklist, checklist_item, risco, ...)
    pub entity_type: EntityType,

    /// Entity ID or short ID
    pub entity_id: String,
}

#[derive(clap::Args, Debug)]
pub struct UserArgs {
    pub user: String,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// File format (default: json with --format json, otherwise csv)
    #[arg(long = "as", value_enum)]
    pub export_format: Option<ExportFormat>,

    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(cmd: AuditCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AuditCommands::List(args) => run_list(args, global),
        AuditCommands::Show(args) => run_show(args, global),
        AuditCommands::History(args) => run_history(args, global),
        AuditCommands::User(args) => run_user(args, global),
        AuditCommands::Stats => run_stats(global),
        AuditCommands::Export(args) => run_export(args, global),
    }
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("when", "WHEN", 17),
    ColumnDef::new("user", "USER", 14),
    ColumnDef::new("action", "ACTION", 12),
    ColumnDef::new("entity", "ENTITY", 20),
    ColumnDef::new("description", "DESCRIPTION", 50),
];

fn entry_rows(entries: &[&AuditLog], offset: usize) -> Vec<TableRow> {
    entries
        .iter()
        .enumerate()
        .map(|(n, log)| {
            TableRow::new(log.id.to_string(), "LOG", offset + n + 1)
                .cell("id", CellValue::Id(log.id.to_string()))
                .cell("when", CellValue::DateTime(log.timestamp))
                .cell(
                    "user",
                    CellValue::text(log.user_id.as_deref().unwrap_or("Sistema")),
                )
                .cell(
                    "action",
                    CellValue::Badge(format::action_type(log.action_type.as_str())),
                )
                .cell(
                    "entity",
                    CellValue::Badge(format::entity_type(log.entity_type.as_str())),
                )
                .cell("description", CellValue::text(&log.description))
        })
        .collect()
}

fn print_entries(entries: &[&AuditLog], format: OutputFormat, what: &'static str) {
    if entries.is_empty() {
        println!("No audit entries found.");
        return;
    }
    TableFormatter::new(LIST_COLUMNS, what, "LOG")
        .without_summary()
        .output(&entry_rows(entries, 0), format);
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut logs = ctx.trail.read_all()?;
    newest_first(&mut logs);

    let mut query = AuditQuery::new(args.page_size.unwrap_or_else(|| ctx.config.page_size()));
    query.set_filter(args.filter.into_filter());
    query.set_page(args.page);
    let page = query.run(&logs);

    let format = resolve_format(global, &ctx.config, OutputFormat::Tsv);
    if print_structured(format, &page)? {
        return Ok(());
    }
    if page.items.is_empty() {
        if page.total_items > 0 {
            println!(
                "Page {} is past the end ({} page(s)).",
                page.page, page.total_pages
            );
        } else {
            println!("No audit entries found.");
        }
        return Ok(());
    }

    let offset = (page.page - 1) * page.page_size;
    TableFormatter::new(LIST_COLUMNS, "audit entry", "LOG")
        .without_summary()
        .output(&entry_rows(&page.items, offset), format);
    if !global.quiet && matches!(format, OutputFormat::Tsv | OutputFormat::Auto) {
        println!();
        println!(
            "Page {} of {} ({} entries). Use {} for more.",
            style(page.page).cyan(),
            page.total_pages,
            page.total_items,
            style("--page N").yellow()
        );
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let logs = ctx.trail.read_all()?;

    let needle = args.id.trim().to_uppercase();
    let mut matches: Vec<&AuditLog> = logs
        .iter()
        .filter(|l| !needle.is_empty() && l.id.to_string().contains(&needle))
        .collect();
    if let Some(pos) = matches.iter().position(|l| l.id.to_string() == needle) {
        matches = vec![matches[pos]];
    }
    let log = match matches.as_slice() {
        [one] => *one,
        [] => {
            return Err(StoreError::NotFound {
                entity: "audit entry",
                reference: args.id,
            }
            .into())
        }
        many => {
            return Err(StoreError::Ambiguous {
                entity: "audit entry",
                reference: args.id,
                matches: many.iter().map(|l| l.id.to_string()).collect(),
            }
            .into())
        }
    };

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, log)? {
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&log.id).cyan());
    println!(
        "{}: {}",
        style("When").bold(),
        log.timestamp.format("%d/%m/%Y %H:%M:%S")
    );
    println!(
        "{}: {}",
        style("User").bold(),
        log.user_id.as_deref().unwrap_or("Sistema")
    );
    println!(
        "{}: {}",
        style("Action").bold(),
        styled_badge(&format::action_type(log.action_type.as_str()))
    );
    println!(
        "{}: {} {}",
        style("Entity").bold(),
        styled_badge(&format::entity_type(log.entity_type.as_str())),
        or_dash(log.entity_id.as_deref())
    );
    println!("{}: {}", style("IP").bold(), or_dash(log.ip_address.as_deref()));
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", log.description);
    if let Some(ref data) = log.additional_data {
        println!();
        println!(
            "{}",
            serde_json::to_string_pretty(data).into_diagnostic()?
        );
    }
    Ok(())
}

fn run_history(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let logs = ctx.trail.read_all()?;
    let entity_id = ctx.resolve(&args.entity_id);
    let history = entity_history(&logs, &args.entity_type, &entity_id, HISTORY_LIMIT);

    let format = resolve_format(global, &ctx.config, OutputFormat::Tsv);
    if print_structured(format, &history)? {
        return Ok(());
    }
    print_entries(&history, format, "audit entry");
    Ok(())
}

fn run_user(args: UserArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let logs = ctx.trail.read_all()?;
    let activity = user_activity(&logs, &args.user, HISTORY_LIMIT);

    let format = resolve_format(global, &ctx.config, OutputFormat::Tsv);
    if print_structured(format, &activity)? {
        return Ok(());
    }
    print_entries(&activity, format, "audit entry");
    Ok(())
}

fn run_stats(global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let logs = ctx.trail.read_all()?;
    let stats = AuditStats::compute(&logs, audit_query::today());

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &stats)? {
        return Ok(());
    }

    println!("{}: {}", style("Total entries").bold(), style(stats.total).cyan());
    println!();

    let mut actions = Builder::default();
    actions.push_record(["Ação", "Total"]);
    for (action, count) in &stats.action_counts {
        actions.push_record([format::action_type(action).label.into_owned(), count.to_string()]);
    }
    println!("{}", actions.build().with(Style::markdown()));
    println!();

    let mut entities = Builder::default();
    entities.push_record(["Entidade", "Total"]);
    for (entity, count) in &stats.entity_counts {
        entities.push_record([format::entity_type(entity).label.into_owned(), count.to_string()]);
    }
    println!("{}", entities.build().with(Style::markdown()));
    println!();

    let mut users = Builder::default();
    users.push_record(["Usuário", "Total"]);
    for user in &stats.user_counts {
        users.push_record([user.user_id.clone(), user.count.to_string()]);
    }
    println!("{}", users.build().with(Style::markdown()));
    println!();

    let mut days = Builder::default();
    days.push_record(["Dia", "Total"]);
    for day in &stats.period_stats {
        days.push_record([day.date.format("%d/%m/%Y").to_string(), day.count.to_string()]);
    }
    println!("{}", days.build().with(Style::markdown()));
    Ok(())
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut logs = ctx.trail.read_all()?;
    newest_first(&mut logs);

    let filter = args.filter.into_filter();
    let selected = filter.apply(&logs);
    let export_format = args.export_format.unwrap_or(match global.format {
        OutputFormat::Json => ExportFormat::Json,
        _ => ExportFormat::Csv,
    });
    let content = audit_query::export(&selected, export_format)?;
    let count = selected.len();

    let format_name = match export_format {
        ExportFormat::Csv => "csv",
        ExportFormat::Json => "json",
    };
    ctx.record(
        AuditLog::new(
            ActionType::Export,
            EntityType::System,
            format!("Logs de auditoria exportados ({})", format_name.to_uppercase()),
        )
        .with_data(serde_json::json!({
            "formato": format_name,
            "registros": count,
            "filtros": filter,
        })),
    )?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, content).into_diagnostic()?;
            success(
                global,
                format!(
                    "Exported {} entries to {}",
                    count,
                    style(path.display()).cyan()
                ),
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}
