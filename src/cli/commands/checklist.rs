//! `comply checklist` command - checklists, items and evidence

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::analysis::format;
use crate::analysis::metrics::ComplianceMetrics;
use crate::cli::commands::open_context;
use crate::cli::helpers::{confirm, or_dash, print_structured, resolve_format, success};
use crate::cli::table::{styled_badge, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::context::AppContext;
use crate::core::entity::Priority;
use crate::core::identity::EntityPrefix;
use crate::core::store::{Store, StoreError};
use crate::core::upload;
use crate::entities::audit_log::{ActionType, AuditLog, EntityType};
use crate::entities::checklist::{Checklist, ChecklistItem, ItemStatus, RiskRating};
use crate::entities::notification::Notification;

#[derive(Subcommand, Debug)]
pub enum ChecklistCommands {
    /// List checklists with their conformity
    List(ListArgs),

    /// Create a new checklist
    New(NewArgs),

    /// Show a checklist with its items
    Show(ShowArgs),

    /// Delete a checklist, its items and stored evidence
    Delete(DeleteArgs),

    /// Manage checklist items
    #[command(subcommand)]
    Item(ItemCommands),

    /// Upload and list item evidence
    #[command(subcommand)]
    Evidence(EvidenceCommands),
}

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Add an item to a checklist
    Add(ItemAddArgs),

    /// Change an item's fields
    Edit(ItemEditArgs),

    /// Remove an item and its evidence
    Delete(ItemDeleteArgs),

    /// List a checklist's items
    List(ItemListArgs),
}

#[derive(Subcommand, Debug)]
pub enum EvidenceCommands {
    /// Attach a file to an item
    Upload(UploadArgs),

    /// List an item's evidence
    List(EvidenceListArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by category (case-insensitive)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Search in name and description (case-insensitive substring)
    #[arg(long)]
    pub search: Option<String>,

    /// Show only the count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Checklist name
    pub name: String,

    #[arg(long, short = 'c')]
    pub category: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Checklist ID, ID fragment or short ID (CHK@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Checklist ID, ID fragment or short ID (CHK@N)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ItemAddArgs {
    /// Checklist the item belongs to
    pub checklist: String,

    /// Item name
    pub name: String,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'c')]
    pub category: Option<String>,

    #[arg(long, short = 'r', default_value = "medio")]
    pub risk: RiskRating,

    #[arg(long, short = 'p', default_value = "media")]
    pub priority: Priority,

    #[arg(long, short = 's', default_value = "pendente")]
    pub status: ItemStatus,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct ItemEditArgs {
    /// Item ID, ID fragment or short ID (ITEM@N)
    pub item: String,

    #[arg(long, short = 'n')]
    pub name: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'c')]
    pub category: Option<String>,

    #[arg(long, short = 'r')]
    pub risk: Option<RiskRating>,

    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,

    #[arg(long, short = 's')]
    pub status: Option<ItemStatus>,

    /// Due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<NaiveDate>,

    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
}

#[derive(clap::Args, Debug)]
pub struct ItemDeleteArgs {
    /// Item ID, ID fragment or short ID (ITEM@N)
    pub item: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ItemListArgs {
    /// Checklist ID, ID fragment or short ID (CHK@N)
    pub checklist: String,

    #[arg(long, short = 's')]
    pub status: Option<ItemStatus>,

    #[arg(long, short = 'r')]
    pub risk: Option<RiskRating>,
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Item ID, ID fragment or short ID (ITEM@N)
    pub item: String,

    /// File to upload (PDF, PNG, JPG, DOC, DOCX, XLS, XLSX, TXT; up to 10 MiB)
    pub file: PathBuf,

    /// Observation stored with the evidence
    #[arg(long, short = 'n')]
    pub note: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct EvidenceListArgs {
    /// Item ID, ID fragment or short ID (ITEM@N)
    pub item: String,
}

pub fn run(cmd: ChecklistCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ChecklistCommands::List(args) => run_list(args, global),
        ChecklistCommands::New(args) => run_new(args, global),
        ChecklistCommands::Show(args) => run_show(args, global),
        ChecklistCommands::Delete(args) => run_delete(args, global),
        ChecklistCommands::Item(cmd) => match cmd {
            ItemCommands::Add(args) => run_item_add(args, global),
            ItemCommands::Edit(args) => run_item_edit(args, global),
            ItemCommands::Delete(args) => run_item_delete(args, global),
            ItemCommands::List(args) => run_item_list(args, global),
        },
        ChecklistCommands::Evidence(cmd) => match cmd {
            EvidenceCommands::Upload(args) => run_upload(args, global),
            EvidenceCommands::List(args) => run_evidence_list(args, global),
        },
    }
}

/// Row shape of `checklist list` in JSON/YAML
#[derive(Debug, Serialize)]
struct ChecklistSummary<'a> {
    id: String,
    name: &'a str,
    category: Option<&'a str>,
    status: &'a str,
    total_items: usize,
    completed_items: usize,
    completion_pct: u32,
}

impl<'a> From<&'a Checklist> for ChecklistSummary<'a> {
    fn from(c: &'a Checklist) -> Self {
        use crate::core::entity::Entity;
        Self {
            id: c.id.to_string(),
            name: &c.name,
            category: c.category.as_deref(),
            status: c.status(),
            total_items: c.total_items(),
            completed_items: c.completed_items(),
            completion_pct: c.completion_pct(),
        }
    }
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("name", "NAME", 34),
    ColumnDef::new("category", "CATEGORY", 18),
    ColumnDef::new("items", "ITEMS", 7),
    ColumnDef::new("done", "DONE", 6),
    ColumnDef::new("conformity", "CONFORMITY", 11),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut checklists = ctx.store.load_all::<Checklist>()?;

    checklists.retain(|c| {
        let category_match = args.category.as_ref().map_or(true, |cat| {
            c.category
                .as_ref()
                .is_some_and(|c| c.to_lowercase() == cat.to_lowercase())
        });
        let search_match = args.search.as_ref().map_or(true, |search| {
            let needle = search.to_lowercase();
            c.name.to_lowercase().contains(&needle)
                || c.description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        });
        category_match && search_match
    });

    if args.count {
        println!("{}", checklists.len());
        return Ok(());
    }

    let format = resolve_format(global, &ctx.config, OutputFormat::Tsv);
    let summaries: Vec<ChecklistSummary> = checklists.iter().map(ChecklistSummary::from).collect();
    if print_structured(format, &summaries)? {
        return Ok(());
    }

    if checklists.is_empty() {
        println!("No checklists found.");
        println!();
        println!(
            "Create one with: {}",
            style("comply checklist new \"<name>\"").yellow()
        );
        return Ok(());
    }

    ctx.remember_listing(EntityPrefix::Chk, checklists.iter().map(|c| c.id.to_string()));
    let rows: Vec<TableRow> = checklists
        .iter()
        .enumerate()
        .map(|(n, c)| {
            TableRow::new(c.id.to_string(), "CHK", n + 1)
                .cell("id", CellValue::Id(c.id.to_string()))
                .cell("name", CellValue::text(&c.name))
                .cell("category", CellValue::opt_text(c.category.as_deref()))
                .cell("items", CellValue::Number(c.total_items() as i64))
                .cell("done", CellValue::Number(c.completed_items() as i64))
                .cell("conformity", CellValue::Percent(c.completion_pct()))
        })
        .collect();

    let mut formatter = TableFormatter::new(LIST_COLUMNS, "checklist", "CHK");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, format);
    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let name = args.name.trim();
    if name.is_empty() {
        return Err(crate::entities::ValidationError::Required("name").into());
    }

    let mut checklist = Checklist::new(name.to_string(), ctx.actor().to_string());
    checklist.category = args.category;
    checklist.description = args.description;
    ctx.store.save(&checklist)?;
    ctx.record(
        AuditLog::new(
            ActionType::Create,
            EntityType::Checklist,
            format!("Checklist criado: {}", checklist.name),
        )
        .on(&checklist.id)
        .with_data(serde_json::json!({ "nome": checklist.name })),
    )?;

    if global.format == OutputFormat::Id {
        println!("{}", checklist.id);
        return Ok(());
    }
    success(
        global,
        format!("Created checklist {}", style(&checklist.id).cyan()),
    );
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let checklist: Checklist = ctx.store.get(&ctx.resolve(&args.id))?;

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &checklist)? {
        return Ok(());
    }
    if format == OutputFormat::Id {
        println!("{}", checklist.id);
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("ID").bold(),
        style(&checklist.id).cyan()
    );
    println!("{}: {}", style("Name").bold(), style(&checklist.name).yellow());
    println!("{}: {}", style("Category").bold(), or_dash(checklist.category.as_deref()));
    println!("{}: {}", style("Author").bold(), checklist.author);
    println!(
        "{}: {}",
        style("Created").bold(),
        checklist.created.format("%Y-%m-%d %H:%M")
    );
    if let Some(ref description) = checklist.description {
        println!();
        println!("{}", description);
    }
    println!("{}", style("─".repeat(60)).dim());

    let metrics = ComplianceMetrics::from_items(&checklist.items);
    println!(
        "{}: {} of {} items concluded ({})",
        style("Conformity").bold(),
        metrics.by_status.concluido,
        metrics.total,
        styled_badge(&format::conformity(metrics.overall_percent))
    );
    let risks: Vec<String> = checklist
        .items_by_risk()
        .iter()
        .map(|(risk, n)| format!("{} {}", styled_badge(&format::risk_rating(risk.as_str())), n))
        .collect();
    println!("{}: {}", style("Items by risk").bold(), risks.join("  "));

    if !checklist.items.is_empty() {
        println!();
        print_items(&ctx, &checklist.items, global);
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let checklist: Checklist = ctx.store.get(&ctx.resolve(&args.id))?;

    let prompt = format!(
        "Delete checklist '{}' with {} item(s)?",
        checklist.name,
        checklist.total_items()
    );
    if !confirm(&prompt, args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    ctx.store.remove::<Checklist>(&checklist.id)?;
    for item in &checklist.items {
        upload::remove_files(ctx.project(), &item.evidence);
    }
    ctx.record(
        AuditLog::new(
            ActionType::Delete,
            EntityType::Checklist,
            format!("Checklist excluído: {}", checklist.name),
        )
        .on(&checklist.id),
    )?;
    success(global, format!("Deleted checklist {}", style(&checklist.id).cyan()));
    Ok(())
}

/// Find the checklist holding an item, by item ID, ID fragment or `ITEM@N`
fn locate_item(ctx: &AppContext, reference: &str) -> Result<(Checklist, String)> {
    let reference = ctx.resolve(reference);
    let needle = reference.trim().to_uppercase();
    let mut matches: Vec<(Checklist, String)> = Vec::new();

    for checklist in ctx.store.load_all::<Checklist>()? {
        let ids: Vec<String> = checklist
            .items
            .iter()
            .map(|i| i.id.to_string())
            .filter(|id| !needle.is_empty() && id.contains(&needle))
            .collect();
        if let Some(exact) = ids.iter().find(|id| **id == needle) {
            return Ok((checklist.clone(), exact.clone()));
        }
        for id in ids {
            matches.push((checklist.clone(), id));
        }
    }

    match matches.len() {
        0 => Err(StoreError::NotFound {
            entity: "checklist item",
            reference,
        }
        .into()),
        1 => Ok(matches.remove(0)),
        _ => Err(StoreError::Ambiguous {
            entity: "checklist item",
            reference,
            matches: matches.into_iter().map(|(_, id)| id).collect(),
        }
        .into()),
    }
}

fn run_item_add(args: ItemAddArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut checklist: Checklist = ctx.store.get(&ctx.resolve(&args.checklist))?;
    let name = args.name.trim();
    if name.is_empty() {
        return Err(crate::entities::ValidationError::Required("name").into());
    }

    let item = checklist.add_item(name.to_string());
    item.description = args.description;
    item.category = args.category;
    item.risk = args.risk;
    item.priority = args.priority;
    item.status = args.status;
    item.due = args.due;
    let item_id = item.id.clone();
    let item_name = item.name.clone();

    ctx.store.save(&checklist)?;
    ctx.record(
        AuditLog::new(
            ActionType::Create,
            EntityType::ChecklistItem,
            format!("Item adicionado ao checklist '{}': {}", checklist.name, item_name),
        )
        .on(&item_id)
        .with_data(serde_json::json!({
            "checklist_id": checklist.id.to_string(),
            "risco": args.risk.as_str(),
            "prioridade": args.priority.as_str(),
        })),
    )?;

    if global.format == OutputFormat::Id {
        println!("{}", item_id);
        return Ok(());
    }
    success(
        global,
        format!(
            "Added item {} to {}",
            style(&item_id).cyan(),
            style(&checklist.name).yellow()
        ),
    );
    Ok(())
}

fn run_item_edit(args: ItemEditArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let (mut checklist, item_id) = locate_item(&ctx, &args.item)?;
    let checklist_name = checklist.name.clone();

    let Some(item) = checklist.item_mut(&item_id) else {
        return Err(StoreError::NotFound {
            entity: "checklist item",
            reference: item_id,
        }
        .into());
    };

    let mut changes = serde_json::Map::new();
    if let Some(name) = args.name.filter(|n| !n.trim().is_empty()) {
        changes.insert("nome".into(), name.clone().into());
        item.name = name;
    }
    if let Some(description) = args.description {
        changes.insert("descricao".into(), description.clone().into());
        item.description = Some(description);
    }
    if let Some(category) = args.category {
        changes.insert("categoria".into(), category.clone().into());
        item.category = Some(category);
    }
    if let Some(risk) = args.risk {
        changes.insert("risco".into(), risk.as_str().into());
        item.risk = risk;
    }
    if let Some(priority) = args.priority {
        changes.insert("prioridade".into(), priority.as_str().into());
        item.priority = priority;
    }
    if let Some(status) = args.status {
        changes.insert("status".into(), status.as_str().into());
        item.status = status;
    }
    if let Some(due) = args.due {
        changes.insert("prazo".into(), due.to_string().into());
        item.due = Some(due);
    } else if args.clear_due {
        changes.insert("prazo".into(), serde_json::Value::Null);
        item.due = None;
    }

    if changes.is_empty() {
        println!("Nothing to change. Pass at least one field option.");
        return Ok(());
    }

    let now = Utc::now();
    item.updated = now;
    let item_name = item.name.clone();
    checklist.updated = now;
    ctx.store.save(&checklist)?;
    ctx.record(
        AuditLog::new(
            ActionType::Update,
            EntityType::ChecklistItem,
            format!("Item atualizado: {}", item_name),
        )
        .on(&item_id)
        .with_data(serde_json::Value::Object(changes)),
    )?;
    ctx.store.save(&Notification::item_updated(
        &checklist.author,
        &item_name,
        &checklist_name,
        &item_id,
    ))?;

    success(global, format!("Updated item {}", style(&item_id).cyan()));
    Ok(())
}

fn run_item_delete(args: ItemDeleteArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let (mut checklist, item_id) = locate_item(&ctx, &args.item)?;

    let prompt = format!("Delete item {} from '{}'?", item_id, checklist.name);
    if !confirm(&prompt, args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    let Some(item) = checklist.remove_item(&item_id) else {
        return Err(StoreError::NotFound {
            entity: "checklist item",
            reference: item_id,
        }
        .into());
    };
    ctx.store.save(&checklist)?;
    upload::remove_files(ctx.project(), &item.evidence);
    ctx.record(
        AuditLog::new(
            ActionType::Delete,
            EntityType::ChecklistItem,
            format!("Item excluído: {}", item.name),
        )
        .on(&item.id),
    )?;
    success(global, format!("Deleted item {}", style(&item.id).cyan()));
    Ok(())
}

const ITEM_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("name", "NAME", 34),
    ColumnDef::new("category", "CATEGORY", 16),
    ColumnDef::new("risk", "RISK", 8),
    ColumnDef::new("priority", "PRIORITY", 9),
    ColumnDef::new("status", "STATUS", 14),
    ColumnDef::new("due", "DUE", 11),
    ColumnDef::new("evidence", "EVD", 5),
];

fn print_items(ctx: &AppContext, items: &[ChecklistItem], global: &GlobalOpts) {
    ctx.remember_listing(EntityPrefix::Item, items.iter().map(|i| i.id.to_string()));
    let rows: Vec<TableRow> = items
        .iter()
        .enumerate()
        .map(|(n, i)| {
            TableRow::new(i.id.to_string(), "ITEM", n + 1)
                .cell("id", CellValue::Id(i.id.to_string()))
                .cell("name", CellValue::text(&i.name))
                .cell("category", CellValue::opt_text(i.category.as_deref()))
                .cell("risk", CellValue::Badge(format::risk_rating(i.risk.as_str())))
                .cell("priority", CellValue::Badge(format::priority(i.priority.as_str())))
                .cell("status", CellValue::Badge(format::item_status(i.status.as_str())))
                .cell("due", CellValue::Date(i.due))
                .cell("evidence", CellValue::Number(i.evidence.len() as i64))
        })
        .collect();

    let format = resolve_format(global, &ctx.config, OutputFormat::Tsv);
    let mut formatter = TableFormatter::new(ITEM_COLUMNS, "item", "ITEM");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, format);
}

fn run_item_list(args: ItemListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let checklist: Checklist = ctx.store.get(&ctx.resolve(&args.checklist))?;

    let items: Vec<ChecklistItem> = checklist
        .items
        .into_iter()
        .filter(|i| args.status.map_or(true, |s| i.status == s))
        .filter(|i| args.risk.map_or(true, |r| i.risk == r))
        .collect();

    let format = resolve_format(global, &ctx.config, OutputFormat::Tsv);
    if print_structured(format, &items)? {
        return Ok(());
    }
    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }
    print_items(&ctx, &items, global);
    Ok(())
}

fn run_upload(args: UploadArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let (mut checklist, item_id) = locate_item(&ctx, &args.item)?;

    // Validate before anything is written
    let file = upload::validate(&args.file, ctx.config.max_upload_bytes())?;

    let Some(item) = checklist.item_mut(&item_id) else {
        return Err(StoreError::NotFound {
            entity: "checklist item",
            reference: item_id,
        }
        .into());
    };
    let evidence = upload::ingest(ctx.project(), &item.id, &file, ctx.actor(), args.note)?;
    item.evidence.push(evidence.clone());
    item.updated = Utc::now();
    let item_name = item.name.clone();
    ctx.store.save(&checklist)?;

    ctx.record(
        AuditLog::new(
            ActionType::Upload,
            EntityType::Evidencia,
            format!("Evidência adicionada ao item '{}'", item_name),
        )
        .on(&evidence.id)
        .with_data(serde_json::json!({
            "filename": evidence.original_name,
            "item_id": item_id,
            "size": evidence.size,
        })),
    )?;
    ctx.store
        .save(&Notification::evidence_added(&checklist.author, &item_name, &evidence.id))?;

    if global.format == OutputFormat::Id {
        println!("{}", evidence.id);
        return Ok(());
    }
    success(
        global,
        format!(
            "Uploaded {} as {} ({} bytes)",
            style(&evidence.original_name).yellow(),
            style(&evidence.id).cyan(),
            evidence.size
        ),
    );
    Ok(())
}

fn run_evidence_list(args: EvidenceListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let (checklist, item_id) = locate_item(&ctx, &args.item)?;
    let evidence = checklist
        .item(&item_id)
        .map(|i| i.evidence.clone())
        .unwrap_or_default();

    let format = resolve_format(global, &ctx.config, OutputFormat::Tsv);
    if print_structured(format, &evidence)? {
        return Ok(());
    }
    if evidence.is_empty() {
        println!("No evidence attached to {}.", item_id);
        return Ok(());
    }

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("id", "ID", 17),
        ColumnDef::new("name", "FILE", 30),
        ColumnDef::new("size", "BYTES", 10),
        ColumnDef::new("by", "BY", 14),
        ColumnDef::new("at", "UPLOADED", 17),
        ColumnDef::new("note", "NOTE", 30),
    ];
    let rows: Vec<TableRow> = evidence
        .iter()
        .enumerate()
        .map(|(n, e)| {
            TableRow::new(e.id.to_string(), "EVD", n + 1)
                .cell("id", CellValue::Id(e.id.to_string()))
                .cell("name", CellValue::text(&e.original_name))
                .cell("size", CellValue::Number(e.size as i64))
                .cell("by", CellValue::text(&e.uploaded_by))
                .cell("at", CellValue::DateTime(e.uploaded_at))
                .cell("note", CellValue::opt_text(e.note.as_deref()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "evidence file", "EVD")
        .without_summary()
        .output(&rows, format);
    Ok(())
}
