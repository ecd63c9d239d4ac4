//! `comply risk` command - Risk register, assessments and treatment plans

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::analysis::format;
use crate::analysis::matrix::{MatrixMode, RiskMatrix, SeverityThresholds};
use crate::cli::commands::open_context;
use crate::cli::helpers::{confirm, or_dash, print_structured, resolve_format, success, truncate_str};
use crate::cli::table::{styled_badge, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::store::{Store, StoreError};
use crate::entities::audit_log::{ActionType, AuditLog, EntityType};
use crate::entities::risk::{Assessment, PlanStatus, Risk, RiskStatus, TreatmentPlan};
use crate::entities::ValidationError;

#[derive(Subcommand, Debug)]
pub enum RiskCommands {
    /// List risks with their current level
    List(ListArgs),

    /// Register a new risk
    New(NewArgs),

    /// Show a risk with its assessments and treatment plan
    Show(ShowArgs),

    /// Move a risk along its lifecycle
    Status(StatusArgs),

    /// Delete a risk
    Delete(DeleteArgs),

    /// Record a probability x impact assessment
    Assess(AssessArgs),

    /// Manage treatment plan actions
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Show the 5x5 probability x impact matrix
    Matrix(MatrixArgs),

    /// Totals by status plus the residual matrix
    Dashboard,
}

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// Add an action to a risk's treatment plan
    Add(PlanAddArgs),

    /// Change a plan action
    Update(PlanUpdateArgs),

    /// Remove a plan action
    Delete(PlanDeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[arg(long, short = 's')]
    pub status: Option<RiskStatus>,

    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Only risks whose current level is at least this
    #[arg(long)]
    pub min_level: Option<u8>,

    /// Hide closed risks
    #[arg(long)]
    pub open: bool,

    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Short title of the risk
    pub title: String,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Affected asset (system, process, dataset)
    #[arg(long)]
    pub asset: Option<String>,

    /// Where the risk comes from
    #[arg(long)]
    pub source: Option<String>,

    /// Checklist item that raised the risk
    #[arg(long)]
    pub item: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Risk ID, ID fragment or short ID (RISK@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Risk ID, ID fragment or short ID (RISK@N)
    pub id: String,

    /// New status
    pub status: RiskStatus,

    /// Allow moves outside the lifecycle
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct AssessArgs {
    /// Risk ID, ID fragment or short ID (RISK@N)
    pub id: String,

    /// Probability (1-5)
    #[arg(long, short = 'p')]
    pub probability: u8,

    /// Impact (1-5)
    #[arg(long, short = 'i')]
    pub impact: u8,

    /// Residual probability after controls (1-5)
    #[arg(long, requires = "residual_impact")]
    pub residual_probability: Option<u8>,

    /// Residual impact after controls (1-5)
    #[arg(long, requires = "residual_probability")]
    pub residual_impact: Option<u8>,

    /// Controls already in place
    #[arg(long)]
    pub controls: Option<String>,

    #[arg(long)]
    pub probability_rationale: Option<String>,

    #[arg(long)]
    pub impact_rationale: Option<String>,

    #[arg(long)]
    pub residual_rationale: Option<String>,

    #[arg(long, short = 'n')]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct PlanAddArgs {
    /// Risk ID, ID fragment or short ID (RISK@N)
    pub risk: String,

    /// Action to take
    pub action: String,

    #[arg(long, short = 'o')]
    pub owner: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,

    #[arg(long)]
    pub cost: Option<f64>,

    #[arg(long, short = 'n')]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct PlanUpdateArgs {
    /// Risk ID, ID fragment or short ID (RISK@N)
    pub risk: String,

    /// Plan action ID or fragment
    pub plan: String,

    #[arg(long, short = 's')]
    pub status: Option<PlanStatus>,

    #[arg(long, short = 'a')]
    pub action: Option<String>,

    #[arg(long, short = 'o')]
    pub owner: Option<String>,

    #[arg(long)]
    pub due: Option<NaiveDate>,

    #[arg(long)]
    pub cost: Option<f64>,

    #[arg(long, short = 'n')]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct PlanDeleteArgs {
    pub risk: String,

    pub plan: String,
}

#[derive(clap::Args, Debug)]
pub struct MatrixArgs {
    /// Which assessment values place each risk
    #[arg(long, short = 'm', default_value = "residual")]
    pub mode: MatrixMode,
}

pub fn run(cmd: RiskCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RiskCommands::List(args) => run_list(args, global),
        RiskCommands::New(args) => run_new(args, global),
        RiskCommands::Show(args) => run_show(args, global),
        RiskCommands::Status(args) => run_status(args, global),
        RiskCommands::Delete(args) => run_delete(args, global),
        RiskCommands::Assess(args) => run_assess(args, global),
        RiskCommands::Plan(cmd) => match cmd {
            PlanCommands::Add(args) => run_plan_add(args, global),
            PlanCommands::Update(args) => run_plan_update(args, global),
            PlanCommands::Delete(args) => run_plan_delete(args, global),
        },
        RiskCommands::Matrix(args) => run_matrix(args, global),
        RiskCommands::Dashboard => run_dashboard(global),
    }
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("title", "TITLE", 34),
    ColumnDef::new("category", "CATEGORY", 16),
    ColumnDef::new("status", "STATUS", 14),
    ColumnDef::new("level", "LEVEL", 6),
    ColumnDef::new("band", "SEVERITY", 9),
    ColumnDef::new("plans", "PLANS", 6),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut risks = ctx.store.load_all::<Risk>()?;

    risks.retain(|r| {
        args.status.map_or(true, |s| r.status == s)
            && args.category.as_ref().map_or(true, |c| {
                r.category
                    .as_ref()
                    .is_some_and(|rc| rc.to_lowercase() == c.to_lowercase())
            })
            && args
                .min_level
                .map_or(true, |min| r.current_level().is_some_and(|l| l >= min))
            && (!args.open || !r.status.is_closed())
    });
    // Highest level first, unassessed last
    risks.sort_by(|a, b| b.current_level().cmp(&a.current_level()));

    if args.count {
        println!("{}", risks.len());
        return Ok(());
    }

    let format = resolve_format(global, &ctx.config, OutputFormat::Tsv);
    if print_structured(format, &risks)? {
        return Ok(());
    }
    if risks.is_empty() {
        println!("No risks found.");
        println!();
        println!("Register one with: {}", style("comply risk new \"<title>\"").yellow());
        return Ok(());
    }

    let thresholds = ctx.config.severity();
    ctx.remember_listing(EntityPrefix::Risk, risks.iter().map(|r| r.id.to_string()));
    let rows: Vec<TableRow> = risks
        .iter()
        .enumerate()
        .map(|(n, r)| {
            let level = r.current_level();
            TableRow::new(r.id.to_string(), "RISK", n + 1)
                .cell("id", CellValue::Id(r.id.to_string()))
                .cell("title", CellValue::text(&r.title))
                .cell("category", CellValue::opt_text(r.category.as_deref()))
                .cell(
                    "status",
                    CellValue::Badge(format::risk_status_badge(r.status.as_str())),
                )
                .cell(
                    "level",
                    level.map_or(CellValue::Empty, |l| CellValue::Number(l as i64)),
                )
                .cell(
                    "band",
                    level.map_or(CellValue::Empty, |l| {
                        CellValue::Badge(format::severity_band(thresholds.band(l)))
                    }),
                )
                .cell("plans", CellValue::Number(r.treatment_plans.len() as i64))
        })
        .collect();

    let mut formatter = TableFormatter::new(LIST_COLUMNS, "risk", "RISK");
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

    let mut risk = Risk::new(title.to_string(), ctx.actor().to_string());
    risk.description = args.description;
    risk.category = args.category;
    risk.asset = args.asset;
    risk.source = args.source;
    if let Some(item) = args.item {
        risk.checklist_item = Some(ctx.resolve(&item).parse()?);
    }

    ctx.store.save(&risk)?;
    ctx.record(
        AuditLog::new(
            ActionType::Create,
            EntityType::Risco,
            format!("Risco registrado: {}", risk.title),
        )
        .on(&risk.id)
        .with_data(serde_json::json!({ "categoria": risk.category })),
    )?;

    if global.format == OutputFormat::Id {
        println!("{}", risk.id);
        return Ok(());
    }
    success(global, format!("Registered risk {}", style(&risk.id).cyan()));
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let risk: Risk = ctx.store.get(&ctx.resolve(&args.id))?;

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &risk)? {
        return Ok(());
    }
    if format == OutputFormat::Id {
        println!("{}", risk.id);
        return Ok(());
    }

    let thresholds = ctx.config.severity();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&risk.id).cyan());
    println!("{}: {}", style("Title").bold(), style(&risk.title).yellow());
    println!(
        "{}: {}",
        style("Status").bold(),
        styled_badge(&format::risk_status_badge(risk.status.as_str()))
    );
    println!("{}: {}", style("Category").bold(), or_dash(risk.category.as_deref()));
    println!("{}: {}", style("Asset").bold(), or_dash(risk.asset.as_deref()));
    println!("{}: {}", style("Source").bold(), or_dash(risk.source.as_deref()));
    if let Some(ref item) = risk.checklist_item {
        println!("{}: {}", style("Checklist item").bold(), style(item).cyan());
    }
    println!("{}: {}", style("Author").bold(), risk.author);
    if let Some(ref description) = risk.description {
        println!();
        println!("{}", description);
    }
    println!("{}", style("─".repeat(60)).dim());

    match risk.latest_assessment() {
        Some(a) => {
            let inherent = a
                .inherent_level
                .unwrap_or_else(|| a.probability.saturating_mul(a.impact));
            println!(
                "{}: P{} x I{} = {} ({})",
                style("Inherent").bold(),
                a.probability,
                a.impact,
                inherent,
                styled_badge(&format::severity_band(thresholds.band(inherent)))
            );
            if let (Some(p), Some(i), Some(level)) =
                (a.residual_probability, a.residual_impact, a.residual_level)
            {
                println!(
                    "{}: P{} x I{} = {} ({})",
                    style("Residual").bold(),
                    p,
                    i,
                    level,
                    styled_badge(&format::severity_band(thresholds.band(level)))
                );
            }
            if let Some(ref controls) = a.existing_controls {
                println!("{}: {}", style("Controls").bold(), controls);
            }
            println!(
                "{}",
                style(format!(
                    "{} assessment(s); latest by {} on {}",
                    risk.assessments.len(),
                    a.assessed_by,
                    a.assessed_at.format("%Y-%m-%d")
                ))
                .dim()
            );
        }
        None => println!(
            "Not assessed yet. Run {}",
            style(format!("comply risk assess {} -p <1-5> -i <1-5>", risk.id)).yellow()
        ),
    }

    if !risk.treatment_plans.is_empty() {
        println!();
        println!("{}", style("Treatment plan").bold());
        for plan in &risk.treatment_plans {
            println!(
                "  {} {} [{}] owner: {} due: {}",
                style(&plan.id).cyan(),
                plan.action,
                styled_badge(&format::plan_status(plan.status.as_str())),
                or_dash(plan.owner.as_deref()),
                or_dash(plan.due)
            );
        }
    }
    Ok(())
}

fn run_status(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut risk: Risk = ctx.store.get(&ctx.resolve(&args.id))?;
    let from = risk.status;

    risk.set_status(args.status, args.force)?;
    if from == risk.status {
        success(global, format!("{} is already {}", risk.id, risk.status));
        return Ok(());
    }

    ctx.store.save(&risk)?;
    ctx.record(
        AuditLog::new(
            ActionType::Update,
            EntityType::Risco,
            format!("Status do risco alterado: {} -> {}", from, risk.status),
        )
        .on(&risk.id)
        .with_data(serde_json::json!({
            "de": from.as_str(),
            "para": risk.status.as_str(),
            "forcado": args.force,
        })),
    )?;
    success(
        global,
        format!(
            "{} {} -> {}",
            style(&risk.id).cyan(),
            from,
            styled_badge(&format::risk_status_badge(risk.status.as_str()))
        ),
    );
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let risk: Risk = ctx.store.get(&ctx.resolve(&args.id))?;

    if !confirm(&format!("Delete risk '{}'?", risk.title), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    ctx.store.remove::<Risk>(&risk.id)?;
    ctx.record(
        AuditLog::new(
            ActionType::Delete,
            EntityType::Risco,
            format!("Risco excluído: {}", risk.title),
        )
        .on(&risk.id),
    )?;
    success(global, format!("Deleted risk {}", style(&risk.id).cyan()));
    Ok(())
}

fn run_assess(args: AssessArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut risk: Risk = ctx.store.get(&ctx.resolve(&args.id))?;

    let residual = args.residual_probability.zip(args.residual_impact);
    let mut assessment = Assessment::new(
        args.probability,
        args.impact,
        residual,
        ctx.actor().to_string(),
    )?;
    assessment.existing_controls = args.controls;
    assessment.probability_rationale = args.probability_rationale;
    assessment.impact_rationale = args.impact_rationale;
    assessment.residual_rationale = args.residual_rationale;
    assessment.notes = args.notes;

    let inherent = assessment.inherent_level.unwrap_or_default();
    let residual_level = assessment.residual_level.unwrap_or(inherent);
    let assessment_id = assessment.id.clone();
    risk.add_assessment(assessment);
    ctx.store.save(&risk)?;

    ctx.record(
        AuditLog::new(
            ActionType::Create,
            EntityType::AvaliacaoRisco,
            format!("Avaliação registrada para o risco '{}'", risk.title),
        )
        .on(&assessment_id)
        .with_data(serde_json::json!({
            "risco_id": risk.id.to_string(),
            "nivel_inerente": inherent,
            "nivel_residual": residual_level,
        })),
    )?;

    let thresholds = ctx.config.severity();
    success(
        global,
        format!(
            "Assessed {}: inherent {} ({}), residual {} ({})",
            style(&risk.id).cyan(),
            inherent,
            styled_badge(&format::severity_band(thresholds.band(inherent))),
            residual_level,
            styled_badge(&format::severity_band(thresholds.band(residual_level)))
        ),
    );
    Ok(())
}

fn run_plan_add(args: PlanAddArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut risk: Risk = ctx.store.get(&ctx.resolve(&args.risk))?;
    let action = args.action.trim();
    if action.is_empty() {
        return Err(ValidationError::Required("action").into());
    }

    let mut plan = TreatmentPlan::new(action.to_string());
    plan.owner = args.owner;
    plan.due = args.due;
    plan.estimated_cost = args.cost;
    plan.notes = args.notes;
    let plan_id = risk.add_plan(plan).id.clone();
    ctx.store.save(&risk)?;

    ctx.record(
        AuditLog::new(
            ActionType::Create,
            EntityType::PlanoTratamento,
            format!("Ação de tratamento adicionada ao risco '{}'", risk.title),
        )
        .on(&plan_id)
        .with_data(serde_json::json!({ "risco_id": risk.id.to_string() })),
    )?;

    if global.format == OutputFormat::Id {
        println!("{}", plan_id);
        return Ok(());
    }
    success(
        global,
        format!("Added plan action {} to {}", style(&plan_id).cyan(), risk.id),
    );
    Ok(())
}

fn plan_not_found(reference: String) -> StoreError {
    StoreError::NotFound {
        entity: "treatment plan action",
        reference,
    }
}

fn run_plan_update(args: PlanUpdateArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut risk: Risk = ctx.store.get(&ctx.resolve(&args.risk))?;

    let Some(plan) = risk.plan_mut(&args.plan) else {
        return Err(plan_not_found(args.plan).into());
    };

    let mut changes = serde_json::Map::new();
    if let Some(status) = args.status {
        changes.insert("status".into(), status.as_str().into());
        plan.set_status(status);
    }
    if let Some(action) = args.action.filter(|a| !a.trim().is_empty()) {
        changes.insert("acao".into(), action.clone().into());
        plan.action = action;
    }
    if let Some(owner) = args.owner {
        changes.insert("responsavel".into(), owner.clone().into());
        plan.owner = Some(owner);
    }
    if let Some(due) = args.due {
        changes.insert("prazo".into(), due.to_string().into());
        plan.due = Some(due);
    }
    if let Some(cost) = args.cost {
        changes.insert("custo_estimado".into(), cost.into());
        plan.estimated_cost = Some(cost);
    }
    if let Some(notes) = args.notes {
        plan.notes = Some(notes);
        changes.insert("observacoes".into(), true.into());
    }

    if changes.is_empty() {
        println!("Nothing to change. Pass at least one field option.");
        return Ok(());
    }
    let plan_id = plan.id.clone();
    risk.updated = chrono::Utc::now();
    ctx.store.save(&risk)?;

    ctx.record(
        AuditLog::new(
            ActionType::Update,
            EntityType::PlanoTratamento,
            format!("Ação de tratamento atualizada no risco '{}'", risk.title),
        )
        .on(&plan_id)
        .with_data(serde_json::Value::Object(changes)),
    )?;
    success(global, format!("Updated plan action {}", style(&plan_id).cyan()));
    Ok(())
}

fn run_plan_delete(args: PlanDeleteArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut risk: Risk = ctx.store.get(&ctx.resolve(&args.risk))?;

    let Some(plan) = risk.remove_plan(&args.plan) else {
        return Err(plan_not_found(args.plan).into());
    };
    ctx.store.save(&risk)?;
    ctx.record(
        AuditLog::new(
            ActionType::Delete,
            EntityType::PlanoTratamento,
            format!("Ação de tratamento removida: {}", plan.action),
        )
        .on(&plan.id),
    )?;
    success(global, format!("Removed plan action {}", style(&plan.id).cyan()));
    Ok(())
}

/// Open risks with at least one assessment
fn matrix_input(risks: &[Risk]) -> Vec<crate::analysis::matrix::MatrixPoint> {
    risks
        .iter()
        .filter(|r| !r.status.is_closed())
        .filter_map(Risk::matrix_point)
        .collect()
}

/// Render the grid as a markdown table, probability 5 on top
pub(crate) fn render_matrix(matrix: &RiskMatrix) -> String {
    let mut builder = Builder::default();
    let mut header = vec!["P \\ I".to_string()];
    header.extend((1..=5).map(|i| i.to_string()));
    builder.push_record(header);

    for row in &matrix.rows {
        let mut record = Vec::with_capacity(6);
        record.push(row.first().map(|c| c.probability.to_string()).unwrap_or_default());
        for cell in row {
            let band = format::severity_band(cell.band);
            let text = if cell.entries.is_empty() {
                format!("{} ·", band.label)
            } else {
                let names: Vec<String> = cell
                    .entries
                    .iter()
                    .map(|e| truncate_str(&e.name, 18))
                    .collect();
                format!("{} ({}) {}", band.label, cell.entries.len(), names.join("; "))
            };
            record.push(text);
        }
        builder.push_record(record);
    }
    builder.build().with(Style::markdown()).to_string()
}

fn print_matrix(matrix: &RiskMatrix) {
    println!(
        "{} ({} view, {} placed)",
        style("Risk matrix").bold(),
        matrix.mode,
        matrix.placed()
    );
    println!("{}", render_matrix(matrix));
    print_thresholds(&matrix.thresholds);

    if !matrix.skipped.is_empty() {
        println!();
        println!(
            "{} {} risk(s) not placed:",
            style("!").yellow(),
            matrix.skipped.len()
        );
        for s in &matrix.skipped {
            println!("  {} {}: {}", style(&s.id).cyan(), s.name, s.reason);
        }
    }
}

fn print_thresholds(t: &SeverityThresholds) {
    println!(
        "{}",
        style(format!(
            "Baixo <= {} < Médio <= {} < Alto <= {} < Crítico",
            t.baixo, t.medio, t.alto
        ))
        .dim()
    );
}

fn run_matrix(args: MatrixArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let risks = ctx.store.load_all::<Risk>()?;
    let matrix = RiskMatrix::build(&matrix_input(&risks), args.mode, ctx.config.severity());

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &matrix)? {
        return Ok(());
    }
    print_matrix(&matrix);
    Ok(())
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusCount {
    pub status: RiskStatus,
    pub count: usize,
}

/// Risk totals as served by `risk dashboard`
#[derive(Debug, Serialize)]
pub(crate) struct RiskDashboard {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
    pub matrix: RiskMatrix,
}

impl RiskDashboard {
    pub(crate) fn build(risks: &[Risk], thresholds: SeverityThresholds) -> Self {
        Self {
            total: risks.len(),
            by_status: RiskStatus::all()
                .into_iter()
                .map(|status| StatusCount {
                    status,
                    count: risks.iter().filter(|r| r.status == status).count(),
                })
                .collect(),
            matrix: RiskMatrix::build(&matrix_input(risks), MatrixMode::Residual, thresholds),
        }
    }
}

fn run_dashboard(global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let risks = ctx.store.load_all::<Risk>()?;
    let dashboard = RiskDashboard::build(&risks, ctx.config.severity());

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &dashboard)? {
        return Ok(());
    }

    println!("{}: {}", style("Total risks").bold(), style(dashboard.total).cyan());
    let mut builder = Builder::default();
    builder.push_record(["Status", "Count"]);
    for entry in &dashboard.by_status {
        builder.push_record([
            format::risk_status(entry.status.as_str()).label.into_owned(),
            entry.count.to_string(),
        ]);
    }
    println!("{}", builder.build().with(Style::markdown()));
    println!();
    print_matrix(&dashboard.matrix);
    Ok(())
}
