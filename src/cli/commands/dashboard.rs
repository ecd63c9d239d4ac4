//! `comply dashboard` command - Compliance overview

use console::style;
use miette::Result;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::analysis::format;
use crate::analysis::metrics::{ChartData, ComplianceMetrics, Recommendation};
use crate::cli::commands::open_context;
use crate::cli::commands::risk::RiskDashboard;
use crate::cli::helpers::{print_structured, resolve_format};
use crate::cli::table::styled_badge;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::Store;
use crate::entities::checklist::{Checklist, ItemStatus, RiskRating};
use crate::entities::notification::Notification;
use crate::entities::risk::Risk;
use crate::entities::training::Training;

#[derive(clap::Args, Debug)]
pub struct DashboardArgs {
    /// Restrict metrics to one checklist
    #[arg(long, short = 'c')]
    pub checklist: Option<String>,
}

#[derive(Debug, Serialize)]
struct TrainingSummary {
    active: usize,
    assignments: usize,
    completed: usize,
    completion_pct: u32,
}

#[derive(Debug, Serialize)]
struct Dashboard {
    checklists: usize,
    metrics: ComplianceMetrics,
    charts: ChartData,
    recommendations: Vec<Recommendation>,
    risks: RiskDashboard,
    trainings: TrainingSummary,
    unread_notifications: usize,
}

pub fn run(args: DashboardArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;

    let checklists: Vec<Checklist> = match args.checklist {
        Some(ref reference) => vec![ctx.store.get(&ctx.resolve(reference))?],
        None => ctx.store.load_all()?,
    };
    let metrics = ComplianceMetrics::from_items(checklists.iter().flat_map(|c| &c.items));
    let recommendations = metrics.recommendations(&ctx.config.recommendations());

    let risks = ctx.store.load_all::<Risk>()?;
    let trainings: Vec<Training> = ctx
        .store
        .load_all::<Training>()?
        .into_iter()
        .filter(|t| t.active)
        .collect();
    let assignments: usize = trainings.iter().map(|t| t.assignments.len()).sum();
    let completed: usize = trainings.iter().map(Training::completed_count).sum();
    let unread = ctx
        .store
        .load_all::<Notification>()?
        .iter()
        .filter(|n| n.user == ctx.actor() && n.is_unread())
        .count();

    let dashboard = Dashboard {
        checklists: checklists.len(),
        charts: metrics.chart_data(),
        metrics,
        recommendations,
        risks: RiskDashboard::build(&risks, ctx.config.severity()),
        trainings: TrainingSummary {
            active: trainings.len(),
            assignments,
            completed,
            completion_pct: crate::analysis::metrics::conformity_percent(completed, assignments),
        },
        unread_notifications: unread,
    };

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &dashboard)? {
        return Ok(());
    }
    print_dashboard(&dashboard);
    Ok(())
}

fn print_dashboard(d: &Dashboard) {
    let m = &d.metrics;
    println!("{}", style("Compliance dashboard").bold().underlined());
    println!();
    println!(
        "{}: {}  ({} of {} items concluded in {} checklist(s))",
        style("Overall conformity").bold(),
        styled_badge(&format::conformity(m.overall_percent)),
        m.by_status.concluido,
        m.total,
        d.checklists
    );

    let statuses: Vec<String> = ItemStatus::all()
        .iter()
        .map(|s| {
            format!(
                "{} {}",
                styled_badge(&format::item_status(s.as_str())),
                m.by_status.get(*s)
            )
        })
        .collect();
    println!("{}: {}", style("Items").bold(), statuses.join("  "));
    let risks: Vec<String> = RiskRating::all()
        .iter()
        .map(|r| {
            format!(
                "{} {}",
                styled_badge(&format::risk_rating(r.as_str())),
                m.by_risk.get(*r)
            )
        })
        .collect();
    println!("{}: {}", style("Item risk").bold(), risks.join("  "));

    if !m.categories.is_empty() {
        println!();
        let mut builder = Builder::default();
        builder.push_record(["Categoria", "Itens", "Concluídos", "Conformidade"]);
        for c in &m.categories {
            builder.push_record([
                c.category.clone(),
                c.total.to_string(),
                c.completed.to_string(),
                format!("{}%", c.percent),
            ]);
        }
        println!("{}", builder.build().with(Style::markdown()));
    }

    println!();
    println!("{}", style("Recommendations").bold());
    if d.recommendations.is_empty() {
        println!("  {} Nothing pressing", style("✓").green());
    }
    for rec in &d.recommendations {
        println!("  {} {}", style("•").yellow(), rec.message);
    }

    println!();
    let open = d
        .risks
        .by_status
        .iter()
        .filter(|e| !e.status.is_closed())
        .map(|e| e.count)
        .sum::<usize>();
    println!(
        "{}: {} registered, {} open, {} placed in the residual matrix",
        style("Risks").bold(),
        d.risks.total,
        open,
        d.risks.matrix.placed()
    );
    println!(
        "{}: {} active, {} of {} assignments completed ({})",
        style("Trainings").bold(),
        d.trainings.active,
        d.trainings.completed,
        d.trainings.assignments,
        styled_badge(&format::conformity(d.trainings.completion_pct))
    );
    println!(
        "{}: {}",
        style("Unread notifications").bold(),
        if d.unread_notifications > 0 {
            style(d.unread_notifications.to_string()).cyan()
        } else {
            style("0".to_string()).dim()
        }
    );
}
