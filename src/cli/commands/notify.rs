//! `comply notify` command - Notifications and deadline checks

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::analysis::audit_query::today;
use crate::analysis::format;
use crate::cli::commands::open_context;
use crate::cli::helpers::{print_structured, resolve_format, success};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::context::AppContext;
use crate::core::deadlines;
use crate::core::identity::EntityPrefix;
use crate::core::store::Store;
use crate::entities::audit_log::{ActionType, AuditLog, EntityType};
use crate::entities::notification::{Notification, NotificationStatus, NotificationType};

#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// List your notifications, newest first
    List(ListArgs),

    /// Count unread notifications
    Count(CountArgs),

    /// Mark a notification as read
    Read(IdArgs),

    /// Mark a notification as unread
    Unread(IdArgs),

    /// Archive a notification
    Archive(IdArgs),

    /// Mark all of your unread notifications as read
    ReadAll,

    /// Create notifications for upcoming item and training deadlines
    CheckDeadlines(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Everyone's notifications, not only yours
    #[arg(long)]
    pub all: bool,

    #[arg(long, short = 's')]
    pub status: Option<NotificationStatus>,

    #[arg(long = "type", short = 't')]
    pub kind: Option<NotificationType>,

    /// Show at most this many
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct CountArgs {
    /// Count for everyone
    #[arg(long)]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Notification ID, ID fragment or short ID (NTF@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Reference date instead of today (YYYY-MM-DD)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

pub fn run(cmd: NotifyCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        NotifyCommands::List(args) => run_list(args, global),
        NotifyCommands::Count(args) => run_count(args, global),
        NotifyCommands::Read(args) => run_mark(args, Mark::Read, global),
        NotifyCommands::Unread(args) => run_mark(args, Mark::Unread, global),
        NotifyCommands::Archive(args) => run_mark(args, Mark::Archive, global),
        NotifyCommands::ReadAll => run_read_all(global),
        NotifyCommands::CheckDeadlines(args) => run_check(args, global),
    }
}

/// Notifications addressed to the acting user (or everyone), newest first
fn inbox(ctx: &AppContext, everyone: bool) -> Result<Vec<Notification>> {
    let mut notifications = ctx.store.load_all::<Notification>()?;
    if !everyone {
        notifications.retain(|n| n.user == ctx.actor());
    }
    notifications.sort_by(|a, b| b.created.cmp(&a.created));
    Ok(notifications)
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("title", "TITLE", 40),
    ColumnDef::new("type", "TYPE", 21),
    ColumnDef::new("priority", "PRIORITY", 9),
    ColumnDef::new("status", "STATUS", 10),
    ColumnDef::new("user", "USER", 14),
    ColumnDef::new("created", "CREATED", 17),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut notifications = inbox(&ctx, args.all)?;

    notifications.retain(|n| {
        args.status.map_or(true, |s| n.status == s)
            && args.kind.map_or(true, |t| n.notification_type == t)
    });
    if let Some(limit) = args.limit {
        notifications.truncate(limit);
    }

    let format = resolve_format(global, &ctx.config, OutputFormat::Tsv);
    if print_structured(format, &notifications)? {
        return Ok(());
    }
    if notifications.is_empty() {
        println!("No notifications.");
        return Ok(());
    }

    ctx.remember_listing(
        EntityPrefix::Ntf,
        notifications.iter().map(|n| n.id.to_string()),
    );
    let rows: Vec<TableRow> = notifications
        .iter()
        .enumerate()
        .map(|(pos, n)| {
            TableRow::new(n.id.to_string(), "NTF", pos + 1)
                .cell("id", CellValue::Id(n.id.to_string()))
                .cell("title", CellValue::text(&n.title))
                .cell(
                    "type",
                    CellValue::Badge(format::notification_type(n.notification_type.as_str())),
                )
                .cell("priority", CellValue::Badge(format::priority(n.priority.as_str())))
                .cell(
                    "status",
                    CellValue::Badge(format::notification_status(n.status.as_str())),
                )
                .cell("user", CellValue::text(&n.user))
                .cell("created", CellValue::DateTime(n.created))
        })
        .collect();

    let mut formatter = TableFormatter::new(LIST_COLUMNS, "notification", "NTF");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, format);
    Ok(())
}

fn run_count(args: CountArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let unread = inbox(&ctx, args.all)?
        .iter()
        .filter(|n| n.is_unread())
        .count();

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &serde_json::json!({ "unread": unread }))? {
        return Ok(());
    }
    println!("{}", unread);
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Mark {
    Read,
    Unread,
    Archive,
}

fn run_mark(args: IdArgs, mark: Mark, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut notification: Notification = ctx.store.get(&ctx.resolve(&args.id))?;

    let verb = match mark {
        Mark::Read => {
            notification.mark_read();
            "read"
        }
        Mark::Unread => {
            notification.mark_unread();
            "unread"
        }
        Mark::Archive => {
            notification.archive();
            "archived"
        }
    };
    ctx.store.save(&notification)?;
    tracing::debug!(id = %notification.id, status = %notification.status, "notification updated");
    success(
        global,
        format!("Marked {} as {}", style(&notification.id).cyan(), verb),
    );
    Ok(())
}

fn run_read_all(global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let mut changed = 0;
    for mut notification in inbox(&ctx, false)?.into_iter().filter(Notification::is_unread) {
        notification.mark_read();
        ctx.store.save(&notification)?;
        changed += 1;
    }
    success(global, format!("Marked {} notification(s) as read", changed));
    Ok(())
}

fn run_check(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context(global)?;
    let reference = args.today.unwrap_or_else(today);
    let created = deadlines::check_deadlines(&ctx.store, reference)?;

    if created > 0 {
        ctx.record(
            AuditLog::new(
                ActionType::Generate,
                EntityType::Notification,
                format!("Verificação de prazos: {} notificação(ões) criada(s)", created),
            )
            .with_data(serde_json::json!({ "data_referencia": reference, "criadas": created })),
        )?;
    }

    let format = resolve_format(global, &ctx.config, OutputFormat::Auto);
    if print_structured(format, &serde_json::json!({ "created": created }))? {
        return Ok(());
    }
    success(
        global,
        format!("{} deadline notification(s) created", style(created).cyan()),
    );
    Ok(())
}
