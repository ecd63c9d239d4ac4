//! Deadline scanning for checklist items and training assignments

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::core::entity::Priority;
use crate::core::store::{Store, StoreError};
use crate::entities::checklist::{Checklist, RiskRating};
use crate::entities::notification::{Notification, NotificationType};
use crate::entities::training::{Training, TrainingStatus};

/// Item deadlines this close (in days) raise a notification
pub const ITEM_WINDOW_DAYS: i64 = 7;

/// Days before a training due date on which reminders fire
pub const TRAINING_REMINDER_DAYS: [i64; 3] = [1, 3, 7];

const ITEM_REFERENCE: &str = "checklist_item";
const TRAINING_REFERENCE: &str = "treinamento";

fn recently_notified(
    existing: &[Notification],
    kind: &str,
    id: &str,
    user: Option<&str>,
    since: DateTime<Utc>,
) -> bool {
    existing.iter().any(|n| {
        n.notification_type == NotificationType::VencimentoProximo
            && n.refers_to(kind, id)
            && user.map_or(true, |u| n.user == u)
            && n.created > since
    })
}

fn item_notification(
    owner: &str,
    item_name: &str,
    checklist_name: &str,
    risk: RiskRating,
    days: i64,
) -> Notification {
    let (title, message, priority) = if days <= 1 {
        (
            format!("URGENTE: Item vence em {} dia(s)", days + 1),
            format!(
                "O item '{}' do checklist '{}' vence em {} dia(s).",
                item_name,
                checklist_name,
                days + 1
            ),
            Priority::Alta,
        )
    } else {
        let priority = if days <= 3 {
            match risk {
                RiskRating::Alto => Priority::Alta,
                RiskRating::Baixo => Priority::Baixa,
                RiskRating::Medio => Priority::Media,
            }
        } else {
            Priority::Baixa
        };
        (
            format!("Item vence em {} dias", days),
            format!(
                "O item '{}' do checklist '{}' vence em {} dias.",
                item_name, checklist_name, days
            ),
            priority,
        )
    };

    Notification::new(owner, NotificationType::VencimentoProximo, title, message)
        .with_priority(priority)
}

fn training_notification(user: &str, training: &Training, days: i64) -> Notification {
    let priority = match days {
        1 => Priority::Alta,
        3 => Priority::Media,
        _ => Priority::Baixa,
    };
    Notification::new(
        user,
        NotificationType::VencimentoProximo,
        format!("Treinamento vence em {} dia(s)", days),
        format!(
            "O treinamento '{}' deve ser concluído em {} dia(s).",
            training.title, days
        ),
    )
    .with_priority(priority)
    .referencing(TRAINING_REFERENCE, &training.id)
}

/// Notifications due for `today`, skipping anything already notified in the last 24 hours
pub fn due_notifications(
    checklists: &[Checklist],
    trainings: &[Training],
    existing: &[Notification],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<Notification> {
    let since = now - Duration::days(1);
    let mut created = Vec::new();

    for checklist in checklists {
        for item in checklist.items.iter().filter(|i| i.status.is_open()) {
            let Some(days) = item.days_remaining(today) else {
                continue;
            };
            if days > ITEM_WINDOW_DAYS {
                continue;
            }
            let id = item.id.to_string();
            if recently_notified(existing, ITEM_REFERENCE, &id, None, since) {
                tracing::debug!(item = %id, "deadline already notified");
                continue;
            }
            created.push(
                item_notification(&checklist.author, &item.name, &checklist.name, item.risk, days)
                    .referencing(ITEM_REFERENCE, &id),
            );
        }
    }

    for training in trainings.iter().filter(|t| t.active) {
        let id = training.id.to_string();
        for assignment in &training.assignments {
            if assignment.status == TrainingStatus::Concluido {
                continue;
            }
            let Some(due) = assignment.due else {
                continue;
            };
            let days = (due - today).num_days();
            if !TRAINING_REMINDER_DAYS.contains(&days) {
                continue;
            }
            if recently_notified(existing, TRAINING_REFERENCE, &id, Some(&assignment.user), since) {
                continue;
            }
            created.push(training_notification(&assignment.user, training, days));
        }
    }

    created
}

/// Scan the store, save new notifications and return how many were created
pub fn check_deadlines<S: Store>(store: &S, today: NaiveDate) -> Result<usize, StoreError> {
    let checklists = store.load_all::<Checklist>()?;
    let trainings = store.load_all::<Training>()?;
    let existing = store.load_all::<Notification>()?;

    let created = due_notifications(&checklists, &trainings, &existing, today, Utc::now());
    for notification in &created {
        store.save(notification)?;
    }
    tracing::info!(count = created.len(), "deadline scan complete");
    Ok(created.len())
}
