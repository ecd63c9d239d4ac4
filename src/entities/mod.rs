//! Entity type definitions

pub mod audit_log;
pub mod checklist;
pub mod notification;
pub mod risk;
pub mod training;

use miette::Diagnostic;
use thiserror::Error;

pub use audit_log::{ActionType, AuditLog, EntityType};
pub use checklist::{Checklist, ChecklistItem, Evidence, ItemStatus, RiskRating};
pub use notification::{Notification, NotificationStatus, NotificationType};
pub use risk::{Assessment, PlanStatus, Risk, RiskStatus, TreatmentPlan};
pub use training::{Assignment, Training, TrainingStatus};

/// Rejected field values
#[derive(Debug, Error, Diagnostic)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    #[diagnostic(code(comply::validation::range))]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{0} is required")]
    #[diagnostic(code(comply::validation::required))]
    Required(&'static str),
}

/// Check that a 1-5 scale value is in range
pub fn scale_value(field: &'static str, value: u8) -> Result<u8, ValidationError> {
    if (1..=5).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value: value as i64,
            min: 1,
            max: 5,
        })
    }
}

/// A status change the workflow does not allow
#[derive(Debug, Error, Diagnostic)]
#[error("cannot change {entity} status from '{from}' to '{to}'")]
#[diagnostic(code(comply::workflow::invalid_transition))]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: String,
    pub to: String,
    #[help]
    pub help: Option<String>,
}
