//! Training entity type with per-user assignments

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::metrics::conformity_percent;
use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::TransitionError;

/// Progress of one user in one training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
#[derive(Default)]
pub enum TrainingStatus {
    #[default]
    NaoIniciado,
    EmAndamento,
    Concluido,
    PendenteAprovacao,
}

impl TrainingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStatus::NaoIniciado => "nao_iniciado",
            TrainingStatus::EmAndamento => "em_andamento",
            TrainingStatus::Concluido => "concluido",
            TrainingStatus::PendenteAprovacao => "pendente_aprovacao",
        }
    }
}

impl std::fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A training assigned to one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub user: String,

    #[serde(default)]
    pub status: TrainingStatus,

    pub assigned_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Assignment {
    pub fn new(user: String, due: Option<NaiveDate>) -> Self {
        Self {
            user,
            status: TrainingStatus::default(),
            assigned_at: Utc::now(),
            due,
            started_at: None,
            completed_at: None,
            score: None,
        }
    }

    /// Apply a requested status change.
    ///
    /// `em_andamento` is reachable only from `nao_iniciado`; `concluido`
    /// from anything not already concluded.
    pub fn transition(&mut self, next: TrainingStatus) -> Result<(), TransitionError> {
        match (self.status, next) {
            (TrainingStatus::NaoIniciado, TrainingStatus::EmAndamento) => {
                self.status = next;
                self.started_at = Some(Utc::now());
                Ok(())
            }
            (current, TrainingStatus::Concluido) if current != TrainingStatus::Concluido => {
                self.status = next;
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            (current, _) => Err(TransitionError {
                entity: "training assignment",
                from: current.to_string(),
                to: next.to_string(),
                help: Some(match current {
                    TrainingStatus::Concluido => "this training is already concluded".to_string(),
                    _ => "trainings can be started once and then completed".to_string(),
                }),
            }),
        }
    }
}

/// A data-protection training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Training {
    pub id: EntityId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_url: Option<String>,

    /// Estimated duration in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,

    /// Inactive trainings are hidden from lists
    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<Assignment>,

    pub created: DateTime<Utc>,

    pub author: String,
}

fn default_active() -> bool {
    true
}

impl Entity for Training {
    const PREFIX: EntityPrefix = EntityPrefix::Trn;
    const NAME: &'static str = "training";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        if self.active {
            "ativo"
        } else {
            "inativo"
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

/// Outcome of assigning a training to several users
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssignReport {
    pub assigned: Vec<String>,
    pub already_assigned: Vec<String>,
}

impl Training {
    pub fn new(title: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Trn),
            title,
            description: None,
            category: None,
            material_url: None,
            duration_minutes: None,
            active: true,
            assignments: Vec::new(),
            created: Utc::now(),
            author,
        }
    }

    pub fn assignment(&self, user: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.user == user)
    }

    /// Assign to each user once; existing assignments get the new due date if one is given
    pub fn assign<I, S>(&mut self, users: I, due: Option<NaiveDate>) -> AssignReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut report = AssignReport::default();
        for user in users {
            let user = user.into();
            if let Some(existing) = self.assignments.iter_mut().find(|a| a.user == user) {
                if due.is_some() {
                    existing.due = due;
                }
                report.already_assigned.push(user);
            } else if report.assigned.contains(&user) {
                report.already_assigned.push(user);
            } else {
                self.assignments.push(Assignment::new(user.clone(), due));
                report.assigned.push(user);
            }
        }
        report
    }

    /// Change a user's status, creating the assignment when the user had none
    pub fn update_status(
        &mut self,
        user: &str,
        next: TrainingStatus,
    ) -> Result<&Assignment, TransitionError> {
        let pos = match self.assignments.iter().position(|a| a.user == user) {
            Some(pos) => pos,
            None => {
                self.assignments.push(Assignment::new(user.to_string(), None));
                self.assignments.len() - 1
            }
        };
        self.assignments[pos].transition(next)?;
        Ok(&self.assignments[pos])
    }

    pub fn completed_count(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.status == TrainingStatus::Concluido)
            .count()
    }

    /// Share of assignments concluded, rounded
    pub fn completion_pct(&self) -> u32 {
        conformity_percent(self.completed_count(), self.assignments.len())
    }
}
