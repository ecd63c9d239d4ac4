//! Risk entity type with its assessments and treatment plans

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::matrix::{Coordinates, MatrixPoint};
use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::{scale_value, TransitionError, ValidationError};

/// Risk lifecycle status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
#[derive(Default)]
pub enum RiskStatus {
    #[default]
    Identificado,
    Analisado,
    Avaliado,
    EmTratamento,
    Mitigado,
    Aceito,
    Fechado,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Identificado => "identificado",
            RiskStatus::Analisado => "analisado",
            RiskStatus::Avaliado => "avaliado",
            RiskStatus::EmTratamento => "em_tratamento",
            RiskStatus::Mitigado => "mitigado",
            RiskStatus::Aceito => "aceito",
            RiskStatus::Fechado => "fechado",
        }
    }

    pub fn all() -> [RiskStatus; 7] {
        [
            RiskStatus::Identificado,
            RiskStatus::Analisado,
            RiskStatus::Avaliado,
            RiskStatus::EmTratamento,
            RiskStatus::Mitigado,
            RiskStatus::Aceito,
            RiskStatus::Fechado,
        ]
    }

    /// Statuses reachable in one forward step
    pub fn next(&self) -> &'static [RiskStatus] {
        match self {
            RiskStatus::Identificado => &[RiskStatus::Analisado, RiskStatus::Avaliado],
            RiskStatus::Analisado => &[RiskStatus::Avaliado],
            RiskStatus::Avaliado => &[RiskStatus::EmTratamento, RiskStatus::Aceito],
            RiskStatus::EmTratamento => &[RiskStatus::Mitigado, RiskStatus::Aceito],
            RiskStatus::Mitigado | RiskStatus::Aceito => &[RiskStatus::Fechado],
            RiskStatus::Fechado => &[],
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, RiskStatus::Fechado)
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Treatment plan action status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
#[derive(Default)]
pub enum PlanStatus {
    #[default]
    Pendente,
    EmAndamento,
    Concluido,
    Cancelado,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Pendente => "pendente",
            PlanStatus::EmAndamento => "em_andamento",
            PlanStatus::Concluido => "concluido",
            PlanStatus::Cancelado => "cancelado",
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A probability x impact assessment, with optional residual values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: EntityId,

    pub probability: u8,

    pub impact: u8,

    /// probability x impact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherent_level: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_probability: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_impact: Option<u8>,

    /// Residual product, or the inherent level when no residual pair was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_level: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_controls: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability_rationale: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_rationale: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_rationale: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub assessed_by: String,

    pub assessed_at: DateTime<Utc>,
}

impl Assessment {
    /// Validate scale values and compute both levels
    pub fn new(
        probability: u8,
        impact: u8,
        residual: Option<(u8, u8)>,
        assessed_by: String,
    ) -> Result<Self, ValidationError> {
        let probability = scale_value("probability", probability)?;
        let impact = scale_value("impact", impact)?;
        let residual = residual
            .map(|(p, i)| {
                Ok::<_, ValidationError>((
                    scale_value("residual probability", p)?,
                    scale_value("residual impact", i)?,
                ))
            })
            .transpose()?;

        let mut assessment = Self {
            id: EntityId::new(EntityPrefix::Asmt),
            probability,
            impact,
            inherent_level: None,
            residual_probability: residual.map(|r| r.0),
            residual_impact: residual.map(|r| r.1),
            residual_level: None,
            existing_controls: None,
            probability_rationale: None,
            impact_rationale: None,
            residual_rationale: None,
            notes: None,
            assessed_by,
            assessed_at: Utc::now(),
        };
        assessment.compute_levels();
        Ok(assessment)
    }

    fn compute_levels(&mut self) {
        let inherent = self.probability * self.impact;
        self.inherent_level = Some(inherent);
        self.residual_level = Some(match (self.residual_probability, self.residual_impact) {
            (Some(p), Some(i)) => p * i,
            _ => inherent,
        });
    }

    pub fn has_residual(&self) -> bool {
        self.residual_probability.is_some() && self.residual_impact.is_some()
    }
}

/// One action of a risk's treatment plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub id: EntityId,

    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,

    #[serde(default)]
    pub status: PlanStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created: DateTime<Utc>,

    /// Set when the action is concluded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TreatmentPlan {
    pub fn new(action: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Plan),
            action,
            owner: None,
            due: None,
            status: PlanStatus::default(),
            estimated_cost: None,
            notes: None,
            created: Utc::now(),
            completed_at: None,
        }
    }

    /// Concluding stamps `completed_at` once; any other status clears it
    pub fn set_status(&mut self, status: PlanStatus) {
        self.status = status;
        if status == PlanStatus::Concluido {
            self.completed_at.get_or_insert_with(Utc::now);
        } else {
            self.completed_at = None;
        }
    }
}

/// A tracked data-protection risk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Risk {
    pub id: EntityId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Asset the risk relates to (system, process, dataset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default)]
    pub status: RiskStatus,

    /// Checklist item the risk was raised from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_item: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assessments: Vec<Assessment>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub treatment_plans: Vec<TreatmentPlan>,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,

    pub author: String,
}

impl Entity for Risk {
    const PREFIX: EntityPrefix = EntityPrefix::Risk;
    const NAME: &'static str = "risk";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        self.status.as_str()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Risk {
    pub fn new(title: String, author: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Risk),
            title,
            description: None,
            category: None,
            asset: None,
            source: None,
            status: RiskStatus::default(),
            checklist_item: None,
            assessments: Vec::new(),
            treatment_plans: Vec::new(),
            created: now,
            updated: now,
            author,
        }
    }

    /// Most recent assessment by date
    pub fn latest_assessment(&self) -> Option<&Assessment> {
        self.assessments.iter().max_by_key(|a| a.assessed_at)
    }

    /// Record an assessment; an unassessed risk becomes `avaliado`
    pub fn add_assessment(&mut self, assessment: Assessment) {
        self.assessments.push(assessment);
        if matches!(self.status, RiskStatus::Identificado | RiskStatus::Analisado) {
            self.status = RiskStatus::Avaliado;
        }
        self.updated = Utc::now();
    }

    /// Add a plan action; an `avaliado` risk moves to `em_tratamento`
    pub fn add_plan(&mut self, plan: TreatmentPlan) -> &TreatmentPlan {
        self.treatment_plans.push(plan);
        if self.status == RiskStatus::Avaliado {
            self.status = RiskStatus::EmTratamento;
        }
        self.updated = Utc::now();
        let last = self.treatment_plans.len() - 1;
        &self.treatment_plans[last]
    }

    pub fn plan_mut(&mut self, id: &str) -> Option<&mut TreatmentPlan> {
        let needle = id.to_uppercase();
        self.treatment_plans
            .iter_mut()
            .find(|p| p.id.to_string().contains(&needle))
    }

    pub fn remove_plan(&mut self, id: &str) -> Option<TreatmentPlan> {
        let needle = id.to_uppercase();
        let pos = self
            .treatment_plans
            .iter()
            .position(|p| p.id.to_string().contains(&needle))?;
        self.updated = Utc::now();
        Some(self.treatment_plans.remove(pos))
    }

    /// Move along the lifecycle; `force` allows any move
    pub fn set_status(&mut self, next: RiskStatus, force: bool) -> Result<(), TransitionError> {
        if next == self.status {
            return Ok(());
        }
        if !force && !self.status.next().contains(&next) {
            let allowed: Vec<&str> = self.status.next().iter().map(|s| s.as_str()).collect();
            return Err(TransitionError {
                entity: Self::NAME,
                from: self.status.to_string(),
                to: next.to_string(),
                help: Some(if allowed.is_empty() {
                    "the risk is closed; use --force to reopen it".to_string()
                } else {
                    format!(
                        "allowed next statuses: {} (or use --force)",
                        allowed.join(", ")
                    )
                }),
            });
        }
        self.status = next;
        self.updated = Utc::now();
        Ok(())
    }

    /// Inherent and residual coordinates of the latest assessment.
    /// Levels missing from the file are left for the matrix to derive once
    /// the coordinates are known to be in range.
    pub fn matrix_point(&self) -> Option<MatrixPoint> {
        let a = self.latest_assessment()?;
        Some(MatrixPoint {
            id: self.id.to_string(),
            name: self.title.clone(),
            inherent: Coordinates {
                probability: Some(a.probability),
                impact: Some(a.impact),
                level: a.inherent_level,
            },
            residual: Coordinates {
                probability: a.residual_probability,
                impact: a.residual_impact,
                level: a.residual_level,
            },
        })
    }

    /// Current residual level, if assessed
    pub fn current_level(&self) -> Option<u8> {
        let a = self.latest_assessment()?;
        a.residual_level.or(a.inherent_level)
    }
}
