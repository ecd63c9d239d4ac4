//! Notification entity type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Priority};
use crate::core::identity::{EntityId, EntityPrefix};

/// Why a notification was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum NotificationType {
    VencimentoProximo,
    ItemAtualizado,
    EvidenciaAdicionada,
    DocumentoGerado,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::VencimentoProximo => "vencimento_proximo",
            NotificationType::ItemAtualizado => "item_atualizado",
            NotificationType::EvidenciaAdicionada => "evidencia_adicionada",
            NotificationType::DocumentoGerado => "documento_gerado",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum NotificationStatus {
    #[default]
    NaoLida,
    Lida,
    Arquivada,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::NaoLida => "nao_lida",
            NotificationStatus::Lida => "lida",
            NotificationStatus::Arquivada => "arquivada",
        }
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message addressed to one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: EntityId,

    /// Recipient
    pub user: String,

    pub title: String,

    pub message: String,

    pub notification_type: NotificationType,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub status: NotificationStatus,

    pub created: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,

    /// Kind of record this points at ("checklist_item", "treinamento")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
}

impl Entity for Notification {
    const PREFIX: EntityPrefix = EntityPrefix::Ntf;
    const NAME: &'static str = "notification";

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
        &self.user
    }
}

impl Notification {
    pub fn new(
        user: impl Into<String>,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Ntf),
            user: user.into(),
            title: title.into(),
            message: message.into(),
            notification_type,
            priority: Priority::default(),
            status: NotificationStatus::default(),
            created: Utc::now(),
            read_at: None,
            reference_type: None,
            reference_id: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn referencing(mut self, kind: impl Into<String>, id: impl ToString) -> Self {
        self.reference_type = Some(kind.into());
        self.reference_id = Some(id.to_string());
        self
    }

    /// Notice that a checklist item changed
    pub fn item_updated(user: &str, item_name: &str, checklist_name: &str, item_id: impl ToString) -> Self {
        Self::new(
            user,
            NotificationType::ItemAtualizado,
            format!("Item atualizado: {}", item_name),
            format!(
                "O item '{}' do checklist '{}' foi atualizado.",
                item_name, checklist_name
            ),
        )
        .referencing("checklist_item", item_id)
    }

    /// Notice that evidence was attached to an item
    pub fn evidence_added(user: &str, item_name: &str, evidence_id: impl ToString) -> Self {
        Self::new(
            user,
            NotificationType::EvidenciaAdicionada,
            "Nova evidência adicionada",
            format!("Uma nova evidência foi adicionada ao item '{}'.", item_name),
        )
        .with_priority(Priority::Baixa)
        .referencing("evidencia", evidence_id)
    }

    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::NaoLida
    }

    pub fn mark_read(&mut self) {
        if self.status != NotificationStatus::Lida {
            self.status = NotificationStatus::Lida;
            self.read_at = Some(Utc::now());
        }
    }

    pub fn mark_unread(&mut self) {
        self.status = NotificationStatus::NaoLida;
        self.read_at = None;
    }

    pub fn archive(&mut self) {
        self.status = NotificationStatus::Arquivada;
    }

    pub fn refers_to(&self, kind: &str, id: &str) -> bool {
        self.reference_type.as_deref() == Some(kind) && self.reference_id.as_deref() == Some(id)
    }
}
