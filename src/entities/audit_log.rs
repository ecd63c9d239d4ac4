//! Audit log entry type
//!
//! Entries are append-only. Action and entity types keep unknown values
//! verbatim so logs written by other tools survive a read/write cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};

macro_rules! open_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// A value outside the known vocabulary, kept as written
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Other(s) => s,
                }
            }

            /// Known wire values
            pub fn known() -> &'static [&'static str] {
                &[$($wire),+]
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                let known = match s.as_str() {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                };
                known.unwrap_or($name::Other(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name::from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String {
                v.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok($name::from(s))
            }
        }
    };
}

open_vocabulary! {
    /// What was done
    ActionType {
        Create => "create",
        Read => "read",
        Update => "update",
        Delete => "delete",
        Login => "login",
        Logout => "logout",
        Export => "export",
        Generate => "generate",
        Upload => "upload",
        Download => "download",
    }
}

open_vocabulary! {
    /// What it was done to
    EntityType {
        User => "user",
        Checklist => "checklist",
        ChecklistItem => "checklist_item",
        Evidencia => "evidencia",
        Documento => "documento",
        Notification => "notification",
        System => "system",
        Risco => "risco",
        AvaliacaoRisco => "avaliacao_risco",
        PlanoTratamento => "plano_tratamento",
        Treinamento => "treinamento",
        StatusTreinamento => "status_treinamento",
    }
}

/// One immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: EntityId,

    /// Acting user; absent for system events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub action_type: ActionType,

    pub entity_type: EntityType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<serde_json::Value>,
}

impl AuditLog {
    pub fn new(
        action_type: ActionType,
        entity_type: EntityType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Log),
            user_id: None,
            action_type,
            entity_type,
            entity_id: None,
            description: description.into(),
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
            additional_data: None,
        }
    }

    pub fn by(mut self, user: impl Into<String>) -> Self {
        self.user_id = Some(user.into());
        self
    }

    pub fn on(mut self, entity_id: impl ToString) -> Self {
        self.entity_id = Some(entity_id.to_string());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.additional_data = Some(data);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Additional data as the text the free-text search looks at
    pub fn additional_text(&self) -> Option<String> {
        self.additional_data.as_ref().map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_vocabulary() {
        assert_eq!(ActionType::from("login"), ActionType::Login);
        assert_eq!(EntityType::from("checklist_item"), EntityType::ChecklistItem);

        let custom = ActionType::from("approve");
        assert_eq!(custom, ActionType::Other("approve".to_string()));
        assert_eq!(custom.as_str(), "approve");
        assert_eq!(ActionType::known().len(), 10);
    }

    #[test]
    fn test_unknown_values_survive_serialization() {
        let log = AuditLog::new(
            ActionType::Other("approve".to_string()),
            EntityType::Other("fornecedor".to_string()),
            "Aprovação",
        );
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("\"action_type\":\"approve\""));
        let back: AuditLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entity_type.as_str(), "fornecedor");
    }

    #[test]
    fn test_builder() {
        let log = AuditLog::new(ActionType::Upload, EntityType::Evidencia, "Upload")
            .by("maria")
            .on("EVD-1")
            .with_data(serde_json::json!({"filename": "contrato_assinado.pdf"}));
        assert_eq!(log.user_id.as_deref(), Some("maria"));
        assert_eq!(log.entity_id.as_deref(), Some("EVD-1"));
        assert!(log.additional_text().unwrap().contains("contrato_assinado.pdf"));
        assert!(log.id.to_string().starts_with("LOG-"));
    }

    #[test]
    fn test_string_additional_data_is_searched_raw() {
        let log = AuditLog::new(ActionType::Create, EntityType::Checklist, "x")
            .with_data(serde_json::Value::String("{\"nome\":\"LGPD\"}".to_string()));
        assert_eq!(log.additional_text().unwrap(), "{\"nome\":\"LGPD\"}");
    }
}
