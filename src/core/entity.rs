//! Entity trait - common interface for all stored entity types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};

/// Common trait for all entities persisted through a [`Store`](crate::core::store::Store)
pub trait Entity: Serialize + DeserializeOwned {
    /// The entity type prefix (e.g., CHK, RISK)
    const PREFIX: EntityPrefix;

    /// Human readable singular name used in messages ("risk", "checklist")
    const NAME: &'static str;

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// Get the entity's title
    fn title(&self) -> &str;

    /// Get the entity's status as its serialized value
    fn status(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Get the author
    fn author(&self) -> &str;
}

/// Priority shared by checklist items and notifications
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[derive(Default, clap::ValueEnum)]
pub enum Priority {
    Baixa,
    #[default]
    Media,
    Alta,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Baixa => "baixa",
            Priority::Media => "media",
            Priority::Alta => "alta",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baixa" => Ok(Priority::Baixa),
            "media" => Ok(Priority::Media),
            "alta" => Ok(Priority::Alta),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parse_and_display() {
        assert_eq!("ALTA".parse::<Priority>().unwrap(), Priority::Alta);
        assert_eq!(Priority::Baixa.to_string(), "baixa");
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Baixa < Priority::Media);
        assert!(Priority::Media < Priority::Alta);
    }
}
