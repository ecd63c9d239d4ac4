//! Entity identity system using type-prefixed ULIDs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use miette::Diagnostic;
use thiserror::Error;
use ulid::Ulid;

/// Entity type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Compliance checklist
    Chk,
    /// Checklist item (action entry)
    Item,
    /// Evidence file attached to an item
    Evd,
    /// Tracked risk
    Risk,
    /// Probability/impact assessment of a risk
    Asmt,
    /// Treatment plan action for a risk
    Plan,
    /// Training
    Trn,
    /// Notification
    Ntf,
    /// Audit log entry
    Log,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Chk => "CHK",
            EntityPrefix::Item => "ITEM",
            EntityPrefix::Evd => "EVD",
            EntityPrefix::Risk => "RISK",
            EntityPrefix::Asmt => "ASMT",
            EntityPrefix::Plan => "PLAN",
            EntityPrefix::Trn => "TRN",
            EntityPrefix::Ntf => "NTF",
            EntityPrefix::Log => "LOG",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Chk,
            EntityPrefix::Item,
            EntityPrefix::Evd,
            EntityPrefix::Risk,
            EntityPrefix::Asmt,
            EntityPrefix::Plan,
            EntityPrefix::Trn,
            EntityPrefix::Ntf,
            EntityPrefix::Log,
        ]
    }

    /// Try to determine entity prefix from a filename like "RISK-xxx.comply.yaml"
    pub fn from_filename(filename: &str) -> Option<Self> {
        let upper = filename.to_uppercase();
        Self::all()
            .iter()
            .find(|p| upper.starts_with(&format!("{}-", p.as_str())))
            .copied()
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CHK" => Ok(EntityPrefix::Chk),
            "ITEM" => Ok(EntityPrefix::Item),
            "EVD" => Ok(EntityPrefix::Evd),
            "RISK" => Ok(EntityPrefix::Risk),
            "ASMT" => Ok(EntityPrefix::Asmt),
            "PLAN" => Ok(EntityPrefix::Plan),
            "TRN" => Ok(EntityPrefix::Trn),
            "NTF" => Ok(EntityPrefix::Ntf),
            "LOG" => Ok(EntityPrefix::Log),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// A unique entity identifier combining a type prefix and ULID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    /// Get the entity prefix
    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    /// Get the ULID component
    pub fn ulid(&self) -> Ulid {
        self.ulid
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing entity IDs
#[derive(Debug, Error, Diagnostic)]
pub enum IdParseError {
    #[error("invalid entity prefix: '{0}' (valid: CHK, ITEM, EVD, RISK, ASMT, PLAN, TRN, NTF, LOG)")]
    #[diagnostic(code(comply::id::prefix))]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in entity ID: '{0}'")]
    #[diagnostic(code(comply::id::delimiter), help("pass the full ID, e.g. ITEM-01J..."))]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    #[diagnostic(code(comply::id::ulid))]
    InvalidUlid(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id = EntityId::new(EntityPrefix::Risk);
        assert!(id.to_string().starts_with("RISK-"));
        assert_eq!(id.to_string().len(), 31); // RISK- (5) + ULID (26)
    }

    #[test]
    fn test_entity_id_roundtrip() {
        let original = EntityId::new(EntityPrefix::Chk);
        let parsed = EntityId::parse(&original.to_string()).unwrap();
        assert_eq!(parsed.prefix(), EntityPrefix::Chk);
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_entity_id_invalid_prefix() {
        let err = EntityId::parse("XXX-01HQ3K4N5M6P7R8S9T0VWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidPrefix(_)));
    }

    #[test]
    fn test_entity_id_missing_delimiter() {
        let err = EntityId::parse("RISK01HQ3K4N5M6P7R8S9T0VWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::MissingDelimiter(_)));
    }

    #[test]
    fn test_entity_id_invalid_ulid() {
        let err = EntityId::parse("ITEM-notaulid").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidUlid(_, _)));
    }

    #[test]
    fn test_all_prefixes_parse() {
        for prefix in EntityPrefix::all() {
            let id = EntityId::new(*prefix);
            let parsed = EntityId::parse(&id.to_string()).unwrap();
            assert_eq!(parsed.prefix(), *prefix);
        }
    }

    #[test]
    fn test_prefix_from_filename() {
        assert_eq!(
            EntityPrefix::from_filename("risk-01HQ.comply.yaml"),
            Some(EntityPrefix::Risk)
        );
        assert_eq!(EntityPrefix::from_filename("config.yaml"), None);
    }
}
