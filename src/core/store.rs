//! Data access for stored entities
//!
//! Commands reach entities only through the [`Store`] trait. [`FsStore`]
//! keeps one YAML file per entity under the project; [`MemoryStore`] keeps
//! them in memory for tests and library callers.

use miette::Diagnostic;
use std::cell::RefCell;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;
use crate::yaml::{self, YamlError};

/// Errors raised by store operations
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("No {entity} found matching '{reference}'")]
    #[diagnostic(
        code(comply::store::not_found),
        help("use the full ID, a unique fragment of it, or a short ID like RISK@1 from the last list")
    )]
    NotFound {
        entity: &'static str,
        reference: String,
    },

    #[error("'{reference}' matches several {entity} records: {}", .matches.join(", "))]
    #[diagnostic(code(comply::store::ambiguous), help("use more characters of the ID"))]
    Ambiguous {
        entity: &'static str,
        reference: String,
        matches: Vec<String>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("IO error: {0}")]
    #[diagnostic(code(comply::store::io))]
    Io(String),

    #[error("could not encode {0}")]
    #[diagnostic(code(comply::store::encode))]
    Encode(String),
}

/// Data-access capability over entity collections
pub trait Store {
    /// Load every stored entity of type `T`
    fn load_all<T: Entity>(&self) -> Result<Vec<T>, StoreError>;

    /// Create or replace an entity
    fn save<T: Entity>(&self, entity: &T) -> Result<(), StoreError>;

    /// Delete an entity by its full ID
    fn remove<T: Entity>(&self, id: &EntityId) -> Result<(), StoreError>;

    /// Look up one entity by full ID or a unique case-insensitive ID fragment
    fn get<T: Entity>(&self, reference: &str) -> Result<T, StoreError> {
        select_match(self.load_all::<T>()?, reference)
    }

    /// First entity of type `T` satisfying `pred`
    fn find<T: Entity>(&self, pred: impl Fn(&T) -> bool) -> Result<Option<T>, StoreError> {
        Ok(self.load_all::<T>()?.into_iter().find(|e| pred(e)))
    }
}

/// Pick the entity whose ID equals or uniquely contains `reference`
fn select_match<T: Entity>(entities: Vec<T>, reference: &str) -> Result<T, StoreError> {
    let needle = reference.trim().to_uppercase();
    let mut matches: Vec<T> = entities
        .into_iter()
        .filter(|e| !needle.is_empty() && e.id().to_string().contains(&needle))
        .collect();

    if let Some(pos) = matches.iter().position(|e| e.id().to_string() == needle) {
        return Ok(matches.swap_remove(pos));
    }

    match matches.len() {
        0 => Err(StoreError::NotFound {
            entity: T::NAME,
            reference: reference.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(StoreError::Ambiguous {
            entity: T::NAME,
            reference: reference.to_string(),
            matches: matches.iter().map(|e| e.id().to_string()).collect(),
        }),
    }
}

/// Store backed by `*.comply.yaml` files in a project
#[derive(Debug, Clone)]
pub struct FsStore {
    project: Project,
}

impl FsStore {
    pub fn new(project: Project) -> Self {
        Self { project }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }
}

impl Store for FsStore {
    fn load_all<T: Entity>(&self) -> Result<Vec<T>, StoreError> {
        let mut entities = Vec::new();
        for path in self.project.iter_entity_files(T::PREFIX) {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if EntityPrefix::from_filename(&name) != Some(T::PREFIX) {
                continue;
            }
            match yaml::parse_yaml_file::<T>(&path) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable {}", T::NAME)
                }
            }
        }
        entities.sort_by_key(|e| e.created());
        tracing::debug!(count = entities.len(), "loaded {} records", T::NAME);
        Ok(entities)
    }

    fn get<T: Entity>(&self, reference: &str) -> Result<T, StoreError> {
        // A full ID reads its file directly so parse errors carry their location
        if let Ok(id) = EntityId::parse(reference) {
            let path = self.project.entity_path(&id);
            if id.prefix() == T::PREFIX && path.exists() {
                return Ok(yaml::parse_yaml_file(&path)?);
            }
        }

        select_match(self.load_all::<T>()?, reference)
    }

    fn save<T: Entity>(&self, entity: &T) -> Result<(), StoreError> {
        let path = self.project.entity_path(entity.id());
        yaml::write_yaml_file(&path, entity)?;
        tracing::debug!(id = %entity.id(), path = %path.display(), "saved {}", T::NAME);
        Ok(())
    }

    fn remove<T: Entity>(&self, id: &EntityId) -> Result<(), StoreError> {
        let path = self.project.entity_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound {
                entity: T::NAME,
                reference: id.to_string(),
            });
        }
        std::fs::remove_file(&path).map_err(|e| StoreError::Io(e.to_string()))?;
        tracing::debug!(id = %id, "removed {}", T::NAME);
        Ok(())
    }
}

/// In-memory store; entities are kept as JSON values keyed by ID
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl Store for MemoryStore {
    fn load_all<T: Entity>(&self) -> Result<Vec<T>, StoreError> {
        let prefix = format!("{}-", T::PREFIX);
        let mut entities = self
            .records
            .borrow()
            .iter()
            .filter(|(id, _)| id.starts_with(&prefix))
            .map(|(_, value)| {
                serde_json::from_value::<T>(value.clone())
                    .map_err(|e| StoreError::Encode(e.to_string()))
            })
            .collect::<Result<Vec<T>, _>>()?;
        entities.sort_by_key(|e| e.created());
        Ok(entities)
    }

    fn save<T: Entity>(&self, entity: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(entity).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.records
            .borrow_mut()
            .insert(entity.id().to_string(), value);
        Ok(())
    }

    fn remove<T: Entity>(&self, id: &EntityId) -> Result<(), StoreError> {
        self.records
            .borrow_mut()
            .remove(&id.to_string())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                entity: T::NAME,
                reference: id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::checklist::Checklist;
    use crate::entities::risk::Risk;

    fn exercise(store: &impl Store) {
        let first = Checklist::new("Governança".to_string(), "ana".to_string());
        let second = Checklist::new("Segurança".to_string(), "ana".to_string());
        store.save(&first).unwrap();
        store.save(&second).unwrap();
        store
            .save(&Risk::new("Vazamento".to_string(), "ana".to_string()))
            .unwrap();

        let all = store.load_all::<Checklist>().unwrap();
        assert_eq!(all.len(), 2);

        let full = first.id.to_string();
        let found: Checklist = store.get(&full).unwrap();
        assert_eq!(found.name, "Governança");

        let fragment = full[full.len() - 10..].to_lowercase();
        let found: Checklist = store.get(&fragment).unwrap();
        assert_eq!(found.id, first.id);

        let err = store.get::<Checklist>("CHK-").unwrap_err();
        assert!(matches!(err, StoreError::Ambiguous { .. }));

        store.remove::<Checklist>(&first.id).unwrap();
        let err = store.get::<Checklist>(&full).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(err.to_string(), format!("No checklist found matching '{}'", full));
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_fs_store() {
        let tmp = tempfile::tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();
        exercise(&FsStore::new(project));
    }

    #[test]
    fn test_fs_store_skips_unreadable_files() {
        let tmp = tempfile::tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();
        let store = FsStore::new(project.clone());
        store
            .save(&Checklist::new("Ok".to_string(), "ana".to_string()))
            .unwrap();

        let bad = EntityId::new(EntityPrefix::Chk);
        std::fs::write(project.entity_path(&bad), "id: [unclosed\n").unwrap();

        assert_eq!(store.load_all::<Checklist>().unwrap().len(), 1);
        assert!(store.get::<Checklist>(&bad.to_string()).is_err());
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .remove::<Risk>(&EntityId::new(EntityPrefix::Risk))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "risk", .. }));
    }
}
