//! Short ID system for easier entity selection
//!
//! Provides aliases like `RISK@1` or `CHK@2` that map to full entity IDs.
//! They are regenerated every time a list command prints its rows; a bare
//! `@N` refers to the most recently listed entity type.

use std::collections::BTreeMap;
use std::fs;

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;

const INDEX_FILE: &str = "shortids.json";

/// Mapping of `PREFIX@N` aliases to full entity IDs
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    /// Per-prefix ordered lists of full IDs; alias N is position N-1
    entries: BTreeMap<String, Vec<String>>,

    /// Prefix of the last rebuilt list, used for bare `@N`
    #[serde(default)]
    last_prefix: Option<String>,
}

impl ShortIdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index from a project, or create empty if not found
    pub fn load(project: &Project) -> Self {
        let path = project.comply_dir().join(INDEX_FILE);
        fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Save the index to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.comply_dir().join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Replace the aliases of one entity type with a new ordered list
    pub fn rebuild(&mut self, prefix: EntityPrefix, ids: impl IntoIterator<Item = String>) {
        self.entries
            .insert(prefix.as_str().to_string(), ids.into_iter().collect());
        self.last_prefix = Some(prefix.as_str().to_string());
    }

    /// Resolve a reference to a full entity ID string.
    ///
    /// `RISK@3` and `@3` are looked up; anything else passes through
    /// unchanged for partial matching. Unknown aliases resolve to `None`.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let Some((prefix, num)) = reference.split_once('@') else {
            return Some(reference.to_string());
        };

        let prefix = if prefix.is_empty() {
            self.last_prefix.clone()?
        } else {
            prefix.to_uppercase()
        };

        let n: usize = num.parse().ok()?;
        self.entries
            .get(&prefix)?
            .get(n.checked_sub(1)?)
            .cloned()
    }

    /// Get the alias of a full entity ID, if listed
    pub fn short_id(&self, id: &EntityId) -> Option<String> {
        let prefix = id.prefix().as_str();
        let full = id.to_string();
        self.entries
            .get(prefix)?
            .iter()
            .position(|e| *e == full)
            .map(|pos| format!("{}@{}", prefix, pos + 1))
    }

    /// Number of aliases across all entity types
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a reference that might be a short ID or a full/partial entity ID
pub fn parse_entity_reference(reference: &str, project: &Project) -> String {
    let index = ShortIdIndex::load(project);
    index
        .resolve(reference)
        .unwrap_or_else(|| reference.to_string())
}
