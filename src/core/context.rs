//! Application context handed to every command

use std::path::Path;

use crate::core::audit::{AuditError, AuditTrail};
use crate::core::config::Config;
use crate::core::project::{Project, ProjectError};
use crate::core::shortid::{parse_entity_reference, ShortIdIndex};
use crate::core::store::FsStore;
use crate::core::identity::EntityPrefix;
use crate::entities::audit_log::AuditLog;

/// Everything a command needs: where the data is, who is acting, and how to record it
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub store: FsStore,
    pub trail: AuditTrail,
    actor: String,
}

impl AppContext {
    /// Open the project at `root`, or discover it from the working directory
    pub fn open(root: Option<&Path>) -> Result<Self, ProjectError> {
        let project = match root {
            Some(path) => Project::discover_from(path)?,
            None => Project::discover()?,
        };
        Ok(Self::from_project(project))
    }

    pub fn from_project(project: Project) -> Self {
        let config = Config::load(Some(&project));
        let actor = config.author();
        let trail = AuditTrail::new(project.audit_path());
        Self {
            config,
            store: FsStore::new(project),
            trail,
            actor,
        }
    }

    pub fn project(&self) -> &Project {
        self.store.project()
    }

    /// The acting user
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Stamp the acting user on an audit entry and append it
    pub fn record(&self, entry: AuditLog) -> Result<(), AuditError> {
        let entry = if entry.user_id.is_none() {
            entry.by(self.actor.clone())
        } else {
            entry
        };
        self.trail.append(&entry)
    }

    /// Resolve a short ID like `RISK@2` against the last listing
    pub fn resolve(&self, reference: &str) -> String {
        parse_entity_reference(reference, self.project())
    }

    /// Remember the order of a listing so `PREFIX@N` aliases resolve to it
    pub fn remember_listing(&self, prefix: EntityPrefix, ids: impl IntoIterator<Item = String>) {
        let mut index = ShortIdIndex::load(self.project());
        index.rebuild(prefix, ids);
        if let Err(e) = index.save(self.project()) {
            tracing::warn!(error = %e, "could not save short IDs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::audit_query::AuditFilter;
    use crate::entities::audit_log::{ActionType, EntityType};
    use tempfile::tempdir;

    #[test]
    fn test_record_stamps_actor() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();
        let mut ctx = AppContext::from_project(project);
        ctx.actor = "dpo".to_string();

        ctx.record(AuditLog::new(ActionType::Create, EntityType::Risco, "Risco criado"))
            .unwrap();
        ctx.record(AuditLog::new(ActionType::Login, EntityType::User, "login").by("ana"))
            .unwrap();

        let logs = ctx.trail.read_all().unwrap();
        assert_eq!(logs[0].user_id.as_deref(), Some("dpo"));
        let filter = AuditFilter {
            user_id: Some("ana".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&logs).len(), 1);
    }

    #[test]
    fn test_listing_aliases_resolve() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), false).unwrap();
        let ctx = AppContext::from_project(project);
        ctx.remember_listing(EntityPrefix::Risk, vec!["RISK-A".to_string(), "RISK-B".to_string()]);
        assert_eq!(ctx.resolve("RISK@2"), "RISK-B");
        assert_eq!(ctx.resolve("@1"), "RISK-A");
        assert_eq!(ctx.resolve("RISK-C"), "RISK-C");
    }
}
