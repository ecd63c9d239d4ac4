//! Audit log filtering, pagination, statistics and export

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::entities::audit_log::{ActionType, AuditLog, EntityType};

/// Records returned by history and activity lookups
pub const HISTORY_LIMIT: usize = 100;

/// Users listed in statistics
pub const TOP_USERS: usize = 10;

/// Days covered by the activity series in statistics
pub const STATS_DAYS: i64 = 7;

/// Conjunctive filter over audit entries; unset criteria match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditFilter {
    pub user_id: Option<String>,
    pub action_type: Option<ActionType>,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    /// Inclusive from 00:00:00 of this day
    pub start_date: Option<NaiveDate>,
    /// Inclusive through 23:59:59 of this day
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring of the description or additional data
    pub search: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl AuditFilter {
    pub fn is_empty(&self) -> bool {
        non_empty(&self.user_id).is_none()
            && self.action_type.is_none()
            && self.entity_type.is_none()
            && non_empty(&self.entity_id).is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && non_empty(&self.search).is_none()
    }

    pub fn matches(&self, log: &AuditLog) -> bool {
        if let Some(user) = non_empty(&self.user_id) {
            if log.user_id.as_deref() != Some(user) {
                return false;
            }
        }
        if let Some(ref action) = self.action_type {
            if &log.action_type != action {
                return false;
            }
        }
        if let Some(ref entity) = self.entity_type {
            if &log.entity_type != entity {
                return false;
            }
        }
        if let Some(entity_id) = non_empty(&self.entity_id) {
            if log.entity_id.as_deref() != Some(entity_id) {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if log.timestamp < start.and_time(NaiveTime::MIN).and_utc() {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
            if log.timestamp > end.and_time(last_second).and_utc() {
                return false;
            }
        }
        if let Some(search) = non_empty(&self.search) {
            let needle = search.to_lowercase();
            let in_description = log.description.to_lowercase().contains(&needle);
            let in_data = log
                .additional_text()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_description && !in_data {
                return false;
            }
        }
        true
    }

    /// Matching entries, in input order
    pub fn apply<'a>(&self, logs: &'a [AuditLog]) -> Vec<&'a AuditLog> {
        logs.iter().filter(|log| self.matches(log)).collect()
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice `items` into 1-based pages; page 0 serves page 1, pages past the end are empty
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// Filter plus page cursor. Changing any filter criterion returns to page 1.
#[derive(Debug, Clone, Serialize)]
pub struct AuditQuery {
    filter: AuditFilter,
    page: usize,
    page_size: usize,
}

impl AuditQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: AuditFilter::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn filter(&self) -> &AuditFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Replace the whole filter
    pub fn set_filter(&mut self, filter: AuditFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.page = 1;
        }
    }

    /// Edit the filter in place
    pub fn update_filter(&mut self, edit: impl FnOnce(&mut AuditFilter)) {
        let mut filter = self.filter.clone();
        edit(&mut filter);
        self.set_filter(filter);
    }

    pub fn clear_filter(&mut self) {
        self.set_filter(AuditFilter::default());
    }

    pub fn run<'a>(&self, logs: &'a [AuditLog]) -> Page<&'a AuditLog> {
        paginate(self.filter.apply(logs), self.page, self.page_size)
    }
}

/// Sort entries newest first; equal timestamps keep their order
pub fn newest_first(logs: &mut [AuditLog]) {
    logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

fn newest<'a>(mut logs: Vec<&'a AuditLog>, limit: usize) -> Vec<&'a AuditLog> {
    logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    logs.truncate(limit);
    logs
}

/// Actions recorded against one entity, newest first
pub fn entity_history<'a>(
    logs: &'a [AuditLog],
    entity_type: &EntityType,
    entity_id: &str,
    limit: usize,
) -> Vec<&'a AuditLog> {
    let matching = logs
        .iter()
        .filter(|l| &l.entity_type == entity_type && l.entity_id.as_deref() == Some(entity_id))
        .collect();
    newest(matching, limit)
}

/// Actions performed by one user, newest first
pub fn user_activity<'a>(logs: &'a [AuditLog], user: &str, limit: usize) -> Vec<&'a AuditLog> {
    let matching = logs
        .iter()
        .filter(|l| l.user_id.as_deref() == Some(user))
        .collect();
    newest(matching, limit)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCount {
    pub user_id: String,
    pub count: usize,
}

/// Activity statistics over the whole log
#[derive(Debug, Clone, Serialize)]
pub struct AuditStats {
    pub total: usize,
    pub action_counts: BTreeMap<String, usize>,
    pub entity_counts: BTreeMap<String, usize>,
    /// Most active users, highest first
    pub user_counts: Vec<UserCount>,
    /// Daily counts from `today` backwards
    pub period_stats: Vec<DayCount>,
}

impl AuditStats {
    pub fn compute(logs: &[AuditLog], today: NaiveDate) -> Self {
        let mut action_counts = BTreeMap::new();
        let mut entity_counts = BTreeMap::new();
        let mut users: BTreeMap<&str, usize> = BTreeMap::new();
        let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();

        for log in logs {
            *action_counts
                .entry(log.action_type.as_str().to_string())
                .or_insert(0) += 1;
            *entity_counts
                .entry(log.entity_type.as_str().to_string())
                .or_insert(0) += 1;
            if let Some(ref user) = log.user_id {
                *users.entry(user.as_str()).or_insert(0) += 1;
            }
            *days.entry(log.timestamp.date_naive()).or_insert(0) += 1;
        }

        let mut user_counts: Vec<UserCount> = users
            .into_iter()
            .map(|(user_id, count)| UserCount {
                user_id: user_id.to_string(),
                count,
            })
            .collect();
        // stable sort keeps ties in name order
        user_counts.sort_by(|a, b| b.count.cmp(&a.count));
        user_counts.truncate(TOP_USERS);

        let period_stats = (0..STATS_DAYS)
            .map(|back| {
                let date = today - Duration::days(back);
                DayCount {
                    date,
                    count: days.get(&date).copied().unwrap_or(0),
                }
            })
            .collect();

        Self {
            total: logs.len(),
            action_counts,
            entity_counts,
            user_counts,
            period_stats,
        }
    }
}

/// Audit export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    #[diagnostic(code(comply::audit::export_csv))]
    Csv(String),

    #[error("JSON export failed: {0}")]
    #[diagnostic(code(comply::audit::export_json))]
    Json(#[from] serde_json::Error),
}

/// Render entries as CSV (with a Portuguese header row) or a JSON array
pub fn export(logs: &[&AuditLog], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(logs)?),
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(Vec::new());
            wtr.write_record([
                "ID",
                "Usuário",
                "Ação",
                "Entidade",
                "ID Entidade",
                "Descrição",
                "IP",
                "Data/Hora",
                "Dados Adicionais",
            ])
            .map_err(|e| ExportError::Csv(e.to_string()))?;

            for log in logs {
                wtr.write_record([
                    log.id.to_string(),
                    log.user_id.clone().unwrap_or_else(|| "Sistema".to_string()),
                    log.action_type.to_string(),
                    log.entity_type.to_string(),
                    log.entity_id.clone().unwrap_or_default(),
                    log.description.clone(),
                    log.ip_address.clone().unwrap_or_default(),
                    log.timestamp.format("%d/%m/%Y %H:%M:%S").to_string(),
                    log.additional_text().unwrap_or_default(),
                ])
                .map_err(|e| ExportError::Csv(e.to_string()))?;
            }

            let bytes = wtr
                .into_inner()
                .map_err(|e| ExportError::Csv(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| ExportError::Csv(e.to_string()))
        }
    }
}

/// Today's date in UTC, the reference day for statistics
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    /// Five entries, newest first, one of them a login
    fn sample_log() -> Vec<AuditLog> {
        vec![
            AuditLog::new(ActionType::Login, EntityType::User, "Usuário admin realizou login")
                .by("1")
                .on("1")
                .at(at(2025, 3, 10, 12, 0, 0)),
            AuditLog::new(
                ActionType::Create,
                EntityType::Checklist,
                "Criação de checklist LGPD Básico",
            )
            .by("1")
            .on("5")
            .with_data(serde_json::json!({"nome": "LGPD Básico", "categoria": "Compliance"}))
            .at(at(2025, 3, 10, 11, 0, 0)),
            AuditLog::new(
                ActionType::Update,
                EntityType::ChecklistItem,
                "Atualização de item de checklist #12",
            )
            .by("2")
            .on("12")
            .with_data(serde_json::json!({"status": "concluido"}))
            .at(at(2025, 3, 10, 10, 0, 0)),
            AuditLog::new(
                ActionType::Generate,
                EntityType::Documento,
                "Geração de documento Política de Privacidade",
            )
            .by("1")
            .on("3")
            .at(at(2025, 3, 9, 12, 0, 0)),
            AuditLog::new(
                ActionType::Upload,
                EntityType::Evidencia,
                "Upload de evidência para item #15",
            )
            .by("2")
            .on("7")
            .with_data(serde_json::json!({"filename": "contrato_assinado.pdf", "size": "1.2MB"}))
            .at(at(2025, 3, 8, 12, 0, 0)),
        ]
    }

    #[test]
    fn test_login_filter_finds_one() {
        let logs = sample_log();
        let filter = AuditFilter {
            action_type: Some(ActionType::Login),
            ..Default::default()
        };
        let result = filter.apply(&logs);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].description, "Usuário admin realizou login");
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let logs = sample_log();
        let filter = AuditFilter {
            user_id: Some("2".to_string()),
            entity_type: Some(EntityType::Evidencia),
            ..Default::default()
        };
        assert_eq!(filter.apply(&logs).len(), 1);

        let none = AuditFilter {
            user_id: Some("2".to_string()),
            action_type: Some(ActionType::Login),
            ..Default::default()
        };
        assert!(none.apply(&logs).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_and_covers_additional_data() {
        let logs = sample_log();
        let by_description = AuditFilter {
            search: Some("POLÍTICA".to_string()),
            ..Default::default()
        };
        assert_eq!(by_description.apply(&logs).len(), 1);

        let by_data = AuditFilter {
            search: Some("contrato_assinado".to_string()),
            ..Default::default()
        };
        let found = by_data.apply(&logs);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].action_type, ActionType::Upload);
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let logs = sample_log();
        let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let filter = AuditFilter {
            start_date: Some(day),
            end_date: Some(day),
            ..Default::default()
        };
        assert_eq!(filter.apply(&logs).len(), 1);

        let edge = vec![AuditLog::new(ActionType::Read, EntityType::System, "x")
            .at(at(2025, 3, 9, 23, 59, 59))];
        assert_eq!(filter.apply(&edge).len(), 1);
    }

    #[test]
    fn test_filter_is_idempotent_and_order_preserving() {
        let logs = sample_log();
        let filter = AuditFilter {
            user_id: Some("1".to_string()),
            ..Default::default()
        };
        let once: Vec<AuditLog> = filter.apply(&logs).into_iter().cloned().collect();
        let twice: Vec<AuditLog> = filter.apply(&once).into_iter().cloned().collect();
        assert_eq!(once, twice);
        let ids: Vec<_> = once.iter().map(|l| l.entity_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["1", "5", "3"]);

        let cleared = AuditFilter::default().apply(&logs);
        assert_eq!(cleared.len(), logs.len());
        assert!(AuditFilter::default().is_empty());
        assert!(AuditFilter {
            search: Some("  ".to_string()),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_pagination_of_twenty_five() {
        let items: Vec<u32> = (1..=25).collect();
        let page = paginate(items.clone(), 3, 10);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0], 21);

        assert_eq!(paginate(items.clone(), 0, 10).page, 1);
        assert!(paginate(items, 4, 10).items.is_empty());
        assert_eq!(paginate(Vec::<u32>::new(), 1, 10).total_pages, 0);
    }

    #[test]
    fn test_query_resets_page_on_filter_change() {
        let logs = sample_log();
        let mut query = AuditQuery::new(2);
        query.set_page(3);
        assert_eq!(query.run(&logs).items.len(), 1);

        query.update_filter(|f| f.user_id = Some("1".to_string()));
        assert_eq!(query.page(), 1);
        let page = query.run(&logs);
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 2);

        query.set_page(2);
        query.update_filter(|f| f.user_id = Some("1".to_string()));
        assert_eq!(query.page(), 2, "unchanged filter keeps the page");

        query.clear_filter();
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_history_and_activity() {
        let mut logs = sample_log();
        logs.push(
            AuditLog::new(ActionType::Update, EntityType::ChecklistItem, "again")
                .by("1")
                .on("12")
                .at(at(2025, 3, 11, 9, 0, 0)),
        );

        let history = entity_history(&logs, &EntityType::ChecklistItem, "12", HISTORY_LIMIT);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].description, "again");

        let activity = user_activity(&logs, "2", 1);
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].action_type, ActionType::Update);
    }

    #[test]
    fn test_stats() {
        let logs = sample_log();
        let stats = AuditStats::compute(&logs, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(stats.total, 5);
        assert_eq!(stats.action_counts.get("login"), Some(&1));
        assert_eq!(stats.entity_counts.get("evidencia"), Some(&1));
        assert_eq!(stats.user_counts[0].user_id, "1");
        assert_eq!(stats.user_counts[0].count, 3);
        assert_eq!(stats.period_stats.len(), 7);
        assert_eq!(stats.period_stats[0].count, 3);
        assert_eq!(stats.period_stats[1].count, 1);
        assert_eq!(stats.period_stats[2].count, 1);
        assert_eq!(stats.period_stats[3].count, 0);
    }

    #[test]
    fn test_export_csv() {
        let logs = sample_log();
        let refs: Vec<&AuditLog> = logs.iter().collect();
        let csv = export(&refs, ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("ID,Usuário,Ação"));
        assert_eq!(csv.lines().count(), 6);
        assert!(csv.contains("10/03/2025 12:00:00"));
    }

    #[test]
    fn test_export_json() {
        let logs = sample_log();
        let refs: Vec<&AuditLog> = logs.iter().take(2).collect();
        let json = export(&refs, ExportFormat::Json).unwrap();
        let parsed: Vec<AuditLog> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].action_type, ActionType::Login);
    }
}
