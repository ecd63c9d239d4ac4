//! Checklist entity type with its items and evidence

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::metrics::conformity_percent;
use crate::core::entity::{Entity, Priority};
use crate::core::identity::{EntityId, EntityPrefix};

/// Progress status of a checklist item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
#[derive(Default)]
pub enum ItemStatus {
    #[default]
    Pendente,
    EmAndamento,
    Concluido,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pendente => "pendente",
            ItemStatus::EmAndamento => "em_andamento",
            ItemStatus::Concluido => "concluido",
        }
    }

    pub fn all() -> [ItemStatus; 3] {
        [ItemStatus::Pendente, ItemStatus::EmAndamento, ItemStatus::Concluido]
    }

    /// Not yet concluded
    pub fn is_open(&self) -> bool {
        !matches!(self, ItemStatus::Concluido)
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk rating of a checklist item
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
#[derive(Default)]
pub enum RiskRating {
    Baixo,
    #[default]
    Medio,
    Alto,
}

impl RiskRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskRating::Baixo => "baixo",
            RiskRating::Medio => "medio",
            RiskRating::Alto => "alto",
        }
    }

    pub fn all() -> [RiskRating; 3] {
        [RiskRating::Baixo, RiskRating::Medio, RiskRating::Alto]
    }
}

impl std::fmt::Display for RiskRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An uploaded file attached to a checklist item as proof of completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: EntityId,

    /// File name as uploaded
    pub original_name: String,

    /// Stored location relative to the project root
    pub path: String,

    /// MIME type inferred at upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,

    /// SHA-256 of the file contents (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub uploaded_at: DateTime<Utc>,

    pub uploaded_by: String,
}

impl Evidence {
    /// Lowercased extension of the original file name, with the dot
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.original_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }
}

/// An individual action entry of a checklist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: EntityId,

    /// Owning checklist
    pub checklist_id: EntityId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub risk: RiskRating,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub status: ItemStatus,

    /// Due date, used by deadline notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,
}

impl ChecklistItem {
    pub fn new(checklist_id: EntityId, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Item),
            checklist_id,
            name,
            description: None,
            category: None,
            risk: RiskRating::default(),
            priority: Priority::default(),
            status: ItemStatus::default(),
            due: None,
            evidence: Vec::new(),
            created: now,
            updated: now,
        }
    }

    /// Days until the due date, negative when overdue
    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        self.due.map(|due| (due - today).num_days())
    }
}

/// A compliance checklist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    pub id: EntityId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub items: Vec<ChecklistItem>,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,

    pub author: String,
}

impl Entity for Checklist {
    const PREFIX: EntityPrefix = EntityPrefix::Chk;
    const NAME: &'static str = "checklist";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn status(&self) -> &str {
        if self.items.is_empty() {
            "vazio"
        } else if self.completed_items() == self.total_items() {
            ItemStatus::Concluido.as_str()
        } else if self.items.iter().any(|i| i.status != ItemStatus::Pendente) {
            ItemStatus::EmAndamento.as_str()
        } else {
            ItemStatus::Pendente.as_str()
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Checklist {
    pub fn new(name: String, author: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Chk),
            name,
            category: None,
            description: None,
            items: Vec::new(),
            created: now,
            updated: now,
            author,
        }
    }

    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    pub fn completed_items(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Concluido)
            .count()
    }

    /// Rounded completion percentage; 0 for an empty checklist
    pub fn completion_pct(&self) -> u32 {
        conformity_percent(self.completed_items(), self.total_items())
    }

    /// Item counts for each risk rating, in low to high order
    pub fn items_by_risk(&self) -> [(RiskRating, usize); 3] {
        RiskRating::all().map(|r| (r, self.items.iter().filter(|i| i.risk == r).count()))
    }

    /// Append a new item and return a mutable reference to it
    pub fn add_item(&mut self, name: String) -> &mut ChecklistItem {
        let item = ChecklistItem::new(self.id.clone(), name);
        self.items.push(item);
        self.updated = Utc::now();
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    pub fn item(&self, id: &str) -> Option<&ChecklistItem> {
        self.items.iter().find(|i| i.id.to_string() == id)
    }

    pub fn item_mut(&mut self, id: &str) -> Option<&mut ChecklistItem> {
        self.items.iter_mut().find(|i| i.id.to_string() == id)
    }

    /// Remove an item, returning it with its evidence
    pub fn remove_item(&mut self, id: &str) -> Option<ChecklistItem> {
        let pos = self.items.iter().position(|i| i.id.to_string() == id)?;
        self.updated = Utc::now();
        Some(self.items.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checklist_with(statuses: &[ItemStatus]) -> Checklist {
        let mut checklist = Checklist::new("Conformidade LGPD".to_string(), "ana".to_string());
        for (n, status) in statuses.iter().enumerate() {
            checklist.add_item(format!("Item {}", n)).status = *status;
        }
        checklist
    }

    #[test]
    fn test_checklist_creation() {
        let checklist = Checklist::new("Segurança".to_string(), "ana".to_string());
        assert!(checklist.id.to_string().starts_with("CHK-"));
        assert_eq!(checklist.status(), "vazio");
        assert_eq!(checklist.completion_pct(), 0);
    }

    #[test]
    fn test_completion_percentage_rounds() {
        let checklist = checklist_with(&[
            ItemStatus::Concluido,
            ItemStatus::Concluido,
            ItemStatus::Pendente,
        ]);
        // 2/3 = 66.67 rounds to 67
        assert_eq!(checklist.completion_pct(), 67);
        assert_eq!(checklist.status(), "em_andamento");
    }

    #[test]
    fn test_all_items_done_reports_concluido() {
        let checklist = checklist_with(&[ItemStatus::Concluido, ItemStatus::Concluido]);
        assert_eq!(checklist.status(), "concluido");
        assert_eq!(checklist.completion_pct(), 100);
    }

    #[test]
    fn test_items_by_risk() {
        let mut checklist = checklist_with(&[ItemStatus::Pendente; 3]);
        checklist.items[0].risk = RiskRating::Alto;
        checklist.items[1].risk = RiskRating::Alto;
        let counts = checklist.items_by_risk();
        assert_eq!(counts[0], (RiskRating::Baixo, 0));
        assert_eq!(counts[1], (RiskRating::Medio, 1));
        assert_eq!(counts[2], (RiskRating::Alto, 2));
    }

    #[test]
    fn test_add_and_remove_item() {
        let mut checklist = checklist_with(&[]);
        let id = checklist.add_item("Mapear dados".to_string()).id.to_string();
        assert!(id.starts_with("ITEM-"));
        assert_eq!(checklist.items[0].checklist_id, checklist.id);
        assert!(checklist.item(&id).is_some());

        let removed = checklist.remove_item(&id).unwrap();
        assert_eq!(removed.name, "Mapear dados");
        assert!(checklist.items.is_empty());
        assert!(checklist.remove_item(&id).is_none());
    }

    #[test]
    fn test_item_serializes_wire_values() {
        let mut checklist = checklist_with(&[ItemStatus::EmAndamento]);
        checklist.items[0].risk = RiskRating::Alto;
        let yaml = serde_yml::to_string(&checklist).unwrap();
        assert!(yaml.contains("status: em_andamento"));
        assert!(yaml.contains("risk: alto"));
        assert!(yaml.contains("priority: media"));
    }

    #[test]
    fn test_days_remaining() {
        let mut item = ChecklistItem::new(EntityId::new(EntityPrefix::Chk), "x".to_string());
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(item.days_remaining(today), None);
        item.due = NaiveDate::from_ymd_opt(2025, 6, 4);
        assert_eq!(item.days_remaining(today), Some(3));
        item.due = NaiveDate::from_ymd_opt(2025, 5, 30);
        assert_eq!(item.days_remaining(today), Some(-2));
    }

    #[test]
    fn test_evidence_extension() {
        let evidence = Evidence {
            id: EntityId::new(EntityPrefix::Evd),
            original_name: "Contrato.PDF".to_string(),
            path: "evidence/x.pdf".to_string(),
            mime_type: None,
            size: 10,
            sha256: None,
            note: None,
            uploaded_at: Utc::now(),
            uploaded_by: "ana".to_string(),
        };
        assert_eq!(evidence.extension(), ".pdf");
    }
}
