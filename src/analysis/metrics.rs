//! Compliance metrics over checklist items
//!
//! Reduces items to status and risk counts, per-category conformity,
//! chart datasets and threshold-driven recommendations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::format;
use crate::entities::checklist::{ChecklistItem, ItemStatus, RiskRating};

/// Category label for items without one
pub const UNCATEGORIZED: &str = "Sem categoria";

/// `round(done / total * 100)`, or 0 when there is nothing to count
pub fn conformity_percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pendente: usize,
    pub em_andamento: usize,
    pub concluido: usize,
}

impl StatusCounts {
    pub fn get(&self, status: ItemStatus) -> usize {
        match status {
            ItemStatus::Pendente => self.pendente,
            ItemStatus::EmAndamento => self.em_andamento,
            ItemStatus::Concluido => self.concluido,
        }
    }

    fn bump(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Pendente => self.pendente += 1,
            ItemStatus::EmAndamento => self.em_andamento += 1,
            ItemStatus::Concluido => self.concluido += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskCounts {
    pub baixo: usize,
    pub medio: usize,
    pub alto: usize,
}

impl RiskCounts {
    pub fn get(&self, risk: RiskRating) -> usize {
        match risk {
            RiskRating::Baixo => self.baixo,
            RiskRating::Medio => self.medio,
            RiskRating::Alto => self.alto,
        }
    }

    fn bump(&mut self, risk: RiskRating) {
        match risk {
            RiskRating::Baixo => self.baixo += 1,
            RiskRating::Medio => self.medio += 1,
            RiskRating::Alto => self.alto += 1,
        }
    }
}

/// Completion of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: usize,
    pub completed: usize,
    pub percent: u32,
}

impl CategorySummary {
    pub fn new(category: impl Into<String>, total: usize, completed: usize) -> Self {
        Self {
            category: category.into(),
            total,
            completed,
            percent: conformity_percent(completed, total),
        }
    }
}

/// Aggregated view of a set of checklist items
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComplianceMetrics {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_risk: RiskCounts,
    pub categories: Vec<CategorySummary>,
    pub overall_percent: u32,
}

impl ComplianceMetrics {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a ChecklistItem>) -> Self {
        let mut metrics = Self::default();
        let mut per_category: BTreeMap<String, (usize, usize)> = BTreeMap::new();

        for item in items {
            metrics.total += 1;
            metrics.by_status.bump(item.status);
            metrics.by_risk.bump(item.risk);

            let category = item
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(UNCATEGORIZED);
            let entry = per_category.entry(category.to_string()).or_default();
            entry.0 += 1;
            if item.status == ItemStatus::Concluido {
                entry.1 += 1;
            }
        }

        metrics.categories = per_category
            .into_iter()
            .map(|(category, (total, done))| CategorySummary::new(category, total, done))
            .collect();
        metrics.overall_percent = conformity_percent(metrics.by_status.concluido, metrics.total);
        metrics
    }

    /// Metrics from precomputed category summaries.
    ///
    /// Summaries carry no risk or in-progress detail, so those counts stay
    /// zero and every unfinished item counts as pending.
    pub fn from_summaries(summaries: Vec<CategorySummary>) -> Self {
        let total: usize = summaries.iter().map(|s| s.total).sum();
        let completed: usize = summaries.iter().map(|s| s.completed.min(s.total)).sum();
        Self {
            total,
            by_status: StatusCounts {
                pendente: total - completed,
                em_andamento: 0,
                concluido: completed,
            },
            by_risk: RiskCounts::default(),
            categories: summaries,
            overall_percent: conformity_percent(completed, total),
        }
    }

    /// Status distribution and category conformity datasets
    pub fn chart_data(&self) -> ChartData {
        let status = Dataset {
            label: "Status dos itens".to_string(),
            points: ItemStatus::all()
                .into_iter()
                .map(|s| {
                    let badge = format::item_status(s.as_str());
                    DataPoint {
                        label: badge.label.into_owned(),
                        value: self.by_status.get(s) as u32,
                        color: badge.color,
                    }
                })
                .collect(),
        };

        let conformity = Dataset {
            label: "Conformidade por categoria (%)".to_string(),
            points: self
                .categories
                .iter()
                .map(|c| DataPoint {
                    label: c.category.clone(),
                    value: c.percent,
                    color: format::conformity(c.percent).color,
                })
                .collect(),
        };

        ChartData { status, conformity }
    }

    /// Every recommendation whose gate is open; gates are independent
    pub fn recommendations(&self, t: &RecommendationThresholds) -> Vec<Recommendation> {
        let mut out = Vec::new();

        if self.by_risk.alto > t.high_risk_items {
            out.push(Recommendation {
                kind: RecommendationKind::HighRiskItems,
                message: format!(
                    "{} item(ns) de alto risco: priorize o tratamento desses itens",
                    self.by_risk.alto
                ),
            });
        }

        if self.overall_percent < t.overall_conformity {
            out.push(Recommendation {
                kind: RecommendationKind::LowOverallConformity,
                message: format!(
                    "Conformidade geral em {}%: revise o plano de adequação",
                    self.overall_percent
                ),
            });
        }

        let lagging: Vec<&str> = self
            .categories
            .iter()
            .filter(|c| c.percent < t.category_conformity)
            .map(|c| c.category.as_str())
            .collect();
        if !lagging.is_empty() {
            out.push(Recommendation {
                kind: RecommendationKind::LowCategoryConformity,
                message: format!(
                    "Categorias abaixo de {}%: {}",
                    t.category_conformity,
                    lagging.join(", ")
                ),
            });
        }

        if self.by_status.pendente > t.pending_items {
            out.push(Recommendation {
                kind: RecommendationKind::ManyPendingItems,
                message: format!(
                    "{} itens pendentes: distribua responsáveis e prazos",
                    self.by_status.pendente
                ),
            });
        }

        out
    }
}

/// Limits that open each recommendation gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    /// High-risk item count must exceed this
    pub high_risk_items: usize,
    /// Overall conformity must fall below this percentage
    pub overall_conformity: u32,
    /// Any category must fall below this percentage
    pub category_conformity: u32,
    /// Pending item count must exceed this
    pub pending_items: usize,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            high_risk_items: 0,
            overall_conformity: 50,
            category_conformity: 30,
            pending_items: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    HighRiskItems,
    LowOverallConformity,
    LowCategoryConformity,
    ManyPendingItems,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataPoint {
    pub label: String,
    pub value: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub label: String,
    pub points: Vec<DataPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub status: Dataset,
    pub conformity: Dataset,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{EntityId, EntityPrefix};

    fn item(category: Option<&str>, status: ItemStatus, risk: RiskRating) -> ChecklistItem {
        let mut item = ChecklistItem::new(EntityId::new(EntityPrefix::Chk), "item".to_string());
        item.category = category.map(str::to_string);
        item.status = status;
        item.risk = risk;
        item
    }

    fn kinds(recs: &[Recommendation]) -> Vec<RecommendationKind> {
        recs.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_three_of_ten_is_thirty_percent() {
        let mut items: Vec<ChecklistItem> = (0..3)
            .map(|_| item(Some("Governança"), ItemStatus::Concluido, RiskRating::Baixo))
            .collect();
        items.extend((0..7).map(|_| item(Some("Governança"), ItemStatus::Pendente, RiskRating::Baixo)));

        let metrics = ComplianceMetrics::from_items(&items);
        assert_eq!(metrics.total, 10);
        assert_eq!(metrics.categories[0].percent, 30);
        assert_eq!(metrics.overall_percent, 30);
    }

    #[test]
    fn test_empty_input_is_zero() {
        let metrics = ComplianceMetrics::from_items(&Vec::<ChecklistItem>::new());
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.overall_percent, 0);
        assert!(metrics.categories.is_empty());
        assert_eq!(conformity_percent(0, 0), 0);
        assert_eq!(CategorySummary::new("x", 0, 0).percent, 0);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        assert_eq!(conformity_percent(1, 3), 33);
        assert_eq!(conformity_percent(2, 3), 67);
        assert_eq!(conformity_percent(1, 8), 13);
    }

    #[test]
    fn test_counts_and_uncategorized_group() {
        let items = vec![
            item(None, ItemStatus::Pendente, RiskRating::Alto),
            item(Some("  "), ItemStatus::EmAndamento, RiskRating::Medio),
            item(Some("Segurança"), ItemStatus::Concluido, RiskRating::Alto),
        ];
        let metrics = ComplianceMetrics::from_items(&items);

        assert_eq!(metrics.by_status.get(ItemStatus::Pendente), 1);
        assert_eq!(metrics.by_status.get(ItemStatus::EmAndamento), 1);
        assert_eq!(metrics.by_risk.get(RiskRating::Alto), 2);

        let names: Vec<&str> = metrics.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Segurança", UNCATEGORIZED]);
        assert_eq!(metrics.categories[1].total, 2);
        assert_eq!(metrics.categories[1].percent, 0);
    }

    #[test]
    fn test_all_gates_fire_together() {
        let mut items: Vec<ChecklistItem> = (0..11)
            .map(|_| item(Some("Direitos"), ItemStatus::Pendente, RiskRating::Medio))
            .collect();
        items.push(item(Some("Direitos"), ItemStatus::Pendente, RiskRating::Alto));

        let recs = ComplianceMetrics::from_items(&items)
            .recommendations(&RecommendationThresholds::default());
        assert_eq!(
            kinds(&recs),
            vec![
                RecommendationKind::HighRiskItems,
                RecommendationKind::LowOverallConformity,
                RecommendationKind::LowCategoryConformity,
                RecommendationKind::ManyPendingItems,
            ]
        );
    }

    #[test]
    fn test_no_recommendations_when_compliant() {
        let items: Vec<ChecklistItem> = (0..4)
            .map(|_| item(Some("Governança"), ItemStatus::Concluido, RiskRating::Baixo))
            .collect();
        let recs = ComplianceMetrics::from_items(&items)
            .recommendations(&RecommendationThresholds::default());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_gates_are_independent() {
        // 60% overall, but one category at 0%
        let mut items: Vec<ChecklistItem> = (0..3)
            .map(|_| item(Some("A"), ItemStatus::Concluido, RiskRating::Baixo))
            .collect();
        items.extend((0..2).map(|_| item(Some("B"), ItemStatus::Pendente, RiskRating::Baixo)));

        let recs = ComplianceMetrics::from_items(&items)
            .recommendations(&RecommendationThresholds::default());
        assert_eq!(kinds(&recs), vec![RecommendationKind::LowCategoryConformity]);
        assert!(recs[0].message.contains('B'));
    }

    #[test]
    fn test_from_summaries() {
        let metrics = ComplianceMetrics::from_summaries(vec![
            CategorySummary::new("Segurança", 10, 3),
            CategorySummary::new("Governança", 0, 0),
        ]);
        assert_eq!(metrics.total, 10);
        assert_eq!(metrics.by_status.pendente, 7);
        assert_eq!(metrics.overall_percent, 30);
    }

    #[test]
    fn test_chart_data_colors() {
        let items = vec![
            item(Some("A"), ItemStatus::Concluido, RiskRating::Baixo),
            item(Some("B"), ItemStatus::Pendente, RiskRating::Baixo),
        ];
        let chart = ComplianceMetrics::from_items(&items).chart_data();
        assert_eq!(chart.status.points.len(), 3);
        assert_eq!(chart.status.points[2].label, "Concluído");
        assert_eq!(chart.conformity.points[0].color, "#28a745");
        assert_eq!(chart.conformity.points[1].color, "#dc3545");
    }
}
