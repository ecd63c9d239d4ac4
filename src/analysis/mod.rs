//! Derived views over stored records
//!
//! Everything here is pure: inputs are plain entity slices, outputs are
//! serializable view models that the CLI renders.

pub mod audit_query;
pub mod format;
pub mod matrix;
pub mod metrics;

pub use audit_query::{AuditFilter, AuditQuery, AuditStats, Page};
pub use matrix::{MatrixMode, MatrixPoint, RiskMatrix, SeverityBand, SeverityThresholds};
pub use metrics::{ComplianceMetrics, Recommendation, RecommendationThresholds};
