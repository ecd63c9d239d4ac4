//! Core module - fundamental types and services

pub mod audit;
pub mod config;
pub mod context;
pub mod deadlines;
pub mod entity;
pub mod identity;
pub mod project;
pub mod shortid;
pub mod store;
pub mod upload;

pub use audit::{AuditError, AuditTrail};
pub use config::Config;
pub use context::AppContext;
pub use entity::{Entity, Priority};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use project::{Project, ProjectError};
pub use shortid::ShortIdIndex;
pub use store::{FsStore, MemoryStore, Store, StoreError};
pub use upload::UploadError;
