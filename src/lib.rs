//! Comply: LGPD compliance toolkit
//!
//! Checklists, risk register, trainings, notifications and an audit trail,
//! kept as plain-text files in a project directory.

pub mod analysis;
pub mod cli;
pub mod core;
pub mod entities;
pub mod logging;
pub mod yaml;
