//! CLI command implementations

pub mod audit;
pub mod checklist;
pub mod completions;
pub mod config;
pub mod dashboard;
pub mod init;
pub mod notify;
pub mod risk;
pub mod training;

use crate::cli::GlobalOpts;
use crate::core::context::AppContext;

/// Open the project named by `--project`, or the one around the working directory
pub(crate) fn open_context(global: &GlobalOpts) -> miette::Result<AppContext> {
    Ok(AppContext::open(global.project.as_deref())?)
}
