//! Drift detection between declared records and runtime state
//!
//! - **status**: classification and summary types
//! - **engine**: the pure comparison and the collaborator-backed engine

mod engine;
mod status;

pub use engine::{ReconciliationEngine, compare, diff, summarize};
pub use status::{SyncInfo, SyncStatus, SyncSummary};
