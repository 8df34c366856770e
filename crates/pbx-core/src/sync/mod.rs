//! Directional synchronization
//!
//! - **policy**: `SyncPolicy`, which acts on reconciliation results
//! - **report**: outcome types for single-item, bulk and startup operations

mod policy;
mod report;

pub use policy::{SyncPolicy, record_from_snapshot};
pub use report::{BulkReport, Conflict, ItemFailure, SyncAction, SyncOutcome, SyncResult};
