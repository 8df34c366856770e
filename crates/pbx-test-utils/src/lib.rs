//! Shared test utilities for the pbx-sync workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixture`]: [`TestPbx`], a temp directory wired to a full `SyncPolicy`
//! - [`records`]: builders for declared records and runtime snapshots
//! - [`doubles`]: collaborators that record calls or fail on demand

pub mod doubles;
pub mod fixture;
pub mod records;

pub use doubles::{FailingDeclaredStore, FailingProbe, RecordingReload, StaticProbe};
pub use fixture::TestPbx;
pub use records::{extension, snapshot_of};
