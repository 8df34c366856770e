//! Marker-delimited section editing for generated telephony configuration.
//!
//! A generated file such as `pjsip.conf` is treated as a sequence of
//! hand-written text and managed sections:
//!
//! ```text
//! [global]
//! type=global
//!
//! ; BEGIN Extension 101
//! [101]
//! type=endpoint
//! ; END Extension 101
//! ```
//!
//! - [`parser`] finds sections and tells active ones from commented ones
//! - [`edit`] rewrites content in memory, leaving unrelated bytes untouched
//! - [`store`] applies those edits to a file with backups and atomic writes

pub mod edit;
pub mod error;
pub mod parser;
pub mod store;
pub mod syntax;

pub use error::{Error, Result};
pub use parser::{Section, SectionState, find_section, has_section, parse_sections};
pub use store::{ConfigSectionStore, MutationOutcome, StoreOptions};
pub use syntax::{DEFAULT_COMMENT_PREFIX, Marker, SectionSyntax};
