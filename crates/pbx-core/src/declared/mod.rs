//! Declared store implementations
//!
//! - **memory**: in-process store for tests and embedding
//! - **toml_store**: `[[extension]]` records persisted in a TOML file

mod memory;
mod toml_store;

pub use memory::MemoryDeclaredStore;
pub use toml_store::TomlDeclaredStore;
