//! ALwrity Store: content version snapshots behind a repository trait.

pub mod memory;
pub mod repository;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use memory::MemoryVersionStore;
pub use repository::VersionRepository;
pub use sqlite::SqliteVersionStore;
pub use types::*;
