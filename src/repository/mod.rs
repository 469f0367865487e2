//! Repository Layer
//!
//! Data access abstractions, collaborator traits and their implementations.

mod db;
mod memory;
mod traits;

pub mod category;

#[cfg(test)]
mod tests;

pub use category::SqliteCategoryRepository;
pub use db::{init_db, DbState, SharedConnection};
pub use memory::{MemoryAuditLog, MemoryCategoryRepository, MemoryStoreDirectory};
pub use traits::{AuditSink, CategoryRepository, Repository, StoreDirectory};
