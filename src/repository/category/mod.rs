//! Category Repository Module
//!
//! This module provides the SQLite category repository split into specialized sub-modules:
//! - category_repo: Core CRUD operations
//! - category_stores: Category-Store relationship rows
//! - category_audit: Audit trail rows

mod category_audit;
mod category_repo;
mod category_stores;

pub use category_repo::SqliteCategoryRepository;

// Re-export all operation traits so they can be used by importing SqliteCategoryRepository
pub use category_audit::CategoryAuditOperations;
pub use category_stores::CategoryStoreOperations;
