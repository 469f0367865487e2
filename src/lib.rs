//! Shelf Categories
//!
//! Category hierarchy management for a retail back office.
//!
//! Layered architecture:
//! - domain: Category entity, store membership and write-time validation
//! - hierarchy: Pure tree, ancestry, descendant and integrity views over a snapshot
//! - filter / toggle: List narrowing and the active/inactive workflow
//! - repository: Data access abstractions and implementations
//! - service: Validated, audited operations

use std::path::{Path, PathBuf};

pub mod config;
pub mod domain;
pub mod filter;
pub mod hierarchy;
pub mod repository;
pub mod service;
pub mod telemetry;
pub mod toggle;

pub use config::{Config, ConfigError, StoreValidation, ValidationConfig};
pub use domain::{CategoryId, CategoryPatch, CategoryRecord, DomainError, DomainResult, NewCategory, StoreId};
pub use repository::{init_db, DbState, SqliteCategoryRepository};
pub use service::CategoryService;

pub const DB_FILE: &str = "categories.db";

/// Database path inside a data directory, creating the directory if needed
pub fn db_path(data_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(data_dir)?;
    Ok(data_dir.join(DB_FILE))
}

/// Open (and migrate) the SQLite category store under `data_dir`
pub async fn open_sqlite_repository(data_dir: &Path) -> DomainResult<SqliteCategoryRepository> {
    let path = db_path(data_dir).map_err(|e| DomainError::Repository(e.to_string()))?;
    let state = init_db(&path).await?;
    log::info!("Category database ready at {}", path.display());
    Ok(SqliteCategoryRepository::new(state.conn))
}
