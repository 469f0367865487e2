//! Category Repository - Core CRUD Operations
//!
//! SQLite-backed implementation for Category CRUD operations.
//! Specialized operations are in separate modules:
//! - category_stores: Category-Store membership rows
//! - category_audit: Append-only audit rows

use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use crate::domain::{Audit, CategoryColor, CategoryIcon, CategoryId, CategoryRecord, DomainError, DomainResult};
use super::super::db::SharedConnection;
use super::super::traits::Repository;
use super::category_audit::{append_new_audit, load_all_audit, load_audit};
use super::category_stores::{load_all_stores, load_stores, replace_stores};

const SELECT_CATEGORY: &str = "SELECT id, name, parent_id, color, icon, is_active, created_by, created_at, updated_at, version FROM categories";

/// SQLite implementation of Category repository
pub struct SqliteCategoryRepository {
    pub(super) conn: SharedConnection,
}

impl SqliteCategoryRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

pub(super) fn not_initialized() -> DomainError {
    DomainError::Repository("Database not initialized".to_string())
}

#[async_trait]
impl Repository<CategoryRecord> for SqliteCategoryRepository {
    async fn create(&self, entity: &CategoryRecord) -> DomainResult<CategoryRecord> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;
        let tx = conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM categories WHERE id = ?1",
                params![entity.id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            return Err(DomainError::Conflict(format!("Category {} already exists", entity.id)));
        }

        tx.execute(
            "INSERT INTO categories (id, name, parent_id, color, icon, is_active, created_by, created_at, updated_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                entity.id.to_string(),
                entity.name,
                entity.parent_id.map(|p| p.to_string()),
                entity.color.as_str(),
                entity.icon.as_str(),
                entity.is_active,
                entity.audit.created_by,
                ts_to_sql(&entity.audit.created_at),
                ts_to_sql(&entity.audit.updated_at),
                entity.audit.version as i64,
            ],
        )?;
        replace_stores(&tx, entity.id, &entity.stores)?;
        append_new_audit(&tx, entity.id, &entity.audit.log)?;
        tx.commit()?;

        Ok(entity.clone())
    }

    async fn find_by_id(&self, id: CategoryId) -> DomainResult<Option<CategoryRecord>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let found = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_CATEGORY),
                params![id.to_string()],
                row_to_category,
            )
            .optional()?;

        match found {
            Some(mut record) => {
                record.stores = load_stores(conn, id)?;
                record.audit.log = load_audit(conn, id)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> DomainResult<Vec<CategoryRecord>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        // rowid keeps insertion order
        let mut stmt = conn.prepare(&format!("{} ORDER BY rowid", SELECT_CATEGORY))?;
        let mut records = stmt
            .query_map([], row_to_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stores = load_all_stores(conn)?;
        let mut audit = load_all_audit(conn)?;
        for record in &mut records {
            record.stores = stores.remove(&record.id).unwrap_or_default();
            record.audit.log = audit.remove(&record.id).unwrap_or_default();
        }
        Ok(records)
    }

    async fn update(&self, entity: &CategoryRecord) -> DomainResult<CategoryRecord> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;
        let tx = conn.transaction()?;

        let stored: Option<i64> = tx
            .query_row(
                "SELECT version FROM categories WHERE id = ?1",
                params![entity.id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let stored = stored.ok_or(DomainError::NotFound(entity.id))? as u64;
        if stored != entity.audit.version {
            return Err(DomainError::ConcurrentModification {
                id: entity.id,
                expected: entity.audit.version,
                actual: stored,
            });
        }

        let mut saved = entity.clone();
        saved.audit.version += 1;

        tx.execute(
            "UPDATE categories SET name = ?1, parent_id = ?2, color = ?3, icon = ?4, is_active = ?5, updated_at = ?6, version = ?7 WHERE id = ?8",
            params![
                saved.name,
                saved.parent_id.map(|p| p.to_string()),
                saved.color.as_str(),
                saved.icon.as_str(),
                saved.is_active,
                ts_to_sql(&saved.audit.updated_at),
                saved.audit.version as i64,
                saved.id.to_string(),
            ],
        )?;
        replace_stores(&tx, saved.id, &saved.stores)?;
        append_new_audit(&tx, saved.id, &saved.audit.log)?;
        tx.commit()?;

        Ok(saved)
    }

    async fn delete(&self, id: CategoryId) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;
        let tx = conn.transaction()?;

        let key = id.to_string();
        tx.execute("DELETE FROM category_stores WHERE category_id = ?1", params![key])?;
        tx.execute("DELETE FROM category_audit WHERE category_id = ?1", params![key])?;
        let removed = tx.execute("DELETE FROM categories WHERE id = ?1", params![key])?;
        if removed == 0 {
            return Err(DomainError::NotFound(id));
        }
        tx.commit()?;

        Ok(())
    }
}

/// Convert a database row to Category; stores and audit log are loaded separately
pub(super) fn row_to_category(row: &Row<'_>) -> rusqlite::Result<CategoryRecord> {
    let parent: Option<String> = row.get(2)?;
    let color: String = row.get(3)?;
    let icon: String = row.get(4)?;

    Ok(CategoryRecord {
        id: parse_id(0, &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        parent_id: parent.map(|p| parse_id(2, &p)).transpose()?,
        color: CategoryColor::from_str(&color).map_err(|e| conversion_err(3, e))?,
        icon: CategoryIcon::from_name(&icon),
        stores: BTreeSet::new(),
        is_active: row.get(5)?,
        audit: Audit {
            created_by: row.get(6)?,
            created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
            updated_at: parse_ts(8, &row.get::<_, String>(8)?)?,
            version: row.get::<_, i64>(9)? as u64,
            log: Vec::new(),
        },
    })
}

pub(super) fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(super) fn parse_id(idx: usize, raw: &str) -> rusqlite::Result<CategoryId> {
    CategoryId::from_str(raw).map_err(|e| conversion_err(idx, e))
}

pub(super) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

/// Nanosecond RFC 3339 so timestamps survive a round trip unchanged
pub(super) fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
