//! Category Audit Operations
//!
//! Append-only audit rows. Entries already stored are never rewritten.

use std::collections::HashMap;

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::domain::{AuditAction, AuditEntry, CategoryId, DomainResult};
use super::category_repo::{conversion_err, not_initialized, parse_id, parse_ts, ts_to_sql};

/// Trait for reading the stored audit trail
#[async_trait]
pub trait CategoryAuditOperations {
    /// Audit entries of a category, oldest first
    async fn audit_trail(&self, id: CategoryId) -> DomainResult<Vec<AuditEntry>>;
}

#[async_trait]
impl CategoryAuditOperations for super::category_repo::SqliteCategoryRepository {
    async fn audit_trail(&self, id: CategoryId) -> DomainResult<Vec<AuditEntry>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        load_audit(conn, id)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<AuditEntry> {
    let action: String = row.get(offset + 2)?;
    Ok(AuditEntry {
        actor: row.get(offset)?,
        timestamp: parse_ts(offset + 1, &row.get::<_, String>(offset + 1)?)?,
        action: serde_json::from_str::<AuditAction>(&action).map_err(|e| conversion_err(offset + 2, e))?,
    })
}

pub(super) fn load_audit(conn: &Connection, id: CategoryId) -> DomainResult<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT actor, timestamp, action FROM category_audit WHERE category_id = ?1 ORDER BY seq",
    )?;
    let entries = stmt
        .query_map(params![id.to_string()], |row| row_to_entry(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

pub(super) fn load_all_audit(conn: &Connection) -> DomainResult<HashMap<CategoryId, Vec<AuditEntry>>> {
    let mut stmt = conn.prepare("SELECT category_id, actor, timestamp, action FROM category_audit ORDER BY seq")?;
    let rows = stmt.query_map([], |row| Ok((parse_id(0, &row.get::<_, String>(0)?)?, row_to_entry(row, 1)?)))?;

    let mut audit: HashMap<CategoryId, Vec<AuditEntry>> = HashMap::new();
    for row in rows {
        let (category_id, entry) = row?;
        audit.entry(category_id).or_default().push(entry);
    }
    Ok(audit)
}

/// Store the entries of `log` beyond those already persisted
pub(super) fn append_new_audit(conn: &Connection, id: CategoryId, log: &[AuditEntry]) -> DomainResult<()> {
    let key = id.to_string();
    let stored: i64 = conn.query_row(
        "SELECT COUNT(*) FROM category_audit WHERE category_id = ?1",
        params![key],
        |row| row.get(0),
    )?;
    let skip = (stored.max(0) as usize).min(log.len());

    let mut insert = conn.prepare(
        "INSERT INTO category_audit (category_id, actor, timestamp, action) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for entry in &log[skip..] {
        insert.execute(params![
            key,
            entry.actor,
            ts_to_sql(&entry.timestamp),
            serde_json::to_string(&entry.action)?,
        ])?;
    }
    Ok(())
}
