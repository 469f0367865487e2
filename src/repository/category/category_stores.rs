//! Category-Store Relationship Operations
//!
//! Rows of the many-to-many membership between categories and stores.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::domain::{CategoryId, DomainResult, StoreId};
use super::category_repo::{not_initialized, parse_id};

/// Trait for reverse store lookups
#[async_trait]
pub trait CategoryStoreOperations {
    /// Ids of every category associated with a store
    async fn category_ids_for_store(&self, store_id: &StoreId) -> DomainResult<Vec<CategoryId>>;
}

#[async_trait]
impl CategoryStoreOperations for super::category_repo::SqliteCategoryRepository {
    async fn category_ids_for_store(&self, store_id: &StoreId) -> DomainResult<Vec<CategoryId>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn.prepare(
            "SELECT cs.category_id FROM category_stores cs
             JOIN categories c ON c.id = cs.category_id
             WHERE cs.store_id = ?1
             ORDER BY c.rowid",
        )?;
        let ids = stmt
            .query_map(params![store_id.as_str()], |row| parse_id(0, &row.get::<_, String>(0)?))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }
}

pub(super) fn load_stores(conn: &Connection, id: CategoryId) -> DomainResult<BTreeSet<StoreId>> {
    let mut stmt = conn.prepare("SELECT store_id FROM category_stores WHERE category_id = ?1")?;
    let stores = stmt
        .query_map(params![id.to_string()], |row| row.get::<_, String>(0).map(StoreId::new))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;
    Ok(stores)
}

pub(super) fn load_all_stores(conn: &Connection) -> DomainResult<HashMap<CategoryId, BTreeSet<StoreId>>> {
    let mut stmt = conn.prepare("SELECT category_id, store_id FROM category_stores")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            parse_id(0, &row.get::<_, String>(0)?)?,
            StoreId::new(row.get::<_, String>(1)?),
        ))
    })?;

    let mut stores: HashMap<CategoryId, BTreeSet<StoreId>> = HashMap::new();
    for row in rows {
        let (category_id, store_id) = row?;
        stores.entry(category_id).or_default().insert(store_id);
    }
    Ok(stores)
}

/// Make the stored membership equal `stores`
pub(super) fn replace_stores(conn: &Connection, id: CategoryId, stores: &BTreeSet<StoreId>) -> DomainResult<()> {
    let key = id.to_string();
    conn.execute("DELETE FROM category_stores WHERE category_id = ?1", params![key])?;

    let mut insert = conn.prepare("INSERT INTO category_stores (category_id, store_id) VALUES (?1, ?2)")?;
    for store in stores {
        insert.execute(params![key, store.as_str()])?;
    }
    Ok(())
}
