//! In-memory collaborators
//!
//! Insertion-ordered category store, store directory and audit log backed by tokio locks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::domain::{AuditAction, AuditEntry, CategoryId, CategoryRecord, DomainError, DomainResult, StoreId};

use super::traits::{AuditSink, Repository, StoreDirectory};

#[derive(Default)]
pub struct MemoryCategoryRepository {
    records: RwLock<Vec<CategoryRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<CategoryRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail with a repository error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Repository("write rejected by backing store".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository<CategoryRecord> for MemoryCategoryRepository {
    async fn create(&self, entity: &CategoryRecord) -> DomainResult<CategoryRecord> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == entity.id) {
            return Err(DomainError::Conflict(format!("Category {} already exists", entity.id)));
        }
        records.push(entity.clone());
        Ok(entity.clone())
    }

    async fn find_by_id(&self, id: CategoryId) -> DomainResult<Option<CategoryRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<CategoryRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn update(&self, entity: &CategoryRecord) -> DomainResult<CategoryRecord> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        let stored = records
            .iter_mut()
            .find(|r| r.id == entity.id)
            .ok_or(DomainError::NotFound(entity.id))?;

        if stored.audit.version != entity.audit.version {
            return Err(DomainError::ConcurrentModification {
                id: entity.id,
                expected: entity.audit.version,
                actual: stored.audit.version,
            });
        }

        let mut saved = entity.clone();
        saved.audit.version += 1;
        *stored = saved.clone();
        Ok(saved)
    }

    async fn delete(&self, id: CategoryId) -> DomainResult<()> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(DomainError::NotFound(id))?;
        records.remove(pos);
        Ok(())
    }
}

/// Store directory keyed by id with display names
#[derive(Default)]
pub struct MemoryStoreDirectory {
    stores: RwLock<HashMap<StoreId, String>>,
}

impl MemoryStoreDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stores<I, N>(stores: I) -> Self
    where
        I: IntoIterator<Item = (StoreId, N)>,
        N: Into<String>,
    {
        Self {
            stores: RwLock::new(stores.into_iter().map(|(id, name)| (id, name.into())).collect()),
        }
    }

    pub async fn insert(&self, id: StoreId, name: impl Into<String>) {
        self.stores.write().await.insert(id, name.into());
    }
}

#[async_trait]
impl StoreDirectory for MemoryStoreDirectory {
    async fn exists(&self, store_id: &StoreId) -> DomainResult<bool> {
        Ok(self.stores.read().await.contains_key(store_id))
    }

    async fn display_name(&self, store_id: &StoreId) -> DomainResult<Option<String>> {
        Ok(self.stores.read().await.get(store_id).cloned())
    }
}

/// Audit sink that keeps every entry in memory
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<(CategoryId, AuditEntry)>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<(CategoryId, AuditEntry)> {
        self.entries.lock().await.clone()
    }

    pub async fn entries_for(&self, id: CategoryId) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|(category_id, _)| *category_id == id)
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn record(
        &self,
        category_id: CategoryId,
        actor: &str,
        action: &AuditAction,
        timestamp: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.entries.lock().await.push((
            category_id,
            AuditEntry {
                actor: actor.to_string(),
                timestamp,
                action: action.clone(),
            },
        ));
        Ok(())
    }
}
