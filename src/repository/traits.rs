//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access and the external collaborators.
//! Implementations can use SQLite, in-memory, etc.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AuditAction, CategoryId, CategoryRecord, DomainError, DomainResult, Entity, StoreId};

/// Core repository trait for CRUD operations
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Create a new entity
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Update an existing entity.
    ///
    /// The stored version must equal the entity's version, otherwise the write fails with
    /// `ConcurrentModification`. Returns the entity with its version bumped.
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID, `NotFound` when absent
    async fn delete(&self, id: T::Id) -> DomainResult<()>;
}

/// Category storage collaborator
#[async_trait]
pub trait CategoryRepository: Repository<CategoryRecord> {
    async fn get(&self, id: CategoryId) -> DomainResult<CategoryRecord> {
        self.find_by_id(id).await?.ok_or(DomainError::NotFound(id))
    }
}

#[async_trait]
impl<R> CategoryRepository for R where R: Repository<CategoryRecord> {}

/// External store directory
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    async fn exists(&self, store_id: &StoreId) -> DomainResult<bool>;

    /// Name for store chips; not needed for hierarchy correctness
    async fn display_name(&self, store_id: &StoreId) -> DomainResult<Option<String>>;
}

/// External audit trail
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(
        &self,
        category_id: CategoryId,
        actor: &str,
        action: &AuditAction,
        timestamp: DateTime<Utc>,
    ) -> DomainResult<()>;
}
