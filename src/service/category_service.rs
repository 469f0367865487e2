//! Category Service
//!
//! Exposed operations over the category collection. Reads take a snapshot from the
//! repository and run the pure hierarchy engine over it; writes validate against the
//! snapshot, go through the repository's version check and forward an audit entry.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::{StoreValidation, ValidationConfig};
use crate::domain::{
    subtract_stores, union_stores, validate_parent, Audit, AuditAction, AuditEntry, CategoryId,
    CategoryPatch, CategoryRecord, DomainError, DomainResult, NewCategory, StoreChip, StoreId,
};
use crate::filter::{self, CategoryFilter};
use crate::hierarchy::{self, build_tree, CategoryIndex, IntegrityIssue, TreeNode};
use crate::repository::{AuditSink, CategoryRepository, StoreDirectory};
use crate::toggle::{self, CategoryStatus, LocalView, ToggleImpact};

use super::locks::KeyedLocks;

pub struct CategoryService<R, S, A> {
    repo: Arc<R>,
    stores: Arc<S>,
    audit: Arc<A>,
    config: ValidationConfig,
    locks: KeyedLocks<CategoryId>,
    /// Held across snapshot and write by every change to the parent links
    structure: Mutex<()>,
}

impl<R, S, A> CategoryService<R, S, A>
where
    R: CategoryRepository,
    S: StoreDirectory,
    A: AuditSink,
{
    pub fn new(repo: Arc<R>, stores: Arc<S>, audit: Arc<A>, config: ValidationConfig) -> Self {
        Self {
            repo,
            stores,
            audit,
            config,
            locks: KeyedLocks::new(),
            structure: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    // ========== Reads ==========

    pub async fn list_categories(&self, filter: &CategoryFilter) -> DomainResult<Vec<CategoryRecord>> {
        let snapshot = self.repo.list().await?;
        Ok(filter::apply(&snapshot, filter))
    }

    /// Forest of the filtered collection. Structural faults in the full collection are
    /// logged; the tree itself degrades instead of failing.
    pub async fn get_tree(&self, filter: &CategoryFilter) -> DomainResult<Vec<TreeNode>> {
        let snapshot = self.repo.list().await?;
        for issue in hierarchy::check_integrity(&snapshot) {
            log::warn!("Category hierarchy issue: {}", issue);
        }

        let visible = filter::apply(&snapshot, filter);
        Ok(build_tree(&visible))
    }

    pub async fn get_category(&self, id: CategoryId) -> DomainResult<CategoryRecord> {
        self.repo.get(id).await
    }

    /// Direct children in collection order; `None` lists the roots
    pub async fn get_children(&self, parent: Option<CategoryId>) -> DomainResult<Vec<CategoryRecord>> {
        let snapshot = self.repo.list().await?;
        if let Some(parent_id) = parent {
            if !CategoryIndex::new(&snapshot).contains(&parent_id) {
                return Err(DomainError::NotFound(parent_id));
            }
        }
        Ok(hierarchy::children_of(&snapshot, parent)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn get_breadcrumb(&self, id: CategoryId) -> DomainResult<Vec<CategoryRecord>> {
        let snapshot = self.repo.list().await?;
        hierarchy::breadcrumb(&snapshot, id)
    }

    pub async fn get_descendant_ids(&self, id: CategoryId) -> DomainResult<HashSet<CategoryId>> {
        let snapshot = self.repo.list().await?;
        hierarchy::descendant_ids(&snapshot, id)
    }

    pub async fn toggle_impact(&self, id: CategoryId) -> DomainResult<ToggleImpact> {
        let snapshot = self.repo.list().await?;
        toggle::toggle_impact(&snapshot, id)
    }

    /// Store references with directory display names, falling back to the raw id
    pub async fn store_chips(&self, id: CategoryId) -> DomainResult<Vec<StoreChip>> {
        let record = self.repo.get(id).await?;
        let mut chips = Vec::with_capacity(record.stores.len());
        for store_id in record.stores {
            let label = self
                .stores
                .display_name(&store_id)
                .await?
                .unwrap_or_else(|| store_id.to_string());
            chips.push(StoreChip { id: store_id, label });
        }
        Ok(chips)
    }

    pub async fn check_integrity(&self) -> DomainResult<Vec<IntegrityIssue>> {
        let snapshot = self.repo.list().await?;
        Ok(hierarchy::check_integrity(&snapshot))
    }

    // ========== Writes ==========

    pub async fn create_category(&self, input: NewCategory) -> DomainResult<CategoryRecord> {
        let name = self.config.name_rules().normalize(&input.name)?;
        let _structure = self.lock_structure(input.parent_id.is_some()).await;
        let snapshot = self.repo.list().await?;

        let id = CategoryId::new();
        validate_parent(&snapshot, id, input.parent_id)?;
        self.validate_stores(&input.stores).await?;

        let now = Utc::now();
        let mut record = CategoryRecord::new(id, name, input.created_by.as_str());
        record.parent_id = input.parent_id;
        record.color = input.color;
        record.icon = input.icon;
        record.stores = input.stores.into_iter().collect();
        record.audit = Audit::new(input.created_by.as_str(), now);
        let entry = record.record_action(&input.created_by, AuditAction::Created, now);

        let saved = self.repo.create(&record).await?;
        log::info!("Created category {} ({})", saved.id, saved.name);
        self.forward_audit(saved.id, &entry).await;
        Ok(saved)
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
        actor: &str,
    ) -> DomainResult<CategoryRecord> {
        let _structure = self.lock_structure(patch.parent_id.is_some()).await;
        let _guard = self.locks.lock(&id).await;
        let snapshot = self.repo.list().await?;
        let current = CategoryIndex::new(&snapshot)
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound(id))?;

        if let Some(expected) = patch.expected_version {
            if expected != current.version() {
                return Err(DomainError::ConcurrentModification {
                    id,
                    expected,
                    actual: current.version(),
                });
            }
        }
        if patch.is_empty() {
            return Ok(current);
        }

        let mut next = current;
        if let Some(name) = &patch.name {
            next.name = self.config.name_rules().normalize(name)?;
        }
        if let Some(parent) = patch.parent_id {
            validate_parent(&snapshot, id, parent)?;
            next.parent_id = parent;
        }
        if let Some(color) = patch.color {
            next.color = color;
        }
        if let Some(icon) = patch.icon {
            next.icon = icon;
        }

        self.write(next, actor, AuditAction::Updated).await
    }

    pub async fn toggle_status(&self, id: CategoryId, actor: &str) -> DomainResult<CategoryRecord> {
        let _guard = self.locks.lock(&id).await;
        let mut next = self.repo.get(id).await?;
        let status = CategoryStatus::of(&next).toggled();
        next.is_active = status.is_active();

        self.write(next, actor, status.audit_action()).await
    }

    /// Flip the status in `view` right away, then commit or roll back once the write settles
    pub async fn toggle_status_optimistic(
        &self,
        view: &mut LocalView,
        id: CategoryId,
        actor: &str,
    ) -> DomainResult<CategoryRecord> {
        let pending = view.begin_toggle(id)?;
        let result = self.toggle_status(id, actor).await;
        pending.resolve(view, result)
    }

    pub async fn add_stores_to_category(
        &self,
        id: CategoryId,
        store_ids: &[StoreId],
        actor: &str,
    ) -> DomainResult<CategoryRecord> {
        let _guard = self.locks.lock(&id).await;
        let mut next = self.repo.get(id).await?;
        self.validate_stores(store_ids).await?;

        let added = union_stores(&mut next.stores, store_ids);
        if added.is_empty() {
            log::debug!("Category {} already has every requested store", id);
            return Ok(next);
        }

        self.write(next, actor, AuditAction::StoresAdded(added)).await
    }

    pub async fn remove_stores_from_category(
        &self,
        id: CategoryId,
        store_ids: &[StoreId],
        actor: &str,
    ) -> DomainResult<CategoryRecord> {
        let _guard = self.locks.lock(&id).await;
        let mut next = self.repo.get(id).await?;

        let removed = subtract_stores(&mut next.stores, store_ids);
        if removed.is_empty() {
            log::debug!("Category {} has none of the stores to remove", id);
            return Ok(next);
        }

        self.write(next, actor, AuditAction::StoresRemoved(removed)).await
    }

    /// Hard delete. Categories that still have descendants are rejected.
    pub async fn delete_category(&self, id: CategoryId) -> DomainResult<()> {
        let _structure = self.lock_structure(true).await;
        let _guard = self.locks.lock(&id).await;
        let snapshot = self.repo.list().await?;

        let descendants = hierarchy::descendant_ids(&snapshot, id)?;
        if !descendants.is_empty() {
            return Err(DomainError::Conflict(format!(
                "Category {} still has {} descendant(s)",
                id,
                descendants.len()
            )));
        }

        self.repo.delete(id).await?;
        log::info!("Deleted category {}", id);
        Ok(())
    }

    // ========== Helpers ==========

    /// Parent-link changes are serialized tree-wide and taken before any per-id lock
    async fn lock_structure(&self, needed: bool) -> Option<MutexGuard<'_, ()>> {
        if needed {
            Some(self.structure.lock().await)
        } else {
            None
        }
    }

    async fn write(
        &self,
        mut next: CategoryRecord,
        actor: &str,
        action: AuditAction,
    ) -> DomainResult<CategoryRecord> {
        let entry = next.record_action(actor, action, Utc::now());
        let saved = self.repo.update(&next).await?;
        log::debug!("Category {} {} by {} (v{})", saved.id, entry.action, actor, saved.version());
        self.forward_audit(saved.id, &entry).await;
        Ok(saved)
    }

    async fn validate_stores(&self, store_ids: &[StoreId]) -> DomainResult<()> {
        if self.config.store_validation == StoreValidation::Lenient {
            return Ok(());
        }
        for store_id in store_ids {
            if !self.stores.exists(store_id).await? {
                return Err(DomainError::InvalidReference(store_id.clone()));
            }
        }
        Ok(())
    }

    async fn forward_audit(&self, id: CategoryId, entry: &AuditEntry) {
        if let Err(e) = self
            .audit
            .record(id, &entry.actor, &entry.action, entry.timestamp)
            .await
        {
            log::warn!("Failed to forward audit entry for category {}: {}", id, e);
        }
    }
}
