//! Status Toggle Workflow
//!
//! Active/inactive state machine plus the optimistic two-phase protocol used by callers
//! that keep a local read model: apply the tentative state, then commit the confirmed
//! record or roll back to the prior state when the backing write fails.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{AuditAction, CategoryId, CategoryRecord, DomainError, DomainResult};
use crate::hierarchy::{descendant_ids, CategoryIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    Active,
    Inactive,
}

impl CategoryStatus {
    pub fn of(record: &CategoryRecord) -> Self {
        Self::from(record.is_active)
    }

    pub fn toggled(self) -> Self {
        match self {
            CategoryStatus::Active => CategoryStatus::Inactive,
            CategoryStatus::Inactive => CategoryStatus::Active,
        }
    }

    pub fn is_active(self) -> bool {
        self == CategoryStatus::Active
    }

    /// Audit action recorded when entering this state
    pub fn audit_action(self) -> AuditAction {
        match self {
            CategoryStatus::Active => AuditAction::Activated,
            CategoryStatus::Inactive => AuditAction::Deactivated,
        }
    }
}

impl From<bool> for CategoryStatus {
    fn from(is_active: bool) -> Self {
        if is_active {
            CategoryStatus::Active
        } else {
            CategoryStatus::Inactive
        }
    }
}

/// Caller-owned read model of the collection
#[derive(Debug, Clone, Default)]
pub struct LocalView {
    records: Vec<CategoryRecord>,
    positions: HashMap<CategoryId, usize>,
}

impl LocalView {
    pub fn new(records: Vec<CategoryRecord>) -> Self {
        let mut positions = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            positions.entry(record.id).or_insert(pos);
        }
        Self { records, positions }
    }

    pub fn records(&self) -> &[CategoryRecord] {
        &self.records
    }

    pub fn get(&self, id: &CategoryId) -> Option<&CategoryRecord> {
        self.positions.get(id).map(|&pos| &self.records[pos])
    }

    fn get_mut(&mut self, id: &CategoryId) -> DomainResult<&mut CategoryRecord> {
        let pos = *self.positions.get(id).ok_or(DomainError::NotFound(*id))?;
        Ok(&mut self.records[pos])
    }

    /// Replace a record, or append it when the view has not seen it yet
    pub fn upsert(&mut self, record: CategoryRecord) {
        match self.positions.get(&record.id) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.positions.insert(record.id, self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Phase one: flip the local status immediately
    pub fn begin_toggle(&mut self, id: CategoryId) -> DomainResult<PendingToggle> {
        let record = self.get_mut(&id)?;
        let previous = CategoryStatus::of(record);
        let tentative = previous.toggled();
        record.is_active = tentative.is_active();
        Ok(PendingToggle {
            id,
            previous,
            tentative,
        })
    }
}

/// A tentative status change awaiting the backing write
#[must_use = "a pending toggle must be committed or rolled back"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    id: CategoryId,
    previous: CategoryStatus,
    tentative: CategoryStatus,
}

impl PendingToggle {
    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn previous(&self) -> CategoryStatus {
        self.previous
    }

    pub fn tentative(&self) -> CategoryStatus {
        self.tentative
    }

    /// Phase two, success: adopt the record confirmed by the backing store
    pub fn commit(self, view: &mut LocalView, confirmed: CategoryRecord) {
        view.upsert(confirmed);
    }

    /// Phase two, failure: restore the pre-toggle state
    pub fn rollback(self, view: &mut LocalView) {
        if let Ok(record) = view.get_mut(&self.id) {
            record.is_active = self.previous.is_active();
        }
    }

    /// Commit on `Ok`, roll back on `Err`; the write result is passed through
    pub fn resolve(
        self,
        view: &mut LocalView,
        result: DomainResult<CategoryRecord>,
    ) -> DomainResult<CategoryRecord> {
        match result {
            Ok(confirmed) => {
                self.commit(view, confirmed.clone());
                Ok(confirmed)
            }
            Err(e) => {
                log::warn!("Reverting optimistic toggle of category {}: {}", self.id, e);
                self.rollback(view);
                Err(e)
            }
        }
    }
}

/// What toggling a category would touch, for deactivation warnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleImpact {
    pub id: CategoryId,
    pub next_status: CategoryStatus,
    pub descendant_ids: HashSet<CategoryId>,
    /// Descendants that are currently active
    pub active_descendants: usize,
}

pub fn toggle_impact(records: &[CategoryRecord], id: CategoryId) -> DomainResult<ToggleImpact> {
    let index = CategoryIndex::new(records);
    let record = index.get(&id).ok_or(DomainError::NotFound(id))?;
    let descendants = descendant_ids(records, id)?;
    let active_descendants = descendants
        .iter()
        .filter_map(|d| index.get(d))
        .filter(|r| r.is_active)
        .count();

    Ok(ToggleImpact {
        id,
        next_status: CategoryStatus::of(record).toggled(),
        descendant_ids: descendants,
        active_descendants,
    })
}
