//! Write-time validation
//!
//! Checks run against the current snapshot before anything is written.

use crate::hierarchy::{ancestor_ids, descendant_ids, CategoryIndex};

use super::category::{CategoryId, CategoryRecord};
use super::entity::{DomainError, DomainResult};

pub const DEFAULT_NAME_MIN_LEN: usize = 2;
pub const DEFAULT_NAME_MAX_LEN: usize = 50;

/// Length bounds for category names, counted in characters after trimming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRules {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_NAME_MIN_LEN,
            max_len: DEFAULT_NAME_MAX_LEN,
        }
    }
}

impl NameRules {
    /// Returns the trimmed name to store
    pub fn normalize(&self, raw: &str) -> DomainResult<String> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }
        let len = name.chars().count();
        if len < self.min_len || len > self.max_len {
            return Err(DomainError::validation(
                "name",
                format!(
                    "must be between {} and {} characters (got {})",
                    self.min_len, self.max_len, len
                ),
            ));
        }
        Ok(name.to_string())
    }
}

/// Check that `parent` may become the parent of category `id`.
///
/// `id` may be absent from the snapshot (a category about to be created).
pub fn validate_parent(
    records: &[CategoryRecord],
    id: CategoryId,
    parent: Option<CategoryId>,
) -> DomainResult<()> {
    let Some(parent_id) = parent else {
        return Ok(());
    };

    if parent_id == id {
        return Err(DomainError::InvalidParent {
            id,
            parent_id,
            reason: "a category cannot be its own parent".to_string(),
        });
    }

    let index = CategoryIndex::new(records);
    if !index.contains(&parent_id) {
        return Err(DomainError::InvalidParent {
            id,
            parent_id,
            reason: "parent does not exist".to_string(),
        });
    }

    if index.contains(&id) && descendant_ids(records, id)?.contains(&parent_id) {
        return Err(DomainError::CycleDetected(parent_id));
    }

    // The parent's own chain must already be sound
    ancestor_ids(records, parent_id)?;
    Ok(())
}
