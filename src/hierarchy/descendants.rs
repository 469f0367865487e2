//! Descendant Resolver
//!
//! Transitive children of a category, collected with an explicit stack.

use std::collections::HashSet;

use crate::domain::{CategoryId, CategoryRecord, DomainError, DomainResult};

use super::index::CategoryIndex;

/// Every category nested under `id`, excluding `id` itself
pub fn descendant_ids(records: &[CategoryRecord], id: CategoryId) -> DomainResult<HashSet<CategoryId>> {
    let index = CategoryIndex::new(records);
    let start = index.position(&id).ok_or(DomainError::NotFound(id))?;
    let children = index.child_positions();

    let mut visited = vec![false; records.len()];
    visited[start] = true;
    let mut result = HashSet::new();
    let mut to_visit = vec![start];

    while let Some(current) = to_visit.pop() {
        for &child in &children[current] {
            // A duplicate of `id` parented under the first occurrence is not a descendant
            if records[child].id == id {
                continue;
            }
            if visited[child] {
                return Err(DomainError::CycleDetected(records[child].id));
            }
            visited[child] = true;
            result.insert(records[child].id);
            to_visit.push(child);
        }
    }

    Ok(result)
}

/// Direct children in collection order. `None` lists the roots, including records
/// whose parent does not resolve.
pub fn children_of(records: &[CategoryRecord], parent: Option<CategoryId>) -> Vec<&CategoryRecord> {
    let index = CategoryIndex::new(records);
    match parent {
        Some(parent_id) => records
            .iter()
            .filter(|r| r.parent_id == Some(parent_id))
            .collect(),
        None => records
            .iter()
            .filter(|r| r.parent_id.map_or(true, |pid| !index.contains(&pid)))
            .collect(),
    }
}
