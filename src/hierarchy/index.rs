//! Snapshot Index
//!
//! Arena view over a flat category slice: records stay where they are and are
//! addressed by position, with an id -> position map built once per operation.

use std::collections::HashMap;

use crate::domain::{CategoryId, CategoryRecord};

pub struct CategoryIndex<'a> {
    records: &'a [CategoryRecord],
    positions: HashMap<CategoryId, usize>,
}

impl<'a> CategoryIndex<'a> {
    /// Duplicate ids resolve to their first occurrence
    pub fn new(records: &'a [CategoryRecord]) -> Self {
        let mut positions = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            positions.entry(record.id).or_insert(pos);
        }
        Self { records, positions }
    }

    pub fn records(&self) -> &'a [CategoryRecord] {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &CategoryId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn position(&self, id: &CategoryId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn get(&self, id: &CategoryId) -> Option<&'a CategoryRecord> {
        self.position(id).map(|pos| &self.records[pos])
    }

    /// Position of the record's parent, if its `parent_id` resolves
    pub fn parent_position(&self, pos: usize) -> Option<usize> {
        self.records[pos]
            .parent_id
            .and_then(|parent_id| self.position(&parent_id))
    }

    /// Children of every position, in collection order. Self-references are kept.
    pub fn child_positions(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.records.len()];
        for pos in 0..self.records.len() {
            if let Some(parent) = self.parent_position(pos) {
                children[parent].push(pos);
            }
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_lookup() {
        let a = CategoryRecord::new(CategoryId::new(), "A", "t");
        let b = CategoryRecord::new(CategoryId::new(), "B", "t").with_parent(a.id);
        let orphan = CategoryRecord::new(CategoryId::new(), "Orphan", "t").with_parent(CategoryId::new());
        let records = vec![a.clone(), b.clone(), orphan];
        let index = CategoryIndex::new(&records);

        assert_eq!(index.len(), 3);
        assert_eq!(index.get(&b.id).map(|r| r.name.as_str()), Some("B"));
        assert_eq!(index.parent_position(1), Some(0));
        assert_eq!(index.parent_position(2), None);
        assert_eq!(index.child_positions(), vec![vec![1], vec![], vec![]]);
    }

    #[test]
    fn test_duplicate_ids_resolve_to_first() {
        let a = CategoryRecord::new(CategoryId::new(), "First", "t");
        let mut dup = a.clone();
        dup.name = "Second".to_string();
        let records = vec![a.clone(), dup];
        let index = CategoryIndex::new(&records);
        assert_eq!(index.get(&a.id).map(|r| r.name.as_str()), Some("First"));
    }
}
