//! Ancestry Resolver
//!
//! Breadcrumbs and depth, computed by walking `parent_id` upward.

use std::collections::HashSet;

use crate::domain::{CategoryId, CategoryRecord, DomainError, DomainResult};

use super::index::CategoryIndex;

/// Chain `[root, ..., self]`. The walk stops at an absent or unresolved parent.
fn chain<'a>(index: &CategoryIndex<'a>, id: CategoryId) -> DomainResult<Vec<&'a CategoryRecord>> {
    let mut current = index.get(&id).ok_or(DomainError::NotFound(id))?;
    let mut visited = HashSet::from([current.id]);
    let mut chain = vec![current];

    while let Some(parent) = current.parent_id.and_then(|pid| index.get(&pid)) {
        if !visited.insert(parent.id) {
            return Err(DomainError::CycleDetected(parent.id));
        }
        chain.push(parent);
        current = parent;
    }

    chain.reverse();
    Ok(chain)
}

/// Ordered ancestor chain from the root down to the category itself
pub fn breadcrumb(records: &[CategoryRecord], id: CategoryId) -> DomainResult<Vec<CategoryRecord>> {
    let index = CategoryIndex::new(records);
    Ok(chain(&index, id)?.into_iter().cloned().collect())
}

/// Strict ancestors, root first
pub fn ancestor_ids(records: &[CategoryRecord], id: CategoryId) -> DomainResult<Vec<CategoryId>> {
    let index = CategoryIndex::new(records);
    let mut ids: Vec<CategoryId> = chain(&index, id)?.iter().map(|r| r.id).collect();
    ids.pop();
    Ok(ids)
}

/// 0 for roots
pub fn depth(records: &[CategoryRecord], id: CategoryId) -> DomainResult<usize> {
    let index = CategoryIndex::new(records);
    Ok(chain(&index, id)?.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::build_tree;

    fn make(name: &str, parent: Option<CategoryId>) -> CategoryRecord {
        let mut record = CategoryRecord::new(CategoryId::new(), name, "tester");
        record.parent_id = parent;
        record
    }

    #[test]
    fn test_breadcrumb_root_to_self() {
        let a = make("A", None);
        let b = make("B", Some(a.id));
        let c = make("C", Some(b.id));
        let records = vec![c.clone(), a.clone(), b.clone()];

        let crumbs: Vec<String> = breadcrumb(&records, c.id)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(crumbs, vec!["A", "B", "C"]);
        assert_eq!(ancestor_ids(&records, c.id).unwrap(), vec![a.id, b.id]);
        assert_eq!(depth(&records, a.id).unwrap(), 0);
        assert_eq!(depth(&records, c.id).unwrap(), 2);
    }

    #[test]
    fn test_unknown_id_not_found() {
        let records = vec![make("A", None)];
        let missing = CategoryId::new();
        assert_eq!(breadcrumb(&records, missing), Err(DomainError::NotFound(missing)));
    }

    #[test]
    fn test_unresolved_parent_stops_walk() {
        let orphan = make("Orphan", Some(CategoryId::new()));
        let kid = make("Kid", Some(orphan.id));
        let records = vec![orphan, kid.clone()];
        assert_eq!(breadcrumb(&records, kid.id).unwrap().len(), 2);
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut x = make("X", None);
        let y = make("Y", Some(x.id));
        x.parent_id = Some(y.id);
        let records = vec![x.clone(), y];
        assert!(matches!(breadcrumb(&records, x.id), Err(DomainError::CycleDetected(_))));

        let mut selfish = make("Self", None);
        selfish.parent_id = Some(selfish.id);
        let records = vec![selfish.clone()];
        assert_eq!(
            breadcrumb(&records, selfish.id),
            Err(DomainError::CycleDetected(selfish.id))
        );
    }

    #[test]
    fn test_depth_matches_tree_level() {
        let a = make("A", None);
        let b = make("B", Some(a.id));
        let c = make("C", Some(b.id));
        let d = make("D", Some(a.id));
        let e = make("E", None);
        let records = vec![a, b, c, d, e];

        let mut stack: Vec<_> = build_tree(&records).into_iter().collect();
        while let Some(node) = stack.pop() {
            let crumbs = breadcrumb(&records, node.category.id).unwrap();
            assert_eq!(crumbs.len(), node.level + 1);
            assert!(crumbs[0].is_root());
            assert_eq!(crumbs.last().map(|r| r.id), Some(node.category.id));
            stack.extend(node.children);
        }
    }
}
