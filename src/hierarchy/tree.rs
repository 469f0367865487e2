//! Tree Builder
//!
//! Builds a rooted forest from the flat collection without recursion.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{CategoryId, CategoryRecord};

use super::index::CategoryIndex;

/// Derived, read-only tree view of a category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub category: CategoryRecord,
    /// 0 for roots
    pub level: usize,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes below this one
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&TreeNode> = self.children.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Build the forest. Children keep collection order.
///
/// Records whose parent is absent or does not resolve become roots. Records caught in a
/// parent cycle are unreachable from any root; each cycle is broken at the first member
/// reached and that member is surfaced as a root too, so every record appears exactly once.
pub fn build_tree(records: &[CategoryRecord]) -> Vec<TreeNode> {
    let index = CategoryIndex::new(records);
    let n = records.len();

    let mut parent_of: Vec<Option<usize>> = vec![None; n];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots = Vec::new();
    for pos in 0..n {
        match index.parent_position(pos) {
            Some(parent) if parent != pos => {
                parent_of[pos] = Some(parent);
                children[parent].push(pos);
            }
            _ => roots.push(pos),
        }
    }

    let mut levels: Vec<Option<usize>> = vec![None; n];
    let mut attached: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut order = Vec::with_capacity(n);

    for &root in &roots {
        walk(root, &children, &mut levels, &mut attached, &mut order);
    }
    for pos in 0..n {
        if levels[pos].is_none() {
            let entry = cycle_entry(pos, &parent_of);
            roots.push(entry);
            walk(entry, &children, &mut levels, &mut attached, &mut order);
        }
    }
    roots.sort_unstable();

    // `order` lists every node before its descendants, so building in reverse
    // always finds the children already assembled
    let mut built: Vec<Option<TreeNode>> = (0..n).map(|_| None).collect();
    for &pos in order.iter().rev() {
        let node_children = attached[pos]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[pos] = Some(TreeNode {
            category: records[pos].clone(),
            level: levels[pos].unwrap_or(0),
            children: node_children,
        });
    }

    roots.into_iter().filter_map(|pos| built[pos].take()).collect()
}

/// Depth-first walk assigning levels and recording which children hang under which node
fn walk(
    start: usize,
    children: &[Vec<usize>],
    levels: &mut [Option<usize>],
    attached: &mut [Vec<usize>],
    order: &mut Vec<usize>,
) {
    levels[start] = Some(0);
    let mut stack = vec![start];
    while let Some(pos) = stack.pop() {
        order.push(pos);
        let next = levels[pos].unwrap_or(0) + 1;
        for &child in &children[pos] {
            if levels[child].is_none() {
                levels[child] = Some(next);
                attached[pos].push(child);
                stack.push(child);
            }
        }
    }
}

/// Climb parents from an unreachable node until a position repeats; that position is on the cycle
fn cycle_entry(start: usize, parent_of: &[Option<usize>]) -> usize {
    let mut seen = HashSet::new();
    let mut current = start;
    while seen.insert(current) {
        match parent_of[current] {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

/// Pre-order rows with depth for indented rendering. Subtrees of collapsed ids are hidden.
pub fn flatten<'a>(
    roots: &'a [TreeNode],
    collapsed: &HashSet<CategoryId>,
) -> Vec<(&'a CategoryRecord, usize)> {
    let mut rows = Vec::new();
    let mut stack: Vec<&TreeNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        rows.push((&node.category, node.level));
        if !collapsed.contains(&node.category.id) {
            stack.extend(node.children.iter().rev());
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(name: &str, parent: Option<CategoryId>) -> CategoryRecord {
        let mut record = CategoryRecord::new(CategoryId::new(), name, "tester");
        record.parent_id = parent;
        record
    }

    fn names(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.category.name.as_str()).collect()
    }

    #[test]
    fn test_three_level_chain() {
        let a = make("A", None);
        let b = make("B", Some(a.id));
        let c = make("C", Some(b.id));
        let tree = build_tree(&[a, b, c]);

        assert_eq!(names(&tree), vec!["A"]);
        assert_eq!(tree[0].level, 0);
        let b_node = &tree[0].children[0];
        assert_eq!(b_node.category.name, "B");
        assert_eq!(b_node.level, 1);
        let c_node = &b_node.children[0];
        assert_eq!(c_node.category.name, "C");
        assert_eq!(c_node.level, 2);
        assert_eq!(tree[0].descendant_count(), 2);
    }

    #[test]
    fn test_children_keep_collection_order() {
        let root = make("Root", None);
        let z = make("Zeta", Some(root.id));
        let a = make("Alpha", Some(root.id));
        let m = make("Mu", Some(root.id));
        let tree = build_tree(&[z, root, a, m]);

        assert_eq!(tree.len(), 1);
        assert_eq!(names(&tree[0].children), vec!["Zeta", "Alpha", "Mu"]);
    }

    #[test]
    fn test_child_listed_before_parent() {
        let a = make("A", None);
        let b = make("B", Some(a.id));
        let c = make("C", Some(b.id));
        let tree = build_tree(&[c, b, a]);

        assert_eq!(names(&tree), vec!["A"]);
        assert_eq!(tree[0].children[0].children[0].level, 2);
    }

    #[test]
    fn test_unresolved_parent_becomes_root() {
        let a = make("A", None);
        let orphan = make("Orphan", Some(CategoryId::new()));
        let kid = make("Kid", Some(orphan.id));
        let tree = build_tree(&[a, orphan, kid]);

        assert_eq!(names(&tree), vec!["A", "Orphan"]);
        assert_eq!(tree[1].level, 0);
        assert_eq!(tree[1].children[0].level, 1);
    }

    #[test]
    fn test_cycle_members_surface_as_roots() {
        let mut x = make("X", None);
        let y = make("Y", Some(x.id));
        x.parent_id = Some(y.id);
        let under = make("Under", Some(y.id));
        let selfish = {
            let mut s = make("Self", None);
            s.parent_id = Some(s.id);
            s
        };
        let tree = build_tree(&[under, x, y, selfish]);

        let total: usize = tree.iter().map(|n| 1 + n.descendant_count()).sum();
        assert_eq!(total, 4);
        assert!(tree.iter().all(|n| n.level == 0));
        assert!(names(&tree).contains(&"Self"));
    }

    #[test]
    fn test_empty_collection() {
        assert!(build_tree(&[]).is_empty());
    }

    #[test]
    fn test_flatten_tree() {
        let r1 = make("1", None);
        let r2 = make("2", None);
        let c3 = make("3", Some(r1.id));
        let c4 = make("4", Some(r1.id));
        let c5 = make("5", Some(c3.id));
        let tree = build_tree(&[r1.clone(), r2, c3.clone(), c4, c5]);

        let rows: Vec<(&str, usize)> = flatten(&tree, &HashSet::new())
            .into_iter()
            .map(|(r, d)| (r.name.as_str(), d))
            .collect();
        // 1 (depth 0), 3 (depth 1), 5 (depth 2), 4 (depth 1), 2 (depth 0)
        assert_eq!(rows, vec![("1", 0), ("3", 1), ("5", 2), ("4", 1), ("2", 0)]);

        let collapsed: HashSet<CategoryId> = [c3.id].into_iter().collect();
        let rows: Vec<&str> = flatten(&tree, &collapsed)
            .into_iter()
            .map(|(r, _)| r.name.as_str())
            .collect();
        assert_eq!(rows, vec!["1", "3", "4", "2"]);
    }
}
