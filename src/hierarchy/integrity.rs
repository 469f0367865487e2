//! Integrity Checks
//!
//! Read-only scan of a snapshot for structural faults. Nothing is repaired here.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::domain::{CategoryId, CategoryRecord};

use super::index::CategoryIndex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    DuplicateId { id: CategoryId },
    DanglingParent { id: CategoryId, parent_id: CategoryId },
    SelfParent { id: CategoryId },
    /// Members in parent-walk order
    Cycle { members: Vec<CategoryId> },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DuplicateId { id } => write!(f, "duplicate category id {}", id),
            IntegrityIssue::DanglingParent { id, parent_id } => {
                write!(f, "category {} references missing parent {}", id, parent_id)
            }
            IntegrityIssue::SelfParent { id } => write!(f, "category {} is its own parent", id),
            IntegrityIssue::Cycle { members } => {
                let ids: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "parent cycle through {}", ids.join(" -> "))
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

pub fn check_integrity(records: &[CategoryRecord]) -> Vec<IntegrityIssue> {
    let index = CategoryIndex::new(records);
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.id) {
            issues.push(IntegrityIssue::DuplicateId { id: record.id });
        }
        match record.parent_id {
            Some(parent_id) if parent_id == record.id => {
                issues.push(IntegrityIssue::SelfParent { id: record.id });
            }
            Some(parent_id) if !index.contains(&parent_id) => {
                issues.push(IntegrityIssue::DanglingParent {
                    id: record.id,
                    parent_id,
                });
            }
            _ => {}
        }
    }

    let mut marks = vec![Mark::Unvisited; records.len()];
    for start in 0..records.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        let mut path: Vec<usize> = Vec::new();
        let mut current = Some(start);
        while let Some(pos) = current {
            match marks[pos] {
                Mark::Done => break,
                Mark::OnPath => {
                    let from = path.iter().position(|&p| p == pos).unwrap_or(0);
                    issues.push(IntegrityIssue::Cycle {
                        members: path[from..].iter().map(|&p| records[p].id).collect(),
                    });
                    break;
                }
                Mark::Unvisited => {
                    marks[pos] = Mark::OnPath;
                    path.push(pos);
                    // Self-parents are reported above
                    current = index.parent_position(pos).filter(|&parent| parent != pos);
                }
            }
        }
        for pos in path {
            marks[pos] = Mark::Done;
        }
    }

    issues
}
