//! Hierarchy Engine
//!
//! Pure, synchronous views over an immutable snapshot of the flat category collection:
//! - index: id -> position arena over the snapshot
//! - tree: forest construction and flattening
//! - ancestry: breadcrumbs and depth
//! - descendants: transitive children
//! - integrity: structural fault scan

mod ancestry;
mod descendants;
mod index;
mod integrity;
mod tree;

pub use ancestry::{ancestor_ids, breadcrumb, depth};
pub use descendants::{children_of, descendant_ids};
pub use index::CategoryIndex;
pub use integrity::{check_integrity, IntegrityIssue};
pub use tree::{build_tree, flatten, TreeNode};
