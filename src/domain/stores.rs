//! Category-Store Membership
//!
//! Set algebra over a category's store ids. Membership, not ownership: stores live in
//! the external store directory.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::category::StoreId;

/// Union `ids` into `stores`, returning the ids that were not already members
pub fn union_stores(stores: &mut BTreeSet<StoreId>, ids: &[StoreId]) -> Vec<StoreId> {
    ids.iter()
        .filter(|id| stores.insert((*id).clone()))
        .cloned()
        .collect()
}

/// Remove `ids` from `stores`, returning the ids that were actually members
pub fn subtract_stores(stores: &mut BTreeSet<StoreId>, ids: &[StoreId]) -> Vec<StoreId> {
    ids.iter().filter(|id| stores.remove(*id)).cloned().collect()
}

/// Store reference rendered for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreChip {
    pub id: StoreId,
    /// Directory display name, or the raw id when the directory has none
    pub label: String,
}
