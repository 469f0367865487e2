//! Domain Layer
//!
//! Contains the category entity, its store membership rules and write-time validation.

mod category;
mod entity;
mod stores;
mod validation;

pub use category::{
    Audit, AuditAction, AuditEntry, CategoryColor, CategoryIcon, CategoryId, CategoryPatch,
    CategoryRecord, NewCategory, StoreId,
};
pub use entity::{DomainError, DomainResult, Entity};
pub use stores::{subtract_stores, union_stores, StoreChip};
pub use validation::{validate_parent, NameRules, DEFAULT_NAME_MAX_LEN, DEFAULT_NAME_MIN_LEN};
