//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.
//! All entities must have a unique ID and be thread-safe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::category::{CategoryId, StoreId};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + std::hash::Hash + std::fmt::Display + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DomainError {
    #[error("Not found: category {0}")]
    NotFound(CategoryId),

    #[error("Invalid parent {parent_id} for category {id}: {reason}")]
    InvalidParent {
        id: CategoryId,
        parent_id: CategoryId,
        reason: String,
    },

    #[error("Cycle detected at category {0}")]
    CycleDetected(CategoryId),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Category {id} was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        id: CategoryId,
        expected: u64,
        actual: u64,
    },

    #[error("Unknown store: {0}")]
    InvalidReference(StoreId),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl DomainError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Errors caused by the caller's input, as opposed to storage or concurrency faults
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::NotFound(_)
                | DomainError::InvalidParent { .. }
                | DomainError::CycleDetected(_)
                | DomainError::Validation { .. }
                | DomainError::InvalidReference(_)
                | DomainError::Conflict(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let id = CategoryId::new();
        assert_eq!(
            DomainError::NotFound(id).to_string(),
            format!("Not found: category {}", id)
        );
        assert_eq!(
            DomainError::validation("name", "too short").to_string(),
            "Invalid name: too short"
        );
        assert_eq!(
            DomainError::InvalidReference(StoreId::new("s-9")).to_string(),
            "Unknown store: s-9"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(DomainError::CycleDetected(CategoryId::new()).is_client_error());
        assert!(!DomainError::Repository("disk full".to_string()).is_client_error());
        assert!(!DomainError::ConcurrentModification {
            id: CategoryId::new(),
            expected: 1,
            actual: 2,
        }
        .is_client_error());
    }
}
