//! Service Layer
//!
//! Validated, audited operations over the repository plus per-category write serialization.

mod category_service;
pub mod locks;


pub use category_service::CategoryService;
pub use locks::KeyedLocks;
