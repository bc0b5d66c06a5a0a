//! Linked-account store implementations.
//!
//! The [`actionkit_core::LinkedAccountStore`] trait is defined in core;
//! this crate provides the in-memory implementation used by tests and the
//! SQLite implementation used by applications.

pub mod error;
pub mod memory;
pub mod sql_store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryLinkedAccountStore;
pub use sql_store::SqlLinkedAccountStore;
