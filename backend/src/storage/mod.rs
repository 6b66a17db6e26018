//! # Storage Module
//!
//! Handles all data persistence for accounts and residents.
//!
//! The domain layer depends only on [`AccountStore`] and [`Connection`];
//! the backends below can be swapped without touching domain logic.
//!
//! ## Backends
//!
//! - **sqlite**: durable storage through SQLx, used by the server
//! - **memory**: process-local storage with identical commit semantics, used in tests

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use sqlite::DbConnection;
pub use traits::{AccountStore, Connection, UniqueViolation};
