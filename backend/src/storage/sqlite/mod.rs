//! # SQLite Storage Module
//!
//! Durable account storage on SQLite through SQLx.
//!
//! ## Components
//!
//! - **connection.rs** - connection pool and schema setup
//! - **account_repository.rs** - unit-of-work repository for accounts and residents
//!
//! Uniqueness of account numbers is enforced by a UNIQUE index, and residents
//! reference their account with `ON DELETE CASCADE`.

pub mod account_repository;
pub mod connection;

pub use account_repository::AccountRepository as SqliteAccountRepository;
pub use connection::DbConnection;
