//! # Storage Traits
//!
//! This module defines the storage abstraction the domain layer talks to.
//! A store behaves as a unit of work: `insert`, `update` and `delete` only
//! queue changes, and `commit` applies the queued changes all-or-nothing.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Account;

/// Raised through `anyhow::Error` when a commit would give two accounts the same number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("account number {0} is already taken")]
pub struct UniqueViolation(pub String);

/// Trait defining the interface for account storage operations
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Retrieve an account with its residents
    async fn get_by_id(&self, id: i64) -> Result<Option<Account>>;

    /// Retrieve an account by its number
    async fn get_by_number(&self, account_number: &str) -> Result<Option<Account>>;

    /// List all accounts with residents, ordered by id
    async fn get_all(&self) -> Result<Vec<Account>>;

    /// Queue a new account. Account and resident ids are assigned by the store.
    async fn insert(&self, account: Account) -> Result<()>;

    /// Queue a replacement of an account's fields and resident set
    async fn update(&self, account: Account) -> Result<()>;

    /// Queue removal of an account together with its residents
    async fn delete(&self, account: Account) -> Result<()>;

    /// Apply queued changes atomically.
    /// Returns true if at least one row was affected.
    async fn commit(&self) -> Result<bool>;

    /// Check whether a committed account other than `exclude_id` holds the number
    async fn exists_by_number(&self, account_number: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Largest value among well-formed account numbers, 0 when there are none
    async fn max_numeric_account_number(&self) -> Result<i64>;
}

/// Trait defining the interface for storage connections
///
/// Each logical operation asks the connection for a fresh repository so
/// that queued changes never leak between concurrent requests.
pub trait Connection: Send + Sync + Clone {
    /// The type of AccountStore this connection creates
    type AccountRepository: AccountStore;

    /// Create a new account repository for this connection
    fn create_account_repository(&self) -> Self::AccountRepository;
}

/// Change queued by a repository until commit.
#[derive(Debug, Clone)]
pub(crate) enum PendingChange {
    Insert(Account),
    Update(Account),
    Delete(i64),
}
