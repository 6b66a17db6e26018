//! In-memory account storage.
//!
//! Mirrors the SQLite store's semantics (commit atomicity, unique account
//! numbers, store-assigned ids, cascading resident removal) without any I/O.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::account_number::parse_account_number;
use crate::domain::models::Account;
use crate::storage::traits::{AccountStore, Connection, PendingChange, UniqueViolation};

#[derive(Debug, Default)]
struct MemoryState {
    accounts: BTreeMap<i64, Account>,
    next_account_id: i64,
    next_resident_id: i64,
}

impl MemoryState {
    fn apply(&mut self, change: PendingChange) -> Result<bool> {
        match change {
            PendingChange::Insert(mut account) => {
                self.ensure_unique(&account.account_number, None)?;
                self.next_account_id += 1;
                account.id = self.next_account_id;
                self.assign_resident_ids(&mut account);
                self.accounts.insert(account.id, account);
                Ok(true)
            }
            PendingChange::Update(mut account) => {
                if !self.accounts.contains_key(&account.id) {
                    return Ok(false);
                }
                self.ensure_unique(&account.account_number, Some(account.id))?;
                self.assign_resident_ids(&mut account);
                self.accounts.insert(account.id, account);
                Ok(true)
            }
            PendingChange::Delete(id) => Ok(self.accounts.remove(&id).is_some()),
        }
    }

    fn ensure_unique(&self, account_number: &str, exclude_id: Option<i64>) -> Result<()> {
        let taken = self
            .accounts
            .values()
            .any(|a| a.account_number == account_number && Some(a.id) != exclude_id);
        if taken {
            return Err(UniqueViolation(account_number.to_string()).into());
        }
        Ok(())
    }

    fn assign_resident_ids(&mut self, account: &mut Account) {
        for resident in &mut account.residents {
            self.next_resident_id += 1;
            resident.id = self.next_resident_id;
            resident.account_id = account.id;
        }
    }
}

/// Shared in-memory database; clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryConnection {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Connection for MemoryConnection {
    type AccountRepository = MemoryAccountRepository;

    fn create_account_repository(&self) -> Self::AccountRepository {
        MemoryAccountRepository {
            state: self.state.clone(),
            pending: Mutex::new(Vec::new()),
        }
    }
}

pub struct MemoryAccountRepository {
    state: Arc<RwLock<MemoryState>>,
    pending: Mutex<Vec<PendingChange>>,
}

#[async_trait]
impl AccountStore for MemoryAccountRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<Account>> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn get_by_number(&self, account_number: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.account_number == account_number)
            .cloned())
    }

    async fn get_all(&self) -> Result<Vec<Account>> {
        Ok(self.state.read().await.accounts.values().cloned().collect())
    }

    async fn insert(&self, account: Account) -> Result<()> {
        self.pending.lock().await.push(PendingChange::Insert(account));
        Ok(())
    }

    async fn update(&self, account: Account) -> Result<()> {
        self.pending.lock().await.push(PendingChange::Update(account));
        Ok(())
    }

    async fn delete(&self, account: Account) -> Result<()> {
        self.pending.lock().await.push(PendingChange::Delete(account.id));
        Ok(())
    }

    async fn commit(&self) -> Result<bool> {
        let changes: Vec<PendingChange> = self.pending.lock().await.drain(..).collect();
        if changes.is_empty() {
            return Ok(false);
        }

        let mut state = self.state.write().await;
        // Work on a copy so a failing change leaves the shared state untouched
        let mut staged = MemoryState {
            accounts: state.accounts.clone(),
            next_account_id: state.next_account_id,
            next_resident_id: state.next_resident_id,
        };

        let mut affected = false;
        for change in changes {
            affected |= staged.apply(change)?;
        }

        *state = staged;
        Ok(affected)
    }

    async fn exists_by_number(&self, account_number: &str, exclude_id: Option<i64>) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .any(|a| a.account_number == account_number && Some(a.id) != exclude_id))
    }

    async fn max_numeric_account_number(&self) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .filter_map(|a| parse_account_number(&a.account_number))
            .max()
            .unwrap_or(0))
    }
}
