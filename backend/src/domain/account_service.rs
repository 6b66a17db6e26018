//! Account service domain logic.
//!
//! The single entry point the API layer uses for personal accounts. Each
//! operation takes a fresh repository from the connection, so queued store
//! changes belong to exactly one operation and are committed at most once.
//!
//! ## Business Rules
//!
//! - Every failure is raised before the commit, so nothing is half-written
//! - Account numbers are unique among stored accounts; an update may keep its own number
//! - Allocated numbers that lose a race at commit time are re-allocated and retried
//! - Explicitly supplied numbers are never retried
//! - Deleting an unknown id is a no-op

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::account_number::{is_valid_account_number, AccountNumberAllocator};
use crate::domain::account_query::{AccountFilter, AccountQuery, AccountQueryEngine, SortKey};
use crate::domain::account_validator::AccountValidator;
use crate::domain::errors::{AccountError, AccountResult};
use crate::domain::models::{Account, AccountUpdate, NewAccount};
use crate::storage::{AccountStore, Connection, UniqueViolation};

pub const DEFAULT_ALLOCATION_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct AccountService<C: Connection> {
    connection: Arc<C>,
    allocation_attempts: u32,
}

impl<C: Connection> AccountService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            connection,
            allocation_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
        }
    }

    /// How many times an allocated number may be retried after losing a race.
    pub fn with_allocation_attempts(mut self, attempts: u32) -> Self {
        self.allocation_attempts = attempts.max(1);
        self
    }

    pub async fn get_account(&self, id: i64) -> AccountResult<Option<Account>> {
        let store = self.connection.create_account_repository();
        Ok(store.get_by_id(id).await?)
    }

    pub async fn list_accounts(&self) -> AccountResult<Vec<Account>> {
        let store = self.connection.create_account_repository();
        Ok(store.get_all().await?)
    }

    pub async fn filter_accounts(&self, filter: &AccountFilter) -> AccountResult<Vec<Account>> {
        let accounts = self.list_accounts().await?;
        Ok(AccountQueryEngine::filter(accounts, filter))
    }

    pub async fn sort_accounts(&self, key: SortKey, descending: bool) -> AccountResult<Vec<Account>> {
        let accounts = self.list_accounts().await?;
        Ok(AccountQueryEngine::sort(accounts, key, descending))
    }

    /// Filter, then sort what survived the filter.
    pub async fn query_accounts(&self, query: &AccountQuery) -> AccountResult<Vec<Account>> {
        let accounts = self.list_accounts().await?;
        let result = AccountQueryEngine::apply(accounts, query);
        info!(matched = result.len(), "Account query evaluated");
        Ok(result)
    }

    pub async fn create_account(&self, new_account: NewAccount) -> AccountResult<Account> {
        info!(
            account_number = ?new_account.account_number,
            address = %new_account.address,
            "Creating account"
        );

        AccountValidator::validate_new(&new_account)?;
        warn_on_multiple_main_residents(
            new_account.residents.iter().filter(|r| r.is_main_resident).count(),
            new_account.account_number.as_deref().unwrap_or("<allocated>"),
        );

        let account = match &new_account.account_number {
            Some(number) => self.create_with_number(&new_account, number).await?,
            None => self.create_with_allocated_number(&new_account).await?,
        };

        info!(id = account.id, account_number = %account.account_number, "Created account");
        Ok(account)
    }

    pub async fn update_account(&self, update: AccountUpdate) -> AccountResult<Account> {
        info!(id = update.id, account_number = %update.account_number, "Updating account");

        let store = self.connection.create_account_repository();
        if store.get_by_id(update.id).await?.is_none() {
            return Err(AccountError::AccountNotFound(update.id));
        }

        if !is_valid_account_number(&update.account_number) {
            return Err(AccountError::InvalidAccountNumberFormat(update.account_number));
        }

        if store
            .exists_by_number(&update.account_number, Some(update.id))
            .await?
        {
            return Err(AccountError::DuplicateAccountNumber(update.account_number));
        }

        let account = update.into_account();
        AccountValidator::validate(&account)?;
        warn_on_multiple_main_residents(account.main_resident_count(), &account.account_number);

        let id = account.id;
        let number = account.account_number.clone();
        store.update(account).await?;
        if !store.commit().await.map_err(|e| unique_violation_as_duplicate(e, &number))? {
            // Removed between the existence check and the commit
            return Err(AccountError::AccountNotFound(id));
        }

        let stored = store
            .get_by_id(id)
            .await?
            .ok_or(AccountError::AccountNotFound(id))?;

        info!(id, account_number = %number, "Updated account");
        Ok(stored)
    }

    pub async fn delete_account(&self, id: i64) -> AccountResult<()> {
        info!(id, "Deleting account");

        let store = self.connection.create_account_repository();
        let Some(account) = store.get_by_id(id).await? else {
            info!(id, "Account not found, nothing to delete");
            return Ok(());
        };

        let number = account.account_number.clone();
        store.delete(account).await?;
        store.commit().await?;

        info!(id, account_number = %number, "Deleted account");
        Ok(())
    }

    async fn create_with_number(&self, new_account: &NewAccount, number: &str) -> AccountResult<Account> {
        let store = self.connection.create_account_repository();
        if store.exists_by_number(number, None).await? {
            return Err(AccountError::DuplicateAccountNumber(number.to_string()));
        }

        self.insert_and_reload(&store, new_account.to_account(number.to_string()))
            .await
            .map_err(|e| unique_violation_as_duplicate(e, number))
    }

    async fn create_with_allocated_number(&self, new_account: &NewAccount) -> AccountResult<Account> {
        let mut attempt = 1;
        loop {
            let store = self.connection.create_account_repository();
            let number = AccountNumberAllocator::allocate_next(&store).await?;

            match self
                .insert_and_reload(&store, new_account.to_account(number.clone()))
                .await
            {
                Ok(account) => return Ok(account),
                Err(e) if e.downcast_ref::<UniqueViolation>().is_some() => {
                    if attempt >= self.allocation_attempts {
                        warn!(attempt, account_number = %number, "Giving up on account number allocation");
                        return Err(AccountError::DuplicateAccountNumber(number));
                    }
                    warn!(attempt, account_number = %number, "Allocated account number was taken, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn insert_and_reload(&self, store: &C::AccountRepository, account: Account) -> anyhow::Result<Account> {
        let number = account.account_number.clone();
        store.insert(account).await?;
        if !store.commit().await? {
            anyhow::bail!("Insert of account {} affected no rows", number);
        }

        store
            .get_by_number(&number)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Account {} missing after commit", number))
    }
}

fn unique_violation_as_duplicate(err: anyhow::Error, number: &str) -> AccountError {
    if err.downcast_ref::<UniqueViolation>().is_some() {
        AccountError::DuplicateAccountNumber(number.to_string())
    } else {
        AccountError::Storage(err)
    }
}

// More than one main resident is tolerated; it is only reported
fn warn_on_multiple_main_residents(count: usize, account_number: &str) {
    if count > 1 {
        warn!(account_number, main_residents = count, "Account has more than one main resident");
    }
}
