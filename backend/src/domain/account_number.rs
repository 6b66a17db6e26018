//! Account number format rules and allocation of the next free number.
//!
//! Numbers are ten ASCII digits. Allocation reads the current maximum from
//! the store and adds one, so two concurrent creators can compute the same
//! candidate; the store's uniqueness constraint is what settles the race.

use tracing::debug;

use crate::domain::errors::{AccountError, AccountResult};
use crate::storage::AccountStore;

pub const ACCOUNT_NUMBER_LENGTH: usize = 10;

/// Largest value representable with ten digits
pub const MAX_ACCOUNT_NUMBER: i64 = 9_999_999_999;

pub fn is_valid_account_number(number: &str) -> bool {
    number.len() == ACCOUNT_NUMBER_LENGTH && number.bytes().all(|b| b.is_ascii_digit())
}

/// Numeric value of a well-formed number, `None` for anything malformed.
pub fn parse_account_number(number: &str) -> Option<i64> {
    if !is_valid_account_number(number) {
        return None;
    }
    number.parse().ok()
}

pub fn format_account_number(value: i64) -> String {
    format!("{:0width$}", value, width = ACCOUNT_NUMBER_LENGTH)
}

pub struct AccountNumberAllocator;

impl AccountNumberAllocator {
    /// Derive the next number from the store's current maximum.
    pub async fn allocate_next<S>(store: &S) -> AccountResult<String>
    where
        S: AccountStore + ?Sized,
    {
        let max = store.max_numeric_account_number().await?;
        let next = Self::next_after(max)?;
        debug!(current_max = max, next = %next, "Allocated account number candidate");
        Ok(next)
    }

    /// Number following `max`; an empty store reports 0, giving `0000000001`.
    pub fn next_after(max: i64) -> AccountResult<String> {
        let next = max.max(0) + 1;
        if next > MAX_ACCOUNT_NUMBER {
            return Err(AccountError::AccountNumberSpaceExhausted);
        }
        Ok(format_account_number(next))
    }
}
