//! Structural checks applied to an account before it reaches the store.
//!
//! Checks run in a fixed order and stop at the first violation:
//! date range, address, area, then account number format.

use chrono::NaiveDate;

use crate::domain::account_number::is_valid_account_number;
use crate::domain::errors::{AccountError, AccountResult};
use crate::domain::models::{Account, NewAccount};

pub struct AccountValidator;

impl AccountValidator {
    pub fn validate(account: &Account) -> AccountResult<()> {
        Self::check(
            account.start_date,
            account.end_date,
            &account.address,
            account.area,
            Some(&account.account_number),
        )
    }

    /// Validate a creation request. A missing number is fine: it gets allocated later.
    pub fn validate_new(account: &NewAccount) -> AccountResult<()> {
        Self::check(
            account.start_date,
            account.end_date,
            &account.address,
            account.area,
            account.account_number.as_deref(),
        )
    }

    fn check(
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        address: &str,
        area: f64,
        account_number: Option<&str>,
    ) -> AccountResult<()> {
        if let Some(end_date) = end_date {
            if start_date >= end_date {
                return Err(AccountError::InvalidDateRange);
            }
        }

        if address.trim().is_empty() {
            return Err(AccountError::MissingAddress);
        }

        // Written as a negation so NaN is rejected too
        if !(area > 0.0) {
            return Err(AccountError::InvalidArea);
        }

        if let Some(number) = account_number {
            if !is_valid_account_number(number) {
                return Err(AccountError::InvalidAccountNumberFormat(number.to_string()));
            }
        }

        Ok(())
    }
}
