//! Domain model for a personal account.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::resident::{NewResident, Resident};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Store-assigned identifier, 0 until the account has been inserted
    pub id: i64,
    pub account_number: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub address: String,
    pub area: f64,
    pub residents: Vec<Resident>,
}

impl Account {
    pub fn has_residents(&self) -> bool {
        !self.residents.is_empty()
    }

    /// True when the account is open on `date`; both range ends are inclusive.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.map_or(true, |end| end >= date)
    }

    pub fn main_resident_count(&self) -> usize {
        self.residents.iter().filter(|r| r.is_main_resident).count()
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// Explicit number, or `None` to have one allocated
    pub account_number: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub address: String,
    pub area: f64,
    pub residents: Vec<NewResident>,
}

impl NewAccount {
    /// Build the record handed to the store once the number is settled.
    pub fn to_account(&self, account_number: String) -> Account {
        Account {
            id: 0,
            account_number,
            start_date: self.start_date,
            end_date: self.end_date,
            address: self.address.clone(),
            area: self.area,
            residents: self
                .residents
                .iter()
                .cloned()
                .map(|r| r.into_resident(0))
                .collect(),
        }
    }
}

/// Input for replacing an existing account's fields and residents.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    pub id: i64,
    pub account_number: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub address: String,
    pub area: f64,
    pub residents: Vec<NewResident>,
}

impl AccountUpdate {
    pub fn into_account(self) -> Account {
        let id = self.id;
        Account {
            id,
            account_number: self.account_number,
            start_date: self.start_date,
            end_date: self.end_date,
            address: self.address,
            area: self.area,
            residents: self
                .residents
                .into_iter()
                .map(|r| r.into_resident(id))
                .collect(),
        }
    }
}
