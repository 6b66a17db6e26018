//! Domain model for a resident registered on an account.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub id: i64,
    /// Owning account; the resident is removed together with it
    pub account_id: i64,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub birth_date: NaiveDate,
    pub is_main_resident: bool,
}

impl Resident {
    /// Case-insensitive substring match against any of the name parts.
    /// `needle` must already be lowercase.
    pub fn name_contains(&self, needle: &str) -> bool {
        [&self.last_name, &self.first_name, &self.middle_name]
            .iter()
            .any(|part| part.to_lowercase().contains(needle))
    }
}

/// Resident data before the store has assigned identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResident {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub birth_date: NaiveDate,
    pub is_main_resident: bool,
}

impl NewResident {
    /// Attach to an account. Identifiers are placeholders until the store assigns real ones.
    pub fn into_resident(self, account_id: i64) -> Resident {
        Resident {
            id: 0,
            account_id,
            last_name: self.last_name,
            first_name: self.first_name,
            middle_name: self.middle_name,
            birth_date: self.birth_date,
            is_main_resident: self.is_main_resident,
        }
    }
}
