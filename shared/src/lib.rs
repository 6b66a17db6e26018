use serde::{Deserialize, Serialize};

/// Personal account as returned to API clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    /// Ten ASCII digits, unique across stored accounts
    pub account_number: String,
    /// Date the account became active (YYYY-MM-DD)
    pub start_date: String,
    /// Date the account was closed (YYYY-MM-DD), if any
    pub end_date: Option<String>,
    pub address: String,
    /// Floor area of the premises
    pub area: f64,
    pub residents: Vec<Resident>,
}

/// A person registered on an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub id: i64,
    pub account_id: i64,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    /// Birth date (YYYY-MM-DD)
    pub birth_date: String,
    pub is_main_resident: bool,
}

/// Resident data supplied when creating or updating an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidentRequest {
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    /// Birth date (YYYY-MM-DD)
    pub birth_date: String,
    #[serde(default)]
    pub is_main_resident: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    /// Explicit account number; a fresh one is allocated when omitted
    #[serde(default)]
    pub account_number: Option<String>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub address: String,
    pub area: f64,
    #[serde(default)]
    pub residents: Vec<ResidentRequest>,
}

/// Full replacement of an account's fields, residents included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAccountRequest {
    pub account_number: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub address: String,
    pub area: f64,
    #[serde(default)]
    pub residents: Vec<ResidentRequest>,
}

/// Query string accepted by the account filter endpoint.
///
/// Every criterion is optional; supplied criteria are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountFilterRequest {
    /// Free text matched against number, address and resident names
    pub search: Option<String>,
    pub has_residents: Option<bool>,
    /// Keeps accounts active on this date (YYYY-MM-DD)
    pub active_date: Option<String>,
    pub account_number: Option<String>,
    pub address: Option<String>,
    pub resident_name: Option<String>,
    /// One of accountnumber, startdate, address, area; anything else sorts by id
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_descending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account: Account,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountListResponse {
    pub accounts: Vec<Account>,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error code, e.g. `duplicate_account_number`
    pub code: String,
    pub message: String,
}
