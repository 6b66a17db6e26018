//! Error taxonomy for account operations.

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("The start date must be earlier than the end date")]
    InvalidDateRange,
    #[error("Address is required")]
    MissingAddress,
    #[error("The area of the premises must be a positive number")]
    InvalidArea,
    #[error("Account number '{0}' must consist of exactly 10 digits")]
    InvalidAccountNumberFormat(String),
    #[error("Account number {0} already exists")]
    DuplicateAccountNumber(String),
    #[error("The maximum personal account number has been reached")]
    AccountNumberSpaceExhausted,
    #[error("Account not found: {0}")]
    AccountNotFound(i64),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AccountError {
    /// Stable identifier used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::InvalidDateRange => "invalid_date_range",
            AccountError::MissingAddress => "missing_address",
            AccountError::InvalidArea => "invalid_area",
            AccountError::InvalidAccountNumberFormat(_) => "invalid_account_number_format",
            AccountError::DuplicateAccountNumber(_) => "duplicate_account_number",
            AccountError::AccountNumberSpaceExhausted => "account_number_space_exhausted",
            AccountError::AccountNotFound(_) => "account_not_found",
            AccountError::Storage(_) => "storage_failure",
        }
    }

    /// Errors caused by the caller's input rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AccountError::InvalidDateRange
                | AccountError::MissingAddress
                | AccountError::InvalidArea
                | AccountError::InvalidAccountNumberFormat(_)
        )
    }
}

pub type AccountResult<T> = Result<T, AccountError>;
