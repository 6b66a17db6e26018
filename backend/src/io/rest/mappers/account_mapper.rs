//! Conversions between the `shared` account DTOs and domain models.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use shared::{
    Account as SharedAccount, AccountFilterRequest, AccountListResponse, AccountResponse,
    CreateAccountRequest, Resident as SharedResident, ResidentRequest, UpdateAccountRequest,
};

use crate::domain::account_query::{AccountFilter, AccountQuery, SortKey};
use crate::domain::models::{Account as DomainAccount, AccountUpdate, NewAccount, NewResident, Resident as DomainResident};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Mapper to convert between shared account DTOs and domain models.
pub struct AccountMapper;

impl AccountMapper {
    /// Converts a domain Account to a shared Account DTO.
    pub fn to_dto(domain: DomainAccount) -> SharedAccount {
        SharedAccount {
            id: domain.id,
            account_number: domain.account_number,
            start_date: format_date(domain.start_date),
            end_date: domain.end_date.map(format_date),
            address: domain.address,
            area: domain.area,
            residents: domain.residents.into_iter().map(Self::resident_to_dto).collect(),
        }
    }

    pub fn resident_to_dto(domain: DomainResident) -> SharedResident {
        SharedResident {
            id: domain.id,
            account_id: domain.account_id,
            last_name: domain.last_name,
            first_name: domain.first_name,
            middle_name: domain.middle_name,
            birth_date: format_date(domain.birth_date),
            is_main_resident: domain.is_main_resident,
        }
    }

    pub fn to_account_list_dto(domain_accounts: Vec<DomainAccount>) -> AccountListResponse {
        AccountListResponse {
            accounts: domain_accounts.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_account_response_dto(domain: DomainAccount, message: &str) -> AccountResponse {
        AccountResponse {
            account: Self::to_dto(domain),
            success_message: message.to_string(),
        }
    }

    /// Converts a create request to the domain input. A blank account number means "allocate one".
    pub fn to_new_account(request: CreateAccountRequest) -> Result<NewAccount> {
        Ok(NewAccount {
            account_number: request
                .account_number
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            start_date: parse_date(&request.start_date, "start_date")?,
            end_date: parse_optional_date(request.end_date.as_deref(), "end_date")?,
            address: request.address,
            area: request.area,
            residents: Self::to_new_residents(request.residents)?,
        })
    }

    pub fn to_account_update(id: i64, request: UpdateAccountRequest) -> Result<AccountUpdate> {
        Ok(AccountUpdate {
            id,
            account_number: request.account_number.trim().to_string(),
            start_date: parse_date(&request.start_date, "start_date")?,
            end_date: parse_optional_date(request.end_date.as_deref(), "end_date")?,
            address: request.address,
            area: request.area,
            residents: Self::to_new_residents(request.residents)?,
        })
    }

    /// Converts filter query parameters. Empty strings count as absent.
    pub fn to_account_query(request: AccountFilterRequest) -> Result<AccountQuery> {
        let filter = AccountFilter {
            search_term: non_blank(request.search),
            has_residents: request.has_residents,
            active_date: parse_optional_date(request.active_date.as_deref(), "active_date")?,
            account_number: non_blank(request.account_number),
            address: non_blank(request.address),
            resident_name: non_blank(request.resident_name),
        };

        let sort_by = non_blank(request.sort_by).map(|key| SortKey::parse_or_default(Some(&key)));

        Ok(AccountQuery {
            filter,
            sort_by,
            descending: request.sort_descending,
        })
    }

    fn to_new_residents(residents: Vec<ResidentRequest>) -> Result<Vec<NewResident>> {
        residents
            .into_iter()
            .map(|r| -> Result<NewResident> {
                Ok(NewResident {
                    birth_date: parse_date(&r.birth_date, "birth_date")?,
                    last_name: r.last_name,
                    first_name: r.first_name,
                    middle_name: r.middle_name,
                    is_main_resident: r.is_main_resident,
                })
            })
            .collect()
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid {}: expected YYYY-MM-DD, got {:?}", field, value))
}

fn parse_optional_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_date(v, field).map(Some),
        None => Ok(None),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateAccountRequest {
        CreateAccountRequest {
            account_number: Some("  ".to_string()),
            start_date: "2020-01-01".to_string(),
            end_date: Some("".to_string()),
            address: "1 Main St".to_string(),
            area: 20.0,
            residents: vec![ResidentRequest {
                last_name: "Doe".to_string(),
                first_name: "Jane".to_string(),
                middle_name: String::new(),
                birth_date: "1990-02-03".to_string(),
                is_main_resident: true,
            }],
        }
    }

    #[test]
    fn test_blank_number_and_end_date_become_absent() {
        let account = AccountMapper::to_new_account(create_request()).unwrap();
        assert_eq!(account.account_number, None);
        assert_eq!(account.end_date, None);
        assert_eq!(account.residents[0].birth_date, NaiveDate::from_ymd_opt(1990, 2, 3).unwrap());
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let mut request = create_request();
        request.start_date = "01/01/2020".to_string();
        let err = AccountMapper::to_new_account(request).unwrap_err();
        assert!(err.to_string().contains("start_date"));
    }

    #[test]
    fn test_to_dto_formats_dates() {
        let mut domain = AccountMapper::to_new_account(create_request())
            .unwrap()
            .to_account("0000000001".to_string());
        domain.id = 7;
        domain.end_date = NaiveDate::from_ymd_opt(2021, 5, 9);

        let dto = AccountMapper::to_dto(domain);
        assert_eq!(dto.id, 7);
        assert_eq!(dto.start_date, "2020-01-01");
        assert_eq!(dto.end_date.as_deref(), Some("2021-05-09"));
        assert_eq!(dto.residents[0].birth_date, "1990-02-03");
    }

    #[test]
    fn test_filter_request_to_query() {
        let query = AccountMapper::to_account_query(AccountFilterRequest {
            search: Some("".to_string()),
            has_residents: Some(false),
            active_date: Some("2020-06-01".to_string()),
            sort_by: Some("whatever".to_string()),
            sort_descending: true,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(query.filter.search_term, None);
        assert_eq!(query.filter.has_residents, Some(false));
        assert_eq!(query.filter.active_date, NaiveDate::from_ymd_opt(2020, 6, 1));
        assert_eq!(query.sort_by, Some(SortKey::Id));
        assert!(query.descending);

        let unsorted = AccountMapper::to_account_query(AccountFilterRequest::default()).unwrap();
        assert_eq!(unsorted.sort_by, None);
    }
}
