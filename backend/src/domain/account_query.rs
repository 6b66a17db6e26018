//! Filtering and ordering over a collection of accounts.
//!
//! ## Filter criteria
//!
//! Every criterion is optional and supplied criteria combine with AND:
//!
//! - **account_number**: substring match, applied only when the supplied
//!   value is itself a well-formed ten digit number
//! - **address**: case-insensitive substring match
//! - **has_residents**: keep accounts with (true) or without (false) residents
//! - **active_date**: keep accounts whose date range covers the date, ends inclusive
//! - **resident_name**: whitespace-separated tokens; every token must appear in
//!   some resident's last, first or middle name
//! - **search_term**: the whole untokenized term is matched against number and
//!   address, while each token on its own is matched against resident names
//!
//! ## Sorting
//!
//! One key at a time, ascending or descending. Unknown keys order by id.
//! Ties keep their incoming relative order.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::domain::account_number::is_valid_account_number;
use crate::domain::models::Account;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountFilter {
    pub search_term: Option<String>,
    pub has_residents: Option<bool>,
    pub active_date: Option<NaiveDate>,
    pub account_number: Option<String>,
    pub address: Option<String>,
    pub resident_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    AccountNumber,
    StartDate,
    Address,
    Area,
    #[default]
    Id,
}

impl SortKey {
    /// Lenient parse used for query strings: absent or unknown keys fall back to `Id`.
    pub fn parse_or_default(key: Option<&str>) -> Self {
        key.and_then(|k| k.parse().ok()).unwrap_or_default()
    }

    fn compare(self, a: &Account, b: &Account) -> Ordering {
        match self {
            SortKey::AccountNumber => a.account_number.cmp(&b.account_number),
            SortKey::StartDate => a.start_date.cmp(&b.start_date),
            SortKey::Address => a.address.cmp(&b.address),
            SortKey::Area => a.area.total_cmp(&b.area),
            SortKey::Id => a.id.cmp(&b.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accountnumber" => Ok(SortKey::AccountNumber),
            "startdate" => Ok(SortKey::StartDate),
            "address" => Ok(SortKey::Address),
            "area" => Ok(SortKey::Area),
            "id" => Ok(SortKey::Id),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

/// Filter plus optional ordering, applied in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountQuery {
    pub filter: AccountFilter,
    pub sort_by: Option<SortKey>,
    pub descending: bool,
}

pub struct AccountQueryEngine;

impl AccountQueryEngine {
    pub fn filter(accounts: Vec<Account>, filter: &AccountFilter) -> Vec<Account> {
        let matcher = Matcher::new(filter);
        accounts.into_iter().filter(|a| matcher.matches(a)).collect()
    }

    /// Stable sort on a single key.
    pub fn sort(mut accounts: Vec<Account>, key: SortKey, descending: bool) -> Vec<Account> {
        if descending {
            accounts.sort_by(|a, b| key.compare(b, a));
        } else {
            accounts.sort_by(|a, b| key.compare(a, b));
        }
        accounts
    }

    pub fn apply(accounts: Vec<Account>, query: &AccountQuery) -> Vec<Account> {
        let filtered = Self::filter(accounts, &query.filter);
        match query.sort_by {
            Some(key) => Self::sort(filtered, key, query.descending),
            None => filtered,
        }
    }
}

/// Filter criteria normalized once: lowercased, tokenized, empty values dropped.
struct Matcher {
    account_number: Option<String>,
    address: Option<String>,
    has_residents: Option<bool>,
    active_date: Option<NaiveDate>,
    name_tokens: Vec<String>,
    search_whole: Option<String>,
    search_tokens: Vec<String>,
}

impl Matcher {
    fn new(filter: &AccountFilter) -> Self {
        let account_number = filter
            .account_number
            .as_deref()
            .filter(|n| is_valid_account_number(n))
            .map(str::to_lowercase);

        let search_whole = non_empty(filter.search_term.as_deref()).map(str::to_lowercase);
        let search_tokens = search_whole.as_deref().map(tokenize).unwrap_or_default();

        Self {
            account_number,
            address: non_empty(filter.address.as_deref()).map(str::to_lowercase),
            has_residents: filter.has_residents,
            active_date: filter.active_date,
            name_tokens: filter.resident_name.as_deref().map(tokenize).unwrap_or_default(),
            search_whole,
            search_tokens,
        }
    }

    fn matches(&self, account: &Account) -> bool {
        if let Some(number) = &self.account_number {
            if !account.account_number.to_lowercase().contains(number) {
                return false;
            }
        }

        if let Some(address) = &self.address {
            if !account.address.to_lowercase().contains(address) {
                return false;
            }
        }

        if let Some(wanted) = self.has_residents {
            if account.has_residents() != wanted {
                return false;
            }
        }

        if let Some(date) = self.active_date {
            if !account.is_active_on(date) {
                return false;
            }
        }

        if !self
            .name_tokens
            .iter()
            .all(|token| any_resident_name_contains(account, token))
        {
            return false;
        }

        // A whitespace-only term leaves no tokens and filters nothing
        if let Some(whole) = self.search_whole.as_deref() {
            if !self.search_tokens.is_empty() {
                let field_hit = account.account_number.to_lowercase().contains(whole)
                    || account.address.to_lowercase().contains(whole);
                if !field_hit
                    && !self
                        .search_tokens
                        .iter()
                        .all(|token| any_resident_name_contains(account, token))
                {
                    return false;
                }
            }
        }

        true
    }
}

fn any_resident_name_contains(account: &Account, token: &str) -> bool {
    account.residents.iter().any(|r| r.name_contains(token))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Resident;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resident(account_id: i64, last: &str, first: &str, middle: &str) -> Resident {
        Resident {
            id: account_id * 10,
            account_id,
            last_name: last.to_string(),
            first_name: first.to_string(),
            middle_name: middle.to_string(),
            birth_date: date(1990, 5, 17),
            is_main_resident: false,
        }
    }

    fn account(id: i64, number: &str, address: &str, area: f64) -> Account {
        Account {
            id,
            account_number: number.to_string(),
            start_date: date(2020, 1, 1),
            end_date: Some(date(2020, 12, 31)),
            address: address.to_string(),
            area,
            residents: vec![],
        }
    }

    fn sample_accounts() -> Vec<Account> {
        let mut first = account(1, "0000000001", "12 Elm Street", 10.5);
        first.residents = vec![resident(1, "Doe", "Jane", "Marie")];

        let mut second = account(2, "0000000002", "7 Oak Avenue", 3.2);
        second.residents = vec![
            resident(2, "Smith", "John", ""),
            resident(2, "Doe", "Alex", ""),
        ];
        second.start_date = date(2019, 3, 1);
        second.end_date = None;

        let third = account(3, "0000000003", "99 Elm Street", 7.0);

        vec![first, second, third]
    }

    fn ids(accounts: &[Account]) -> Vec<i64> {
        accounts.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_empty_filter_passes_everything_through() {
        let result = AccountQueryEngine::filter(sample_accounts(), &AccountFilter::default());
        assert_eq!(ids(&result), vec![1, 2, 3]);

        let blank = AccountFilter {
            search_term: Some("   ".to_string()),
            resident_name: Some("".to_string()),
            address: Some("".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&AccountQueryEngine::filter(sample_accounts(), &blank)), vec![1, 2, 3]);
    }

    #[test]
    fn test_account_number_filter_requires_full_number() {
        let filter = AccountFilter {
            account_number: Some("0000000002".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&AccountQueryEngine::filter(sample_accounts(), &filter)), vec![2]);

        let partial = AccountFilter {
            account_number: Some("0002".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ids(&AccountQueryEngine::filter(sample_accounts(), &partial)),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_address_filter_is_case_insensitive() {
        let filter = AccountFilter {
            address: Some("ELM".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&AccountQueryEngine::filter(sample_accounts(), &filter)), vec![1, 3]);
    }

    #[test]
    fn test_has_residents_partitions_the_collection() {
        let with = AccountFilter {
            has_residents: Some(true),
            ..Default::default()
        };
        let without = AccountFilter {
            has_residents: Some(false),
            ..Default::default()
        };
        let with_ids = ids(&AccountQueryEngine::filter(sample_accounts(), &with));
        let without_ids = ids(&AccountQueryEngine::filter(sample_accounts(), &without));

        assert_eq!(with_ids, vec![1, 2]);
        assert_eq!(without_ids, vec![3]);
        assert!(with_ids.iter().all(|id| !without_ids.contains(id)));
    }

    #[test]
    fn test_active_date_range_is_inclusive() {
        let accounts = vec![account(1, "0000000001", "A", 1.0)];
        let active_on = |d: NaiveDate| {
            let filter = AccountFilter {
                active_date: Some(d),
                ..Default::default()
            };
            !AccountQueryEngine::filter(accounts.clone(), &filter).is_empty()
        };

        assert!(active_on(date(2020, 1, 1)));
        assert!(active_on(date(2020, 6, 15)));
        assert!(active_on(date(2020, 12, 31)));
        assert!(!active_on(date(2019, 12, 31)));
        assert!(!active_on(date(2021, 1, 1)));
    }

    #[test]
    fn test_open_ended_account_stays_active() {
        let filter = AccountFilter {
            active_date: Some(date(2030, 1, 1)),
            ..Default::default()
        };
        assert_eq!(ids(&AccountQueryEngine::filter(sample_accounts(), &filter)), vec![2]);
    }

    #[test]
    fn test_resident_name_requires_every_token() {
        let filter = AccountFilter {
            resident_name: Some("Jane Doe".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&AccountQueryEngine::filter(sample_accounts(), &filter)), vec![1]);

        // Tokens may be satisfied by different residents of the same account
        let filter = AccountFilter {
            resident_name: Some("john doe".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&AccountQueryEngine::filter(sample_accounts(), &filter)), vec![2]);

        let filter = AccountFilter {
            resident_name: Some("jane smith".to_string()),
            ..Default::default()
        };
        assert!(AccountQueryEngine::filter(sample_accounts(), &filter).is_empty());
    }

    #[test]
    fn test_search_term_matches_fields_or_resident_names() {
        let by_address = AccountFilter {
            search_term: Some("elm street".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ids(&AccountQueryEngine::filter(sample_accounts(), &by_address)),
            vec![1, 3]
        );

        let by_number = AccountFilter {
            search_term: Some("0003".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&AccountQueryEngine::filter(sample_accounts(), &by_number)), vec![3]);

        let by_name = AccountFilter {
            search_term: Some("DOE".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&AccountQueryEngine::filter(sample_accounts(), &by_name)), vec![1, 2]);
    }

    #[test]
    fn test_search_term_fields_use_whole_term_only() {
        // "oak" alone hits the address, but "oak jane" is neither a substring
        // of any field nor fully covered by resident names
        let filter = AccountFilter {
            search_term: Some("oak jane".to_string()),
            ..Default::default()
        };
        assert!(AccountQueryEngine::filter(sample_accounts(), &filter).is_empty());

        let filter = AccountFilter {
            search_term: Some("alex smith".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&AccountQueryEngine::filter(sample_accounts(), &filter)), vec![2]);
    }

    #[test]
    fn test_criteria_combine_with_and() {
        let filter = AccountFilter {
            address: Some("elm".to_string()),
            has_residents: Some(true),
            ..Default::default()
        };
        assert_eq!(ids(&AccountQueryEngine::filter(sample_accounts(), &filter)), vec![1]);
    }

    #[test]
    fn test_sort_by_area() {
        let ascending = AccountQueryEngine::sort(sample_accounts(), SortKey::Area, false);
        let areas: Vec<f64> = ascending.iter().map(|a| a.area).collect();
        assert_eq!(areas, vec![3.2, 7.0, 10.5]);

        let descending = AccountQueryEngine::sort(sample_accounts(), SortKey::Area, true);
        let areas: Vec<f64> = descending.iter().map(|a| a.area).collect();
        assert_eq!(areas, vec![10.5, 7.0, 3.2]);
    }

    #[test]
    fn test_sort_by_other_keys() {
        let by_address = AccountQueryEngine::sort(sample_accounts(), SortKey::Address, false);
        assert_eq!(ids(&by_address), vec![1, 2, 3]);

        let by_start = AccountQueryEngine::sort(sample_accounts(), SortKey::StartDate, false);
        assert_eq!(ids(&by_start)[0], 2);

        let by_number = AccountQueryEngine::sort(sample_accounts(), SortKey::AccountNumber, true);
        assert_eq!(ids(&by_number), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let accounts = vec![
            account(5, "0000000005", "B", 1.0),
            account(2, "0000000002", "A", 1.0),
            account(9, "0000000009", "C", 1.0),
        ];
        assert_eq!(
            ids(&AccountQueryEngine::sort(accounts.clone(), SortKey::Area, false)),
            vec![5, 2, 9]
        );
        assert_eq!(
            ids(&AccountQueryEngine::sort(accounts, SortKey::Area, true)),
            vec![5, 2, 9]
        );
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("AccountNumber".parse::<SortKey>(), Ok(SortKey::AccountNumber));
        assert_eq!("STARTDATE".parse::<SortKey>(), Ok(SortKey::StartDate));
        assert_eq!("area".parse::<SortKey>(), Ok(SortKey::Area));
        assert!("residents".parse::<SortKey>().is_err());

        assert_eq!(SortKey::parse_or_default(Some("bogus")), SortKey::Id);
        assert_eq!(SortKey::parse_or_default(None), SortKey::Id);
    }

    #[test]
    fn test_unknown_key_falls_back_to_id() {
        let mut accounts = sample_accounts();
        accounts.reverse();
        let key = SortKey::parse_or_default(Some("nonsense"));

        assert_eq!(ids(&AccountQueryEngine::sort(accounts.clone(), key, false)), vec![1, 2, 3]);
        assert_eq!(ids(&AccountQueryEngine::sort(accounts, key, true)), vec![3, 2, 1]);
    }

    #[test]
    fn test_apply_sorts_the_filtered_set() {
        let query = AccountQuery {
            filter: AccountFilter {
                address: Some("elm".to_string()),
                ..Default::default()
            },
            sort_by: Some(SortKey::Area),
            descending: false,
        };
        assert_eq!(ids(&AccountQueryEngine::apply(sample_accounts(), &query)), vec![3, 1]);
    }
}
