//! # Domain Module
//!
//! Contains all business logic for personal accounts and their residents.
//!
//! This module operates independently of any transport or storage technology;
//! it reaches persistence only through the traits in [`crate::storage`].
//!
//! ## Module Organization
//!
//! - **account_validator**: structural checks on dates, address, area and number format
//! - **account_number**: number format rules and allocation of the next free number
//! - **account_query**: free-text search, structured filters and sorting
//! - **account_service**: create, update, delete and read use cases
//! - **models**: accounts and residents
//! - **errors**: the error taxonomy surfaced to callers
//!
//! ## Business Rules
//!
//! - Account numbers are exactly ten ASCII digits and unique among stored accounts
//! - An end date, when present, lies strictly after the start date
//! - The address is non-empty and the area is positive
//! - Residents live and die with their account

pub mod account_number;
pub mod account_query;
pub mod account_service;
pub mod account_validator;
pub mod errors;
pub mod models;

pub use account_number::AccountNumberAllocator;
pub use account_query::{AccountFilter, AccountQuery, AccountQueryEngine, SortKey};
pub use account_service::AccountService;
pub use account_validator::AccountValidator;
pub use errors::{AccountError, AccountResult};
