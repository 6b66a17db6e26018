//! # REST API Interface Layer
//!
//! Axum handlers for the account endpoints plus the mappers that convert
//! between wire DTOs and domain models. Domain errors are translated to
//! HTTP status codes here:
//!
//! - validation failures and malformed input: 400
//! - unknown account: 404
//! - duplicate account number: 409
//! - exhausted number space and storage failures: 500

pub mod account_apis;
pub mod mappers;

pub use account_apis::*;
