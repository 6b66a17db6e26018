//! # IO Module
//!
//! Interface layer between HTTP clients and the domain logic.
//!
//! Translates requests into domain operations and domain results into the
//! DTOs defined in the `shared` crate. No business rules live here.
//!
//! ## Supported Operations
//!
//! - **GET /api/accounts**: list all accounts
//! - **GET /api/accounts/filter**: filter and sort accounts
//! - **GET /api/accounts/:id**: fetch one account
//! - **POST /api/accounts**: create an account, allocating a number when none is given
//! - **PUT /api/accounts/:id**: replace an account's fields and residents
//! - **DELETE /api/accounts/:id**: delete an account and its residents

pub mod rest;

pub use rest::*;
