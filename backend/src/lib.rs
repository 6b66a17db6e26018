//! # Personal Accounts Backend
//!
//! Manages utility billing accounts and their residents.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, DTO mappers)
//!     ↓
//! Domain Layer (validation, number allocation, queries, service)
//!     ↓
//! Storage Layer (SQLite, in-memory)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::AppConfig;
use crate::domain::AccountService;
use crate::storage::{Connection, DbConnection};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState<C: Connection = DbConnection> {
    pub account_service: AccountService<C>,
}

impl<C: Connection> AppState<C> {
    pub fn new(account_service: AccountService<C>) -> Self {
        Self { account_service }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!(url = %config.database_url, "Setting up database");
    let db_conn = DbConnection::new(&config.database_url, config.max_connections).await?;

    info!("Setting up domain model");
    let account_service =
        AccountService::new(Arc::new(db_conn)).with_allocation_attempts(config.allocation_attempts);

    Ok(AppState::new(account_service))
}

/// Create the Axum router with all routes configured
pub fn create_router<C: Connection + 'static>(app_state: AppState<C>, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/accounts",
            get(io::list_accounts::<C>).post(io::create_account::<C>),
        )
        .route("/accounts/filter", get(io::filter_accounts::<C>))
        .route(
            "/accounts/:id",
            get(io::get_account::<C>)
                .put(io::update_account::<C>)
                .delete(io::delete_account::<C>),
        );

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}
