//! # REST API for Account Management
//!
//! Endpoints for creating, retrieving, filtering, updating, and deleting accounts.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::{AccountFilterRequest, CreateAccountRequest, ErrorResponse, UpdateAccountRequest};
use tracing::{error, info, warn};

use crate::domain::AccountError;
use crate::io::rest::mappers::AccountMapper;
use crate::storage::Connection;
use crate::AppState;

/// List all accounts
pub async fn list_accounts<C: Connection + 'static>(State(state): State<AppState<C>>) -> impl IntoResponse {
    info!("GET /api/accounts");

    match state.account_service.list_accounts().await {
        Ok(accounts) => (StatusCode::OK, Json(AccountMapper::to_account_list_dto(accounts))).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Filter and optionally sort accounts
pub async fn filter_accounts<C: Connection + 'static>(
    State(state): State<AppState<C>>,
    Query(request): Query<AccountFilterRequest>,
) -> impl IntoResponse {
    info!("GET /api/accounts/filter - query: {:?}", request);

    let query = match AccountMapper::to_account_query(request) {
        Ok(query) => query,
        Err(e) => return bad_request(e),
    };

    match state.account_service.query_accounts(&query).await {
        Ok(accounts) => (StatusCode::OK, Json(AccountMapper::to_account_list_dto(accounts))).into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Get an account by ID
pub async fn get_account<C: Connection + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /api/accounts/{}", id);

    match state.account_service.get_account(id).await {
        Ok(Some(account)) => (StatusCode::OK, Json(AccountMapper::to_dto(account))).into_response(),
        Ok(None) => domain_error_response(AccountError::AccountNotFound(id)),
        Err(e) => domain_error_response(e),
    }
}

/// Create a new account
pub async fn create_account<C: Connection + 'static>(
    State(state): State<AppState<C>>,
    Json(request): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    info!("POST /api/accounts - request: {:?}", request);

    let new_account = match AccountMapper::to_new_account(request) {
        Ok(account) => account,
        Err(e) => return bad_request(e),
    };

    match state.account_service.create_account(new_account).await {
        Ok(account) => (
            StatusCode::CREATED,
            Json(AccountMapper::to_account_response_dto(account, "Account created successfully")),
        )
            .into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Update an account
pub async fn update_account<C: Connection + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAccountRequest>,
) -> impl IntoResponse {
    info!("PUT /api/accounts/{} - request: {:?}", id, request);

    let update = match AccountMapper::to_account_update(id, request) {
        Ok(update) => update,
        Err(e) => return bad_request(e),
    };

    match state.account_service.update_account(update).await {
        Ok(account) => (
            StatusCode::OK,
            Json(AccountMapper::to_account_response_dto(account, "Account updated successfully")),
        )
            .into_response(),
        Err(e) => domain_error_response(e),
    }
}

/// Delete an account. Unknown ids succeed as well.
pub async fn delete_account<C: Connection + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    info!("DELETE /api/accounts/{}", id);

    match state.account_service.delete_account(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => domain_error_response(e),
    }
}

fn bad_request(err: anyhow::Error) -> Response {
    warn!("Rejected malformed request: {:#}", err);
    let body = ErrorResponse {
        code: "invalid_request".to_string(),
        message: format!("{:#}", err),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn domain_error_response(err: AccountError) -> Response {
    let status = match &err {
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        AccountError::DuplicateAccountNumber(_) => StatusCode::CONFLICT,
        AccountError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match &err {
        AccountError::Storage(e) => {
            error!("Account storage failure: {:?}", e);
            "Error accessing account storage".to_string()
        }
        other => {
            if status.is_server_error() {
                error!("Account operation failed: {}", other);
            } else {
                warn!("Account operation rejected: {}", other);
            }
            other.to_string()
        }
    };

    let body = ErrorResponse {
        code: err.code().to_string(),
        message,
    };
    (status, Json(body)).into_response()
}
