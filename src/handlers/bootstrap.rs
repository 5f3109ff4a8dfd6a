//! Unauthenticated creation of the very first API key.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::error::AppError;
use crate::models::api_key::{ApiKeyResponse, BootstrapApiKeyRequest};
use crate::state::AppState;

/// Create the initial key while the store is empty.
///
/// # Endpoint
///
/// `POST /api/init-key`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "admin",
///   "owner_id": 1,
///   "days_valid": 30
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The created key, including its `secret`
/// - **Error (403)**: At least one key already exists
/// - **Error (400)**: Invalid request body
pub async fn bootstrap_api_key(
    State(state): State<AppState>,
    payload: Result<Json<BootstrapApiKeyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    let issued = state.keys.bootstrap(request).await?;

    Ok((StatusCode::CREATED, Json(ApiKeyResponse::from(issued))))
}
