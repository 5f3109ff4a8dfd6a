//! API key management HTTP handlers.
//!
//! This module implements the authenticated key endpoints:
//! - POST /api/keys - Create a key for the caller
//! - GET /api/keys - List the caller's keys
//! - GET /api/keys/{id} - Get one of the caller's keys
//! - PUT /api/keys/{id} - Update one of the caller's keys
//! - DELETE /api/keys/{id} - Delete one of the caller's keys
//!
//! Every operation is scoped to the owner resolved by the auth middleware.
//! Keys belonging to other owners answer 404, exactly like missing ones.

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::api_key::{ApiKeyResponse, CreateApiKeyRequest, UpdateApiKeyRequest};
use crate::state::AppState;

/// Create a new key owned by the caller.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "svc-a",
///   "days_valid": 30
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The created key, including its `secret`.
///   The secret is never shown again.
/// - **Error (400)**: Empty name or non-positive day count
/// - **Error (401)**: Invalid API key
pub async fn create_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateApiKeyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    let issued = state.keys.create(auth.owner_id, request).await?;
    tracing::debug!(issued_by = %auth.api_key_id, key_id = %issued.key.id, "API key issued");

    Ok((StatusCode::CREATED, Json(ApiKeyResponse::from(issued))))
}

/// List all keys owned by the caller, newest first.
///
/// Secrets are never included.
pub async fn list_api_keys(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ApiKeyResponse>>, AppError> {
    let keys = state.keys.list(auth.owner_id).await?;

    Ok(Json(keys.into_iter().map(Into::into).collect()))
}

/// Get one of the caller's keys.
///
/// # Response
///
/// - **Success (200 OK)**: The key
/// - **Error (404)**: Key not found or not owned by the caller
pub async fn get_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiKeyResponse>, AppError> {
    let Path(id) = id?;

    let key = state.keys.get(auth.owner_id, id).await?;

    Ok(Json(key.into()))
}

/// Update one of the caller's keys.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "renamed",
///   "active": false,
///   "days_valid": 90
/// }
/// ```
///
/// `active` is required. An omitted or empty `name` and an omitted or zero
/// `days_valid` keep the stored values.
///
/// # Response
///
/// - **Success (200 OK)**: The updated key
/// - **Error (400)**: `active` missing or negative `days_valid`
/// - **Error (404)**: Key not found or not owned by the caller
pub async fn update_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateApiKeyRequest>, JsonRejection>,
) -> Result<Json<ApiKeyResponse>, AppError> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let key = state.keys.update(auth.owner_id, id, request).await?;

    Ok(Json(key.into()))
}

/// Permanently delete one of the caller's keys.
///
/// # Response
///
/// - **Success (200 OK)**: `{"message": "API key deleted"}`
/// - **Error (404)**: Key not found, not owned by the caller, or already deleted
pub async fn delete_api_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;

    state.keys.delete(auth.owner_id, id).await?;

    Ok(Json(json!({ "message": "API key deleted" })))
}
