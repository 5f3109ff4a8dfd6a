//! API key authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the secret from the `key` query parameter or the Authorization header
//! 2. Validate it (known, active, not expired)
//! 3. Inject the typed authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401

use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, Uri, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<AuthContext>` to learn who is calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// ID of the API key that authenticated this request
    pub api_key_id: Uuid,

    /// Principal the key belongs to. Every key operation is scoped to it.
    pub owner_id: i64,
}

#[derive(Debug, Deserialize)]
struct SecretQuery {
    key: Option<String>,
}

/// Pull the presented secret out of a request.
///
/// The `key` query parameter wins; the `Authorization: Bearer <secret>`
/// header is only consulted when the parameter is absent or empty. The
/// scheme name is matched case-insensitively.
pub fn extract_secret(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    let from_query = Query::<SecretQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(q)| q.key)
        .filter(|key| !key.is_empty());

    if from_query.is_some() {
        return from_query;
    }

    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, secret) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let secret = secret.trim();
    (!secret.is_empty()).then(|| secret.to_string())
}

/// API key authentication middleware function.
///
/// # Flow
///
/// 1. Extract the secret (query parameter first, then bearer header)
/// 2. Hash it and look the key up
/// 3. Reject unknown, disabled and expired keys
/// 4. If valid: inject `AuthContext` into request, call next handler
///
/// # Returns
///
/// - `Ok(Response)` if authenticated successfully (calls next handler)
/// - `Err(AppError::Unauthorized)` if authentication fails (returns 401)
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let secret = extract_secret(request.uri(), request.headers()).ok_or_else(|| {
        tracing::debug!("request without API key");
        AppError::Unauthorized
    })?;

    let key = state.keys.validate(&secret).await?;

    request.extensions_mut().insert(AuthContext {
        api_key_id: key.id,
        owner_id: key.owner_id,
    });

    Ok(next.run(request).await)
}
