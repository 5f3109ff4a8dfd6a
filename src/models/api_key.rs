//! API key model and its request/response types.
//!
//! Keys are stored with the SHA-256 hash of their secret. The raw secret only
//! exists in memory while a key is being created and in the one response
//! that hands it to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `secret_hash`: SHA-256 hash of the secret, unique across all keys
/// - `name`: Label chosen by the owner
/// - `owner_id`: Principal the key was issued to
/// - `expires_at`: Instant after which the key stops authenticating
/// - `active`: Administrative on/off switch
/// - `created_at` / `updated_at`: Bookkeeping timestamps
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ApiKey {
    pub id: Uuid,

    /// Hex-encoded SHA-256 of the secret (64 characters). Never changes.
    pub secret_hash: String,

    pub name: String,

    pub owner_id: i64,

    pub expires_at: DateTime<Utc>,

    /// Disabled keys are rejected regardless of `expires_at`.
    pub active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ApiKey {
    /// Whether this key authenticates at `now`.
    ///
    /// A key is valid iff it is active and `now` is strictly before its
    /// expiry. There is no grace period.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.expires_at
    }
}

/// Request body for the unauthenticated bootstrap endpoint.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "admin",
///   "owner_id": 1,
///   "days_valid": 30
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct BootstrapApiKeyRequest {
    pub name: String,

    #[serde(alias = "user_id")]
    pub owner_id: i64,

    #[serde(alias = "expires_in_days")]
    pub days_valid: i64,
}

/// Request body for creating a key on behalf of the authenticated owner.
///
/// # Validation
///
/// - `name`: Required, non-empty
/// - `days_valid`: Required, at least 1
#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,

    #[serde(alias = "expires_in_days")]
    pub days_valid: i64,
}

/// Request body for updating a key.
///
/// `name` and `days_valid` are optional; an empty name or a zero day count
/// leaves the stored value unchanged. `active` must always be given so a
/// client cannot disable a key by omitting it.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "renamed",
///   "active": true,
///   "days_valid": 90
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct UpdateApiKeyRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub active: Option<bool>,

    #[serde(default, alias = "expires_in_days")]
    pub days_valid: Option<i64>,
}

/// Response body for key endpoints.
///
/// # Security Note
///
/// The `secret` field is ONLY included when a key is created. It is never
/// returned by list, get or update.
///
/// # JSON Example (Create Response)
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "secret": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
///   "name": "svc-a",
///   "owner_id": 1,
///   "expires_at": "2025-02-14T10:30:00Z",
///   "active": true,
///   "created_at": "2025-01-15T10:30:00Z",
///   "updated_at": "2025-01-15T10:30:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub name: String,
    pub owner_id: i64,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            secret: None, // Never include secret by default
            name: key.name,
            owner_id: key.owner_id,
            expires_at: key.expires_at,
            active: key.active,
            created_at: key.created_at,
            updated_at: key.updated_at,
        }
    }
}

impl ApiKeyResponse {
    /// Create response with secret included (only for creation).
    pub fn with_secret(mut self, secret: String) -> Self {
        self.secret = Some(secret);
        self
    }
}

/// A freshly minted key together with its raw secret.
#[derive(Debug, Clone)]
pub struct IssuedApiKey {
    pub key: ApiKey,
    pub secret: String,
}

impl From<IssuedApiKey> for ApiKeyResponse {
    fn from(issued: IssuedApiKey) -> Self {
        ApiKeyResponse::from(issued.key).with_secret(issued.secret)
    }
}
