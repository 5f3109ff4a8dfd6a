//! Persistence of API key records.
//!
//! [`ApiKeyStore`] is the only shared mutable resource in the service. It
//! knows nothing about callers: ownership must be checked with
//! [`ApiKeyStore::find_by_id_and_owner`] before calling a mutating method.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::api_key::ApiKey;

pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgApiKeyStore;

/// Longest key name the `api_keys.name` column holds, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Reject names the table cannot hold.
pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Fields of a key about to be inserted.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub secret_hash: String,
    pub name: String,
    pub owner_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl NewApiKey {
    /// Reject records the table must never hold.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)?;
        if self.owner_id <= 0 {
            return Err(AppError::Validation("owner_id is required".to_string()));
        }
        Ok(())
    }
}

/// Partial update applied by [`ApiKeyStore::update`].
///
/// `None` leaves a field untouched. `active` is always written.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKeyChanges {
    pub name: Option<String>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Insert a new key. Inserts and returns the stored row.
    ///
    /// Fails with `Conflict` when `secret_hash` already exists and with
    /// `Validation` when the record is malformed.
    async fn create(&self, record: NewApiKey) -> Result<ApiKey, AppError>;

    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<ApiKey, AppError>;

    /// All keys of `owner_id`, newest first.
    async fn find_all_by_owner(&self, owner_id: i64) -> Result<Vec<ApiKey>, AppError>;

    /// `NotFound` both when the key is missing and when another owner holds it.
    async fn find_by_id_and_owner(&self, id: Uuid, owner_id: i64) -> Result<ApiKey, AppError>;

    async fn update(&self, id: Uuid, changes: ApiKeyChanges) -> Result<ApiKey, AppError>;

    /// Hard delete. A second delete of the same id fails with `NotFound`.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    /// Round trip to the backing store, for health checks.
    async fn ping(&self) -> Result<(), AppError>;
}
