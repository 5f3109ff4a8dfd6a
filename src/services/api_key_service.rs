//! API key lifecycle logic.
//!
//! This service handles:
//! - Secret generation and hashing
//! - Expiry computation from day counts
//! - Validation of presented secrets
//! - Ownership-checked reads, updates and deletes
//! - The one-time bootstrap path used while no key exists
//!
//! # Secret Collisions
//!
//! Secrets carry 256 bits of randomness, so a collision is practically
//! impossible, but the store's unique index is the final arbiter. When it
//! reports a conflict the secret is regenerated and the insert retried.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::api_key::{
    ApiKey, BootstrapApiKeyRequest, CreateApiKeyRequest, IssuedApiKey, UpdateApiKeyRequest,
};
use crate::store::{ApiKeyChanges, ApiKeyStore, NewApiKey, validate_name};

/// Number of secrets tried before giving up on a create.
const MAX_SECRET_ATTEMPTS: usize = 5;

/// Source of fresh secrets.
pub type SecretGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Generate a new secret: 32 random bytes, hex encoded (64 characters).
///
/// `rand::random` draws from the thread-local CSPRNG, which is seeded from
/// the operating system.
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Hash a secret using SHA-256, returning the hex-encoded digest.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Compute `now + days_from_now` days.
///
/// # Errors
///
/// - `Validation`: day count is zero or negative, or the result overflows
pub fn compute_expiry(now: DateTime<Utc>, days_from_now: i64) -> Result<DateTime<Utc>, AppError> {
    if days_from_now <= 0 {
        return Err(AppError::Validation(
            "days_valid must be at least 1".to_string(),
        ));
    }

    TimeDelta::try_days(days_from_now)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| AppError::Validation("days_valid is too large".to_string()))
}

#[derive(Clone)]
pub struct ApiKeyService {
    store: Arc<dyn ApiKeyStore>,
    secret_generator: SecretGenerator,
}

impl ApiKeyService {
    pub fn new(store: Arc<dyn ApiKeyStore>) -> Self {
        Self {
            store,
            secret_generator: Arc::new(generate_secret),
        }
    }

    /// Replace the secret source.
    pub fn with_secret_generator(mut self, secret_generator: SecretGenerator) -> Self {
        self.secret_generator = secret_generator;
        self
    }

    /// Create the first key without authentication.
    ///
    /// The gate is re-derived from the store on every call, so it closes as
    /// soon as any key exists, across restarts and instances.
    ///
    /// # Errors
    ///
    /// - `Forbidden`: at least one key already exists
    /// - `Validation`: empty name, missing owner, or non-positive day count
    pub async fn bootstrap(&self, request: BootstrapApiKeyRequest) -> Result<IssuedApiKey, AppError> {
        if self.store.count().await? > 0 {
            tracing::warn!("bootstrap key requested but keys already exist");
            return Err(AppError::Forbidden);
        }

        self.issue(&request.name, request.owner_id, request.days_valid)
            .await
    }

    /// Create a key owned by the authenticated caller.
    pub async fn create(
        &self,
        owner_id: i64,
        request: CreateApiKeyRequest,
    ) -> Result<IssuedApiKey, AppError> {
        self.issue(&request.name, owner_id, request.days_valid).await
    }

    /// Resolve a presented secret to its record.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no key has this secret
    pub async fn find_by_secret(&self, secret: &str) -> Result<ApiKey, AppError> {
        self.store.find_by_secret_hash(&hash_secret(secret)).await
    }

    /// Check a presented secret for the auth gate.
    ///
    /// Unknown, disabled and expired keys all yield `Unauthorized`.
    pub async fn validate(&self, secret: &str) -> Result<ApiKey, AppError> {
        if secret.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let key = match self.find_by_secret(secret).await {
            Ok(key) => key,
            Err(AppError::NotFound) => return Err(AppError::Unauthorized),
            Err(e) => return Err(e),
        };

        if !key.is_valid(Utc::now()) {
            tracing::debug!(key_id = %key.id, active = key.active, "rejected invalid API key");
            return Err(AppError::Unauthorized);
        }

        Ok(key)
    }

    pub async fn list(&self, owner_id: i64) -> Result<Vec<ApiKey>, AppError> {
        self.store.find_all_by_owner(owner_id).await
    }

    pub async fn get(&self, owner_id: i64, id: Uuid) -> Result<ApiKey, AppError> {
        self.store.find_by_id_and_owner(id, owner_id).await
    }

    /// Apply a partial update to a key owned by `owner_id`.
    ///
    /// An empty name and a zero day count leave those fields unchanged.
    /// `active` must be present and is always written; re-enabling a key
    /// keeps its current expiry unless a new day count is given.
    ///
    /// # Errors
    ///
    /// - `Validation`: `active` missing, name too long, or negative day count
    /// - `NotFound`: key missing or owned by someone else
    pub async fn update(
        &self,
        owner_id: i64,
        id: Uuid,
        request: UpdateApiKeyRequest,
    ) -> Result<ApiKey, AppError> {
        let changes = changes_from_request(request, Utc::now())?;

        self.store.find_by_id_and_owner(id, owner_id).await?;
        let key = self.store.update(id, changes).await?;

        tracing::info!(key_id = %key.id, owner_id, active = key.active, "API key updated");
        Ok(key)
    }

    /// Permanently remove a key owned by `owner_id`.
    pub async fn delete(&self, owner_id: i64, id: Uuid) -> Result<(), AppError> {
        self.store.find_by_id_and_owner(id, owner_id).await?;
        self.store.delete(id).await?;

        tracing::info!(key_id = %id, owner_id, "API key deleted");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.store.ping().await
    }

    async fn issue(&self, name: &str, owner_id: i64, days_valid: i64) -> Result<IssuedApiKey, AppError> {
        let name = name.trim();
        let expires_at = compute_expiry(Utc::now(), days_valid)?;

        for attempt in 1..=MAX_SECRET_ATTEMPTS {
            let secret = (self.secret_generator)();
            let record = NewApiKey {
                secret_hash: hash_secret(&secret),
                name: name.to_string(),
                owner_id,
                expires_at,
            };

            match self.store.create(record).await {
                Ok(key) => {
                    tracing::info!(key_id = %key.id, owner_id, expires_at = %key.expires_at, "API key created");
                    return Ok(IssuedApiKey { key, secret });
                }
                Err(AppError::Conflict) => {
                    tracing::warn!(attempt, "secret collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Conflict)
    }
}

fn changes_from_request(
    request: UpdateApiKeyRequest,
    now: DateTime<Utc>,
) -> Result<ApiKeyChanges, AppError> {
    let active = request
        .active
        .ok_or_else(|| AppError::Validation("active is required".to_string()))?;

    let name = request
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if let Some(name) = &name {
        validate_name(name)?;
    }

    let expires_at = match request.days_valid {
        None | Some(0) => None,
        Some(days) if days < 0 => {
            return Err(AppError::Validation(
                "days_valid must not be negative".to_string(),
            ));
        }
        Some(days) => Some(compute_expiry(now, days)?),
    };

    Ok(ApiKeyChanges {
        name,
        active,
        expires_at,
    })
}
