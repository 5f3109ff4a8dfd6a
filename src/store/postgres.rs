//! PostgreSQL implementation of the key store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::api_key::ApiKey;
use crate::store::{ApiKeyChanges, ApiKeyStore, NewApiKey, validate_name};

const COLUMNS: &str = "id, secret_hash, name, owner_id, expires_at, active, created_at, updated_at";

/// Key store backed by the `api_keys` table.
#[derive(Debug, Clone)]
pub struct PgApiKeyStore {
    pool: DbPool,
}

impl PgApiKeyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyStore for PgApiKeyStore {
    async fn create(&self, record: NewApiKey) -> Result<ApiKey, AppError> {
        record.validate()?;

        sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            INSERT INTO api_keys (secret_hash, name, owner_id, expires_at, active)
            VALUES ($1, $2, $3, $4, true)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&record.secret_hash)
        .bind(&record.name)
        .bind(record.owner_id)
        .bind(record.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // The only unique constraint on the table is secret_hash
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict
            }
            other => AppError::Database(other),
        })
    }

    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<ApiKey, AppError> {
        sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {COLUMNS} FROM api_keys WHERE secret_hash = $1"
        ))
        .bind(secret_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn find_all_by_owner(&self, owner_id: i64) -> Result<Vec<ApiKey>, AppError> {
        let keys = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {COLUMNS} FROM api_keys WHERE owner_id = $1 ORDER BY created_at DESC, id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }

    async fn find_by_id_and_owner(&self, id: Uuid, owner_id: i64) -> Result<ApiKey, AppError> {
        // Filtering on both columns keeps other owners' keys indistinguishable from missing ones
        sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {COLUMNS} FROM api_keys WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn update(&self, id: Uuid, changes: ApiKeyChanges) -> Result<ApiKey, AppError> {
        if let Some(name) = &changes.name {
            validate_name(name)?;
        }

        sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            UPDATE api_keys
            SET name = COALESCE($2, name),
                active = $3,
                expires_at = COALESCE($4, expires_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.active)
        .bind(changes.expires_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
