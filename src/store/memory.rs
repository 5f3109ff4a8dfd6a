//! In-memory key store for tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::api_key::ApiKey;
use crate::store::{ApiKeyChanges, ApiKeyStore, NewApiKey, validate_name};

/// In-memory implementation of [`ApiKeyStore`] with the same uniqueness
/// and not-found semantics as the PostgreSQL store.
#[derive(Default)]
pub struct InMemoryApiKeyStore {
    pub keys: Mutex<HashMap<Uuid, ApiKey>>,
}

impl InMemoryApiKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully specified record, bypassing validation.
    pub fn insert(&self, key: ApiKey) {
        self.keys.lock().unwrap().insert(key.id, key);
    }

    /// Get a record by id (for test assertions).
    pub fn get(&self, id: Uuid) -> Option<ApiKey> {
        self.keys.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl ApiKeyStore for InMemoryApiKeyStore {
    async fn create(&self, record: NewApiKey) -> Result<ApiKey, AppError> {
        record.validate()?;

        let mut keys = self.keys.lock().unwrap();
        if keys.values().any(|k| k.secret_hash == record.secret_hash) {
            return Err(AppError::Conflict);
        }

        let now = Utc::now();
        let key = ApiKey {
            id: Uuid::new_v4(),
            secret_hash: record.secret_hash,
            name: record.name,
            owner_id: record.owner_id,
            expires_at: record.expires_at,
            active: true,
            created_at: now,
            updated_at: now,
        };

        keys.insert(key.id, key.clone());
        Ok(key)
    }

    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<ApiKey, AppError> {
        self.keys
            .lock()
            .unwrap()
            .values()
            .find(|k| k.secret_hash == secret_hash)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn find_all_by_owner(&self, owner_id: i64) -> Result<Vec<ApiKey>, AppError> {
        let mut owned: Vec<ApiKey> = self
            .keys
            .lock()
            .unwrap()
            .values()
            .filter(|k| k.owner_id == owner_id)
            .cloned()
            .collect();

        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn find_by_id_and_owner(&self, id: Uuid, owner_id: i64) -> Result<ApiKey, AppError> {
        self.keys
            .lock()
            .unwrap()
            .get(&id)
            .filter(|k| k.owner_id == owner_id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn update(&self, id: Uuid, changes: ApiKeyChanges) -> Result<ApiKey, AppError> {
        if let Some(name) = &changes.name {
            validate_name(name)?;
        }

        let mut keys = self.keys.lock().unwrap();
        let key = keys.get_mut(&id).ok_or(AppError::NotFound)?;

        if let Some(name) = changes.name {
            key.name = name;
        }
        key.active = changes.active;
        if let Some(expires_at) = changes.expires_at {
            key.expires_at = expires_at;
        }
        key.updated_at = Utc::now();

        Ok(key.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.keys
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.keys.lock().unwrap().len() as i64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_key(secret_hash: &str, owner_id: i64) -> NewApiKey {
        NewApiKey {
            secret_hash: secret_hash.to_string(),
            name: "svc-a".to_string(),
            owner_id,
            expires_at: Utc::now() + Duration::days(30),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_secret_hash() {
        let store = InMemoryApiKeyStore::new();
        store.create(new_key("aa", 1)).await.unwrap();

        let err = store.create(new_key("aa", 2)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_rejects_empty_name_and_missing_owner() {
        let store = InMemoryApiKeyStore::new();

        let mut unnamed = new_key("aa", 1);
        unnamed.name = String::new();
        assert!(matches!(
            store.create(unnamed).await,
            Err(AppError::Validation(_))
        ));

        assert!(matches!(
            store.create(new_key("bb", 0)).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_names_the_table_cannot_hold() {
        let store = InMemoryApiKeyStore::new();

        let mut long = new_key("aa", 1);
        long.name = "x".repeat(crate::store::MAX_NAME_LENGTH + 1);
        assert!(matches!(store.create(long).await, Err(AppError::Validation(_))));

        let key = store.create(new_key("bb", 1)).await.unwrap();
        let changes = ApiKeyChanges {
            name: Some("x".repeat(crate::store::MAX_NAME_LENGTH + 1)),
            active: true,
            expires_at: None,
        };
        assert!(matches!(
            store.update(key.id, changes).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(store.get(key.id), Some(key));
    }

    #[tokio::test]
    async fn find_by_id_and_owner_hides_foreign_keys() {
        let store = InMemoryApiKeyStore::new();
        let key = store.create(new_key("aa", 1)).await.unwrap();

        assert_eq!(store.find_by_id_and_owner(key.id, 1).await.unwrap(), key);
        assert!(matches!(
            store.find_by_id_and_owner(key.id, 2).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn update_leaves_unset_fields_alone() {
        let store = InMemoryApiKeyStore::new();
        let key = store.create(new_key("aa", 1)).await.unwrap();

        let updated = store
            .update(
                key.id,
                ApiKeyChanges {
                    name: None,
                    active: false,
                    expires_at: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, key.name);
        assert_eq!(updated.expires_at, key.expires_at);
        assert!(!updated.active);
    }

    #[tokio::test]
    async fn delete_is_not_idempotent() {
        let store = InMemoryApiKeyStore::new();
        let key = store.create(new_key("aa", 1)).await.unwrap();

        store.delete(key.id).await.unwrap();
        assert!(matches!(store.delete(key.id).await, Err(AppError::NotFound)));
    }
}
