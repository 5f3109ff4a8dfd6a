//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::services::api_key_service::ApiKeyService;
use crate::store::ApiKeyStore;

#[derive(Clone)]
pub struct AppState {
    pub keys: ApiKeyService,
}

impl AppState {
    pub fn new(store: Arc<dyn ApiKeyStore>) -> Self {
        Self {
            keys: ApiKeyService::new(store),
        }
    }
}
