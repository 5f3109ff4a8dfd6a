//! Data models representing database entities and API payloads.

/// API key model, request bodies and responses
pub mod api_key;
