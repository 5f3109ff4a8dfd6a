//! HTTP request handlers (route handlers).
//!
//! Handlers unpack the request, delegate to the key service and turn the
//! outcome into a JSON response.

/// Authenticated key management endpoints
pub mod api_keys;
/// One-time initial key creation
pub mod bootstrap;
/// Liveness and database connectivity
pub mod health;
