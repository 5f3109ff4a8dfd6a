//! Business logic services.
//!
//! Services hold the key lifecycle rules, separated from HTTP handlers and
//! from the storage backend.

pub mod api_key_service;
