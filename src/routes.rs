//! HTTP router assembly.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware, state::AppState};

/// Build the application router.
///
/// - `GET /health` and `POST /api/init-key` are public
/// - everything under `/api/keys` requires a valid API key
pub fn router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        .route(
            "/api/keys",
            post(handlers::api_keys::create_api_key).get(handlers::api_keys::list_api_keys),
        )
        .route(
            "/api/keys/{id}",
            get(handlers::api_keys::get_api_key)
                .put(handlers::api_keys::update_api_key)
                .delete(handlers::api_keys::delete_api_key),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .route("/api/init-key", post(handlers::bootstrap::bootstrap_api_key))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
