use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::shipping::handlers;
use crate::features::shipping::services::ShippingService;

/// Create routes for the shipping feature
pub fn routes(service: Arc<ShippingService>) -> Router {
    Router::new()
        // Provider lookups
        .route("/api/shipping/provinces", get(handlers::list_provinces))
        .route(
            "/api/shipping/provinces/{id}/cities",
            get(handlers::list_cities),
        )
        .route("/api/shipping/quote", post(handlers::quote))
        .route("/api/shipping/cache", get(handlers::cache_stats))
        // Sessions
        .route("/api/shipping/sessions", post(handlers::create_session))
        .route(
            "/api/shipping/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route(
            "/api/shipping/sessions/{id}/provinces",
            post(handlers::load_provinces),
        )
        .route(
            "/api/shipping/sessions/{id}/province",
            put(handlers::select_province),
        )
        .route(
            "/api/shipping/sessions/{id}/city",
            put(handlers::select_city),
        )
        .route(
            "/api/shipping/sessions/{id}/cost",
            get(handlers::session_cost),
        )
        .route(
            "/api/shipping/sessions/{id}/reset",
            post(handlers::reset_session),
        )
        .with_state(service)
}
