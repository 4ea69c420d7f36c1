//! 应用路由

pub mod inventory;

use axum::{middleware, routing::get, Router};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::core::middleware::request_logging_middleware;
use inventory::handler::{self, AppState};

pub fn router(state: AppState, timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handler::health_check))
        .route(
            "/products",
            get(handler::list_products).post(handler::create_product),
        )
        .route("/products/next-code", get(handler::next_code))
        .route("/products/stats", get(handler::get_stats))
        .route(
            "/products/:id",
            get(handler::get_product)
                .put(handler::update_product)
                .delete(handler::delete_product),
        )
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
