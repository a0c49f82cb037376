// ABOUTME: HTTP API layer for Dockyard providing REST endpoints and routing
// ABOUTME: Integration layer over the runtime gateway and provisioning core

use axum::{
    http::Method,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod containers_handlers;
pub mod error;
pub mod host_stats;
pub mod images_handlers;
pub mod state;
pub mod system_handlers;

pub use error::{ApiError, ApiResult, ErrorBody};
pub use state::AppState;

/// Any origin, the methods the dashboard and scripts use
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Creates the full Dockyard router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(system_handlers::health))
        .route("/create", post(containers_handlers::create_container))
        .route("/status", get(containers_handlers::list_containers))
        .route("/stop/{id}", get(containers_handlers::stop_container))
        .route("/start/{id}", get(containers_handlers::start_container))
        .route("/remove/{id}", get(containers_handlers::remove_container))
        .route("/logs/{id}", get(containers_handlers::container_logs))
        .route("/exec/{id}", post(containers_handlers::exec_in_container))
        .route("/bulk/{action}", post(containers_handlers::bulk_action))
        .route("/images", get(images_handlers::list_images))
        .route("/images/pull", post(images_handlers::pull_image))
        .route("/images/{id}", delete(images_handlers::delete_image))
        .route(
            "/images/search/{term}",
            get(images_handlers::search_images),
        )
        .route("/stats", get(system_handlers::stats))
        .route("/cleanup", post(system_handlers::cleanup))
        .route("/networks", get(system_handlers::list_networks))
        .route("/volumes", get(system_handlers::list_volumes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}
