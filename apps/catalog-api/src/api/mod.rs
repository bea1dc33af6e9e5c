use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::services::ServeDir;

pub mod health;
pub mod products;

/// Room for the text fields and multipart framing around an image
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Creates the API routes without the `/api` prefix, which `create_router` adds.
pub fn routes(state: &crate::state::AppState) -> Router {
    let body_limit = state.config.storage.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .nest("/v1/products", products::router(state))
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Stored images, served from the storage root at `/images`
pub fn public_routes(state: &crate::state::AppState) -> Router {
    Router::new().nest_service(
        domain_products::PUBLIC_PREFIX,
        ServeDir::new(&state.config.storage.root),
    )
}

/// `/ready` performs real dependency checks, so it carries the state.
pub fn ready_router(state: crate::state::AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
