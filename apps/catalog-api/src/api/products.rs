use axum::Router;
use domain_products::{LocalImageStore, PgProductRepository, ProductService, handlers};
use std::sync::Arc;

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PgProductRepository::new(state.db.clone());
    let images = LocalImageStore::new(&state.config.storage.root)
        .with_max_bytes(state.config.storage.max_upload_bytes);
    let service = ProductService::new(repository, Arc::new(images));
    handlers::router(service)
}
