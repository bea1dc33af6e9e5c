//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! - **[`errors`]**: `AppError` and the JSON error envelope with error codes
//! - **[`extractors`]**: integer path ids and validated form bodies (multipart, urlencoded, JSON)
//! - **[`http`]**: CORS and security headers
//! - **[`server`]**: router assembly with API docs, health endpoint, graceful shutdown

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::{FormPayload, IdPath, UploadedFile, ValidatedForm};
pub use http::{create_cors_layer, create_permissive_cors_layer, security_headers};
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};
