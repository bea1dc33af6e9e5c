//! Router assembly, health endpoint and graceful shutdown.
//!
//! ```ignore
//! let router = create_router::<ApiDoc>(api_routes, public_routes, &config.environment)?
//!     .merge(health_router(config.app));
//!
//! create_production_app(router, &config.server, Duration::from_secs(30), cleanup).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, create_router};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
