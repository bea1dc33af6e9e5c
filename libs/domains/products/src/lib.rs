//! Products Domain
//!
//! Catalog of products with an optional image per product.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, form validation, image upload
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← NotFound translation, image storage
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + PostgreSQL / in-memory implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Product, ProductInput, ProductForm
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_products::{handlers, LocalImageStore, PgProductRepository, ProductService};
//! use std::sync::Arc;
//!
//! let repository = PgProductRepository::new(db);
//! let images = Arc::new(LocalImageStore::new("storage/app/public"));
//! let service = ProductService::new(repository, images);
//!
//! let router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod uploads;

pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use models::{DeletedResponse, Product, ProductEnvelope, ProductForm, ProductInput};
pub use postgres::PgProductRepository;
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use service::ProductService;
pub use uploads::{ImageStore, LocalImageStore, PRODUCTS_DIR, PUBLIC_PREFIX};
