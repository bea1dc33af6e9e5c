//! Custom extractors for Axum handlers.

pub mod form;
pub mod id_path;

pub use form::{FormPayload, METHOD_FIELD, METHOD_OVERRIDE_HEADER, UploadedFile, ValidatedForm};
pub use id_path::IdPath;
