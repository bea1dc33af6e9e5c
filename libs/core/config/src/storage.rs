use crate::{env_or_default, env_parse_or, ConfigError, FromEnv};
use std::path::PathBuf;

/// Where uploaded files live and how large they may be
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Root directory; product images go under `<root>/products`
    pub root: PathBuf,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

pub const DEFAULT_STORAGE_ROOT: &str = "storage/app/public";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

impl StorageConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_ROOT)
    }
}

impl FromEnv for StorageConfig {
    /// - `STORAGE_ROOT`: defaults to `storage/app/public`
    /// - `MAX_UPLOAD_BYTES`: defaults to 2 MiB
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            root: PathBuf::from(env_or_default("STORAGE_ROOT", DEFAULT_STORAGE_ROOT)),
            max_upload_bytes: env_parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}
