//! Image persistence for product uploads

use async_trait::async_trait;
use axum_helpers::UploadedFile;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};

/// Subdirectory of the storage root that holds product images
pub const PRODUCTS_DIR: &str = "products";

/// URL prefix the storage root is served under
pub const PUBLIC_PREFIX: &str = "/images";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist the file and return its path relative to the storage root
    async fn store(&self, file: &UploadedFile) -> ProductResult<String>;
}

/// Public path recorded on the product for a stored image
pub fn public_path(relative: &str) -> String {
    format!("{}/{}", PUBLIC_PREFIX, relative)
}

/// Writes images to `<root>/products/<uuid>.<ext>` on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_bytes: usize::MAX,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Extension from the client file name, falling back to the MIME subtype
fn extension_for(file: &UploadedFile) -> String {
    file.extension()
        .or_else(|| {
            file.content_type
                .as_deref()
                .and_then(|ct| ct.strip_prefix("image/"))
                .map(|subtype| subtype.split('+').next().unwrap_or(subtype).to_ascii_lowercase())
                .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        })
        .unwrap_or_else(|| "bin".to_string())
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, file: &UploadedFile) -> ProductResult<String> {
        if file.bytes.len() > self.max_bytes {
            return Err(ProductError::Storage(format!(
                "image is {} bytes, limit is {}",
                file.bytes.len(),
                self.max_bytes
            )));
        }

        let dir = self.root.join(PRODUCTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension_for(file));
        tokio::fs::write(dir.join(&file_name), &file.bytes).await?;

        let relative = format!("{}/{}", PRODUCTS_DIR, file_name);
        tracing::debug!(path = %relative, bytes = file.bytes.len(), "Stored image");
        Ok(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn upload(file_name: &str, content_type: &str, bytes: &'static [u8]) -> UploadedFile {
        UploadedFile {
            field: "image".into(),
            file_name: file_name.into(),
            content_type: Some(content_type.into()),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[tokio::test]
    async fn test_store_writes_under_products_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());

        let relative = store.store(&upload("cat.JPG", "image/jpeg", b"JPEG")).await.unwrap();

        assert!(relative.starts_with("products/"));
        assert!(relative.ends_with(".jpg"));
        assert_eq!(std::fs::read(dir.path().join(&relative)).unwrap(), b"JPEG");
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path()).with_max_bytes(2);

        let err = store.store(&upload("cat.png", "image/png", b"PNG!")).await.unwrap_err();
        assert!(matches!(err, ProductError::Storage(_)));
    }

    #[test]
    fn test_extension_falls_back_to_mime_subtype() {
        assert_eq!(extension_for(&upload("photo", "image/png", b"x")), "png");
        assert_eq!(extension_for(&upload("icon", "image/svg+xml", b"x")), "svg");
        assert_eq!(extension_for(&upload("photo.webp", "image/png", b"x")), "webp");
    }

    #[test]
    fn test_public_path() {
        assert_eq!(public_path("products/a.png"), "/images/products/a.png");
    }
}
