//! Product Service - the façade handlers talk to

use axum_helpers::UploadedFile;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductInput};
use crate::repository::ProductRepository;
use crate::uploads::{ImageStore, public_path};

pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    images: Arc<dyn ImageStore>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R, images: Arc<dyn ImageStore>) -> Self {
        Self {
            repository: Arc::new(repository),
            images,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ProductResult<Vec<Product>> {
        self.repository.list().await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i64) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create_product(&self, input: ProductInput) -> ProductResult<Product> {
        self.repository.create(input).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: i64, input: ProductInput) -> ProductResult<Product> {
        self.repository.update(id, input).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i64) -> ProductResult<()> {
        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(ProductError::NotFound(id))
        }
    }

    /// Store an uploaded image and return its public path.
    ///
    /// Missing, malformed and unstorable uploads all yield `None`; the request
    /// carries on without an image.
    #[instrument(skip_all)]
    pub async fn store_image(&self, file: Option<&UploadedFile>) -> Option<String> {
        let file = file?;

        if !file.is_image() {
            tracing::warn!(
                file_name = %file.file_name,
                content_type = ?file.content_type,
                bytes = file.bytes.len(),
                "Ignoring upload that is not a valid image"
            );
            return None;
        }

        match self.images.store(file).await {
            Ok(relative) => Some(public_path(&relative)),
            Err(e) => {
                tracing::warn!(file_name = %file.file_name, error = %e, "Failed to store image");
                None
            }
        }
    }
}
