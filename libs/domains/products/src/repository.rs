use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductInput};

/// Storage access for products
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Every product in id order; empty when there are none
    async fn list(&self) -> ProductResult<Vec<Product>>;

    async fn get_by_id(&self, id: i64) -> ProductResult<Option<Product>>;

    /// Insert a product; storage assigns the id and both timestamps
    async fn create(&self, input: ProductInput) -> ProductResult<Product>;

    /// Fails with [`ProductError::NotFound`] when `id` does not exist
    async fn update(&self, id: i64, input: ProductInput) -> ProductResult<Product>;

    /// Returns `false` when nothing was deleted
    async fn delete(&self, id: i64) -> ProductResult<bool>;
}

#[derive(Debug, Default)]
struct Store {
    last_id: i64,
    products: BTreeMap<i64, Product>,
}

/// In-memory implementation of ProductRepository (for development/testing)
///
/// Ids are never reused, matching a database sequence.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self) -> ProductResult<Vec<Product>> {
        let store = self.store.read().await;
        Ok(store.products.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> ProductResult<Option<Product>> {
        let store = self.store.read().await;
        Ok(store.products.get(&id).cloned())
    }

    async fn create(&self, input: ProductInput) -> ProductResult<Product> {
        let mut store = self.store.write().await;

        store.last_id += 1;
        let product = Product::new(store.last_id, input);
        store.products.insert(product.id, product.clone());

        tracing::info!(product_id = product.id, "Created product");
        Ok(product)
    }

    async fn update(&self, id: i64, input: ProductInput) -> ProductResult<Product> {
        let mut store = self.store.write().await;

        let product = store
            .products
            .get_mut(&id)
            .ok_or(ProductError::NotFound(id))?;
        product.apply_update(input);

        tracing::info!(product_id = id, "Updated product");
        Ok(product.clone())
    }

    async fn delete(&self, id: i64) -> ProductResult<bool> {
        let mut store = self.store.write().await;

        if store.products.remove(&id).is_some() {
            tracing::info!(product_id = id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
