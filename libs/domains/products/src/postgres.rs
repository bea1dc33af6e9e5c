use async_trait::async_trait;
use database::BaseRepository;
use sea_orm::ActiveValue::Set;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QueryOrder};

use crate::{
    entity,
    error::{ProductError, ProductResult},
    models::{Product, ProductInput, next_timestamp},
    repository::ProductRepository,
};

pub struct PgProductRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(&self) -> ProductResult<Vec<Product>> {
        let models = entity::Entity::find()
            .order_by_asc(entity::Column::Id)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Product::from).collect())
    }

    async fn get_by_id(&self, id: i64) -> ProductResult<Option<Product>> {
        let model = self.base.find_by_id(id).await?;
        Ok(model.map(Product::from))
    }

    async fn create(&self, input: ProductInput) -> ProductResult<Product> {
        let active_model: entity::ActiveModel = input.into();
        let model = self.base.insert(active_model).await?;

        tracing::info!(product_id = model.id, "Created product");
        Ok(model.into())
    }

    async fn update(&self, id: i64, input: ProductInput) -> ProductResult<Product> {
        let existing = self
            .base
            .find_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let updated_at = next_timestamp(existing.updated_at.into());
        let mut active_model = existing.into_active_model();
        active_model.name = Set(input.name);
        active_model.price = Set(input.price);
        active_model.category = Set(input.category);
        if let Some(description) = input.description {
            active_model.description = Set(description);
        }
        if let Some(image) = input.image {
            active_model.image = Set(Some(image));
        }
        active_model.updated_at = Set(updated_at.into());

        let model = self.base.update(active_model).await.map_err(|e| match e {
            // Deleted between the lookup and the write
            DbErr::RecordNotUpdated => ProductError::NotFound(id),
            other => other.into(),
        })?;

        tracing::info!(product_id = id, "Updated product");
        Ok(model.into())
    }

    async fn delete(&self, id: i64) -> ProductResult<bool> {
        let rows_affected = self.base.delete_by_id(id).await?;

        if rows_affected > 0 {
            tracing::info!(product_id = id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
