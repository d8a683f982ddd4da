use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::{
    entity,
    error::ProductResult,
    models::{CreateProduct, Product, UpdateProduct},
    repository::ProductRepository,
};

/// PostgreSQL-backed product repository.
///
/// Single-row mutations are one `UPDATE ... WHERE id = $1 AND available
/// RETURNING *`, so a concurrent remove can never be overwritten by an update.
pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    fn available() -> sea_orm::Select<entity::Entity> {
        entity::Entity::find().filter(entity::Column::Available.eq(true))
    }

    fn update_if_available(id: i32) -> sea_orm::UpdateMany<entity::Entity> {
        entity::Entity::update_many()
            .col_expr(
                entity::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
            )
            .filter(entity::Column::Id.eq(id))
            .filter(entity::Column::Available.eq(true))
    }
}

/// Clamp `OFFSET`/`LIMIT` to what Postgres binds as `BIGINT`.
///
/// `None` means the page starts past any row the table can hold.
fn page_window(offset: u64, limit: u64) -> Option<(u64, u64)> {
    let max = i64::MAX as u64;
    if offset > max {
        return None;
    }
    Some((offset, limit.min(max)))
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let active_model: entity::ActiveModel = input.into();
        let model = active_model.insert(&self.db).await?;

        tracing::info!(product_id = model.id, "Created product");
        Ok(model.into())
    }

    async fn count_available(&self) -> ProductResult<u64> {
        Ok(Self::available().count(&self.db).await?)
    }

    async fn list_available(&self, offset: u64, limit: u64) -> ProductResult<Vec<Product>> {
        let Some((offset, limit)) = page_window(offset, limit) else {
            return Ok(Vec::new());
        };

        let models = Self::available()
            .order_by_asc(entity::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_available(&self, id: i32) -> ProductResult<Option<Product>> {
        let model = Self::available()
            .filter(entity::Column::Id.eq(id))
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update_available(
        &self,
        id: i32,
        input: UpdateProduct,
    ) -> ProductResult<Option<Product>> {
        let mut update = Self::update_if_available(id);
        if let Some(name) = input.name {
            update = update.col_expr(entity::Column::Name, Expr::value(name));
        }
        if let Some(price) = input.price {
            update = update.col_expr(entity::Column::Price, Expr::value(price));
        }

        let updated = update.exec_with_returning(&self.db).await?;
        let product = updated.into_iter().next().map(Product::from);

        if product.is_some() {
            tracing::info!(product_id = id, "Updated product");
        }
        Ok(product)
    }

    async fn mark_unavailable(&self, id: i32) -> ProductResult<Option<Product>> {
        let updated = Self::update_if_available(id)
            .col_expr(entity::Column::Available, Expr::value(false))
            .exec_with_returning(&self.db)
            .await?;
        let product = updated.into_iter().next().map(Product::from);

        if product.is_some() {
            tracing::info!(product_id = id, "Removed product");
        }
        Ok(product)
    }

    async fn find_available_by_ids(&self, ids: Vec<i32>) -> ProductResult<Vec<Product>> {
        let models = Self::available()
            .filter(entity::Column::Id.is_in(ids))
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
