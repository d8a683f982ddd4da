//! Product Service - record-level operations over a repository

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CreateProduct, PageMeta, PaginatedProducts, PaginationDto, Product, UpdateProduct,
};
use crate::repository::ProductRepository;

/// Product service owning the repository handle.
///
/// Only available products are visible; removal is a soft delete.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        self.repository.create(input).await
    }

    /// One page of available products plus totals.
    ///
    /// `last_page` is `ceil(total / limit)`, so it is 0 when nothing is
    /// available. Pages past the end come back empty.
    #[instrument(skip(self))]
    pub async fn list(&self, pagination: PaginationDto) -> ProductResult<PaginatedProducts> {
        if pagination.page == 0 || pagination.limit == 0 {
            return Err(ProductError::InvalidArgument(
                "page and limit must be at least 1".to_string(),
            ));
        }

        let total = self.repository.count_available().await?;
        let products = self
            .repository
            .list_available(pagination.offset(), pagination.limit)
            .await?;

        Ok(PaginatedProducts {
            products,
            meta: PageMeta {
                total_products: total,
                page: pagination.page,
                last_page: total.div_ceil(pagination.limit),
            },
        })
    }

    #[instrument(skip(self))]
    pub async fn find_one(&self, id: i32) -> ProductResult<Product> {
        self.repository
            .find_available(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: UpdateProduct) -> ProductResult<Product> {
        self.repository
            .update_available(id, input)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Soft delete; returns the product as it is now (unavailable)
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i32) -> ProductResult<Product> {
        self.repository
            .mark_unavailable(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Available products among `ids`; unknown or removed ids are left out
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn validate_ids(&self, ids: Vec<i32>) -> ProductResult<Vec<Product>> {
        let unique: Vec<i32> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let found = self.repository.find_available_by_ids(unique).await?;
        tracing::debug!(found = found.len(), "Validated product ids");
        Ok(found)
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
