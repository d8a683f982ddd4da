use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, UpdateProduct};

/// Repository trait for Product persistence
///
/// Every read only sees rows with `available = true`. Mutations of a single
/// row return `None` when no available row matched.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new available product
    async fn create(&self, input: CreateProduct) -> ProductResult<Product>;

    async fn count_available(&self) -> ProductResult<u64>;

    /// Available products in id order, skipping `offset`
    async fn list_available(&self, offset: u64, limit: u64) -> ProductResult<Vec<Product>>;

    async fn find_available(&self, id: i32) -> ProductResult<Option<Product>>;

    /// Apply `input` to the product if it is still available
    async fn update_available(
        &self,
        id: i32,
        input: UpdateProduct,
    ) -> ProductResult<Option<Product>>;

    /// Flip `available` to false, returning the updated row
    async fn mark_unavailable(&self, id: i32) -> ProductResult<Option<Product>>;

    /// Available products whose id is in `ids`
    async fn find_available_by_ids(&self, ids: Vec<i32>) -> ProductResult<Vec<Product>>;
}

#[derive(Debug, Default)]
struct Store {
    products: BTreeMap<i32, Product>,
    last_id: i32,
}

impl Store {
    // Mirrors the unique index on products.name, which also covers removed rows
    fn name_taken(&self, name: &str, except: Option<i32>) -> bool {
        self.products
            .values()
            .any(|p| p.name == name && Some(p.id) != except)
    }
}

/// In-memory implementation of ProductRepository (for development/testing)
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
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let mut store = self.store.write().await;

        if store.name_taken(&input.name, None) {
            return Err(ProductError::Persistence(format!(
                "product name '{}' already exists",
                input.name
            )));
        }

        let id = store
            .last_id
            .checked_add(1)
            .ok_or_else(|| ProductError::Persistence("product id sequence exhausted".into()))?;
        store.last_id = id;

        let now = Utc::now();
        let product = Product {
            id,
            name: input.name,
            price: input.price,
            available: true,
            created_at: now,
            updated_at: now,
        };
        store.products.insert(id, product.clone());

        tracing::info!(product_id = id, "Created product");
        Ok(product)
    }

    async fn count_available(&self) -> ProductResult<u64> {
        let store = self.store.read().await;
        Ok(store.products.values().filter(|p| p.available).count() as u64)
    }

    async fn list_available(&self, offset: u64, limit: u64) -> ProductResult<Vec<Product>> {
        let store = self.store.read().await;

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(store
            .products
            .values()
            .filter(|p| p.available)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_available(&self, id: i32) -> ProductResult<Option<Product>> {
        let store = self.store.read().await;
        Ok(store.products.get(&id).filter(|p| p.available).cloned())
    }

    async fn update_available(
        &self,
        id: i32,
        input: UpdateProduct,
    ) -> ProductResult<Option<Product>> {
        let mut store = self.store.write().await;

        if !store.products.get(&id).is_some_and(|p| p.available) {
            return Ok(None);
        }

        if let Some(name) = &input.name {
            if store.name_taken(name, Some(id)) {
                return Err(ProductError::Persistence(format!(
                    "product name '{}' already exists",
                    name
                )));
            }
        }

        let Some(product) = store.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = input.name {
            product.name = name;
        }
        if let Some(price) = input.price {
            product.price = price;
        }
        product.updated_at = Utc::now();

        tracing::info!(product_id = id, "Updated product");
        Ok(Some(product.clone()))
    }

    async fn mark_unavailable(&self, id: i32) -> ProductResult<Option<Product>> {
        let mut store = self.store.write().await;

        let Some(product) = store.products.get_mut(&id).filter(|p| p.available) else {
            return Ok(None);
        };
        product.available = false;
        product.updated_at = Utc::now();

        tracing::info!(product_id = id, "Removed product");
        Ok(Some(product.clone()))
    }

    async fn find_available_by_ids(&self, ids: Vec<i32>) -> ProductResult<Vec<Product>> {
        let store = self.store.read().await;

        let mut found: Vec<Product> = ids
            .iter()
            .filter_map(|id| store.products.get(id))
            .filter(|p| p.available)
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id);
        found.dedup_by_key(|p| p.id);

        Ok(found)
    }
}
