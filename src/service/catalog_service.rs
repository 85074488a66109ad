//! Catalog service layer that provides CRUD semantics on top of the sync engine
//!
//! There is no in-memory cache: every operation reloads the catalog from the
//! preferred source, mutates it, and persists the whole collection. Concurrent
//! requests racing on the same file are last-writer-wins, an accepted gap.

use chrono::Utc;
use log::debug;
use std::sync::Arc;

use crate::error::ApiError;
use crate::model::{next_id, Product, ProductInput};
use crate::sync::SyncEngine;

pub struct CatalogService {
    sync: Arc<SyncEngine>,
}

/// Required-field check for a new product. Also run by the HTTP layer before
/// an uploaded image is written anywhere.
pub fn validate_new(input: &ProductInput) -> Result<(), ApiError> {
    if input.name.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    if input.price.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(ApiError::Validation("price is required".to_string()));
    }
    Ok(())
}

impl CatalogService {
    /// Create a new catalog service with an injected sync engine
    pub fn new(sync: Arc<SyncEngine>) -> Self {
        Self { sync }
    }

    /// Full collection, read-only.
    pub async fn list(&self) -> Vec<Product> {
        self.sync.load_catalog().await
    }

    /// Single product lookup.
    pub async fn get(&self, id: u64) -> Result<Product, ApiError> {
        self.sync
            .load_catalog()
            .await
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(ApiError::NotFound)
    }

    /// Create a product. Requires a non-empty `name` and `price`; assigns the
    /// next id and a placeholder image when none was supplied.
    pub async fn create(&self, input: ProductInput) -> Result<Product, ApiError> {
        validate_new(&input)?;

        let mut products = self.sync.load_catalog().await;
        let id = next_id(&products);
        let product = Product::from_input(id, input);
        debug!("Creating product {} ({})", id, product.name);

        products.push(product.clone());
        self.sync.save_catalog(&products).await?;
        Ok(product)
    }

    /// Merge supplied fields over an existing product. `id` is immutable; an
    /// empty patch leaves the product untouched.
    pub async fn update(&self, id: u64, input: ProductInput) -> Result<Product, ApiError> {
        let mut products = self.sync.load_catalog().await;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ApiError::NotFound)?;

        if !input.is_empty() {
            product.apply(input);
            product.updated_at = Some(Utc::now());
        }
        let updated = product.clone();
        debug!("Updating product {} ({})", id, updated.name);

        self.sync.save_catalog(&products).await?;
        Ok(updated)
    }

    /// Remove a product and persist the shrunken collection.
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        let mut products = self.sync.load_catalog().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(ApiError::NotFound);
        }
        debug!("Deleting product {}", id);
        self.sync.save_catalog(&products).await
    }
}
