//! Catalog service.

use chrono::Utc;
use common::ProductId;
use store::{Product, ProductPage, Store, Version};

use crate::error::DomainError;

use super::{CatalogError, CreateProduct, ListProducts};

/// Service for reading and extending the product catalog.
#[derive(Clone)]
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    /// Creates a new catalog service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adds a product to the catalog.
    #[tracing::instrument(skip(self, cmd), fields(name = %cmd.name))]
    pub async fn create_product(&self, cmd: CreateProduct) -> Result<Product, DomainError> {
        let (name, category, price) = cmd.validate()?;
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            name,
            description: cmd.description.trim().to_string(),
            brand: cmd.brand.trim().to_string(),
            category,
            price,
            stock: cmd.stock,
            image: cmd.image.filter(|image| !image.trim().is_empty()),
            is_visible: cmd.is_visible,
            version: Version::first(),
            created_at: now,
            updated_at: now,
        };

        let product = self.store.insert_product(product).await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Loads a product. Hidden products are only returned to admins.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId, is_admin: bool) -> Result<Product, DomainError> {
        match self.store.get_product(id).await? {
            Some(product) if is_admin || product.is_visible => Ok(product),
            _ => Err(CatalogError::ProductNotFound(id).into()),
        }
    }

    /// Lists one page of products, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(
        &self,
        list: &ListProducts,
        is_admin: bool,
    ) -> Result<ProductPage, DomainError> {
        let query = list.to_query(is_admin)?;
        Ok(self.store.query_products(&query).await?)
    }
}
