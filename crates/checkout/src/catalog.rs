//! Read-only product catalog port.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::money::Money;

/// Catalog key of a product (e.g. "SKU-001").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A product as the catalog currently lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub unit_price: Money,
    #[serde(default = "available_by_default")]
    pub available: bool,
}

fn available_by_default() -> bool {
    true
}

impl Product {
    pub fn new(id: impl Into<ProductId>, title: impl Into<String>, unit_price: Money) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            unit_price,
            available: true,
        }
    }

    /// Marks the product as not currently sold.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Rejects a negative price or one above [`MAX_UNIT_PRICE`].
    pub fn check_price(&self) -> Result<(), CatalogError> {
        if self.unit_price.is_negative() || self.unit_price > max_unit_price() {
            return Err(CatalogError::InvalidPrice {
                product_id: self.id.clone(),
                unit_price: self.unit_price,
            });
        }
        Ok(())
    }
}

/// Largest unit price the catalog may list, in cents: ten digits, two of
/// them fractional.
pub const MAX_UNIT_PRICE: i64 = 99_999_999_99;

fn max_unit_price() -> Money {
    Money::from_cents(MAX_UNIT_PRICE)
}

/// Errors reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    #[error("Product {product_id} has an invalid price: {unit_price}")]
    InvalidPrice {
        product_id: ProductId,
        unit_price: Money,
    },

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of product identity, title, price and availability.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetches a product by id.
    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError>;
}

/// Catalog held in memory, optionally seeded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    /// Loads a JSON array of products.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let products: Vec<Product> = serde_json::from_slice(&bytes)?;
        for product in &products {
            product.check_price()?;
        }
        tracing::info!(
            path = %path.as_ref().display(),
            products = products.len(),
            "loaded catalog"
        );
        Ok(Self::with_products(products))
    }

    /// Inserts or replaces a product.
    pub async fn insert(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.products
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }
}

#[async_trait]
impl<C: ProductCatalog + ?Sized> ProductCatalog for Arc<C> {
    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        (**self).get_product(id).await
    }
}
