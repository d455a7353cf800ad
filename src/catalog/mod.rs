//! Product Catalog Module
//!
//! The slow data source the cache layer sits in front of.

mod sample;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::models::Product;

// == Catalog Error ==
/// Failures reported by a product source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No product has this identifier
    #[error("Product with ID {0} not found")]
    NotFound(String),

    /// The source could not answer
    #[error("Product source unavailable: {0}")]
    Unavailable(String),
}

// == Product Source Trait ==
/// Read access to the underlying product data.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetches every product.
    async fn fetch_all(&self) -> Result<Vec<Product>, CatalogError>;

    /// Fetches one product by its path identifier.
    async fn fetch_by_id(&self, id: &str) -> Result<Product, CatalogError>;
}

// == Simulated Catalog ==
/// In-process catalog that answers after a fixed artificial delay, so the
/// difference between cached and uncached responses is visible.
#[derive(Debug, Clone)]
pub struct SimulatedCatalog {
    products: Vec<Product>,
    latency: Duration,
}

impl SimulatedCatalog {
    /// Creates a catalog over the built-in sample products.
    pub fn new(latency: Duration) -> Self {
        Self::with_products(sample::products(), latency)
    }

    /// Creates a catalog over the given products.
    pub fn with_products(products: Vec<Product>, latency: Duration) -> Self {
        Self { products, latency }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            debug!(latency_ms = self.latency.as_millis() as u64, "Simulating slow fetch");
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ProductSource for SimulatedCatalog {
    async fn fetch_all(&self) -> Result<Vec<Product>, CatalogError> {
        self.simulate_latency().await;
        Ok(self.products.clone())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Product, CatalogError> {
        self.simulate_latency().await;

        let wanted: u32 = id
            .trim()
            .parse()
            .map_err(|_| CatalogError::NotFound(id.to_string()))?;

        self.products
            .iter()
            .find(|product| product.id == wanted)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }
}
