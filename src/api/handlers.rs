//! API Handlers
//!
//! HTTP request handlers behind the rate limiting and cache gate stages.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::{product_key, CacheGate, Invalidator, PRODUCTS_KEY};
use crate::catalog::{ProductSource, SimulatedCatalog};
use crate::config::Config;
use crate::error::Result;
use crate::limiter::RateLimiter;
use crate::models::{HealthResponse, HomeResponse, OrderResponse, Product, ProductsResponse};
use crate::store::KvStore;

/// Application state shared across all handlers and pipeline stages.
///
/// Every component holds the same injected store; none keeps request
/// state of its own.
#[derive(Clone)]
pub struct AppState {
    /// Fixed-window rate limiter
    pub limiter: RateLimiter,
    /// Cache gate and populator
    pub cache: CacheGate,
    /// Snapshot invalidation for mutating routes
    pub invalidator: Invalidator,
    /// Slow data source
    pub catalog: Arc<dyn ProductSource>,
    /// Runtime configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState with every component sharing `store`.
    pub fn new(store: Arc<dyn KvStore>, catalog: Arc<dyn ProductSource>, config: Config) -> Self {
        Self {
            limiter: RateLimiter::new(store.clone()),
            cache: CacheGate::new(store.clone()),
            invalidator: Invalidator::new(store),
            catalog,
            config: Arc::new(config),
        }
    }

    /// Creates a new AppState from configuration over the simulated catalog.
    pub fn from_config(store: Arc<dyn KvStore>, config: Config) -> Self {
        let catalog = Arc::new(SimulatedCatalog::new(config.upstream_latency()));
        Self::new(store, catalog, config)
    }
}

/// Handler for GET /
pub async fn home_handler() -> Json<HomeResponse> {
    Json(HomeResponse::describe())
}

/// Handler for GET /products
///
/// Runs only on a cache miss; fetches the full list and caches it.
pub async fn products_handler(State(state): State<AppState>) -> Result<Json<ProductsResponse>> {
    let products = state.catalog.fetch_all().await?;
    info!(count = products.len(), "Fetched products from catalog");

    state
        .cache
        .populate(PRODUCTS_KEY, &products, state.config.cache_ttl)
        .await;

    Ok(Json(ProductsResponse { products }))
}

/// Handler for GET /product/:id
///
/// Runs only on a cache miss; fetches one product and caches it.
pub async fn product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = state.catalog.fetch_by_id(&id).await?;
    info!(product_id = %id, "Fetched product from catalog");

    state
        .cache
        .populate(&product_key(&id), &product, state.config.cache_ttl)
        .await;

    Ok(Json(product))
}

/// Handler for GET /order/:id
///
/// The product's snapshot is deleted before the confirmation is sent.
pub async fn order_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>> {
    state.invalidator.invalidate(&product_key(&id)).await?;
    info!(product_id = %id, "Order placed, cache invalidated");

    Ok(Json(OrderResponse::placed(&id)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn state() -> (AppState, MemoryStore) {
        let store = MemoryStore::new();
        let catalog = Arc::new(SimulatedCatalog::new(Duration::ZERO));
        (
            AppState::new(Arc::new(store.clone()), catalog, Config::default()),
            store,
        )
    }

    #[tokio::test]
    async fn test_products_handler_populates_cache() {
        let (state, store) = state();

        let response = products_handler(State(state)).await.unwrap();
        assert!(!response.products.is_empty());

        let cached = store.get(PRODUCTS_KEY).await.unwrap().unwrap();
        let restored: Vec<Product> = serde_json::from_str(&cached).unwrap();
        assert_eq!(restored, response.products);
    }

    #[tokio::test]
    async fn test_product_handler_populates_cache() {
        let (state, store) = state();

        let response = product_handler(State(state), Path("4".to_string()))
            .await
            .unwrap();
        assert_eq!(response.id, 4);
        assert!(store.get("product:4").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_product_handler_not_found() {
        let (state, store) = state();

        let result = product_handler(State(state), Path("404".to_string())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(store.get("product:404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_order_handler_invalidates() {
        let (state, store) = state();
        store.set_ex("product:2", "{\"id\":2}", 20).await.unwrap();

        let response = order_handler(State(state), Path("2".to_string()))
            .await
            .unwrap();
        assert!(response.success);
        assert!(store.get("product:2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
