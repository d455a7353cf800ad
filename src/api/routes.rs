//! API Routes
//!
//! Configures the Axum router and the per-route pipeline:
//! rate limiter, then cache gate, then handler.

use std::collections::HashMap;

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, home_handler, order_handler, product_handler, products_handler, AppState,
};
use super::middleware::{
    named_cache_gate, parametric_cache_gate, rate_limit, redact_server_errors, response_time,
    NamedCache, ParametricCache, RouteLimit,
};
use crate::cache::{product_key, PRODUCTS_KEY};
use crate::limiter::RateLimitRule;

// == Route Limits ==
pub const HOME_LIMIT: RateLimitRule = RateLimitRule::new("home", 30, 300);
pub const PRODUCTS_LIMIT: RateLimitRule = RateLimitRule::new("products", 5, 20);
pub const PRODUCT_LIMIT: RateLimitRule = RateLimitRule::new("product", 5, 20);
pub const ORDER_LIMIT: RateLimitRule = RateLimitRule::new("order", 5, 20);

fn product_id_key(params: &HashMap<String, String>) -> Option<String> {
    params.get("id").map(|id| product_key(id))
}

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /` - Service description (rate limited)
/// - `GET /products` - All products (rate limited, cached under `products`)
/// - `GET /product/:id` - One product (rate limited, cached under `product:<id>`)
/// - `GET /order/:id` - Place an order (rate limited, invalidates `product:<id>`)
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Per route: rate limiter runs before the cache gate
/// - Error redaction: hides 5xx details outside development
/// - Response timing: `X-Response-Time` header and a log line
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let limiter = state.limiter.clone();
    let limited = move |rule: RateLimitRule| {
        middleware::from_fn_with_state(RouteLimit::new(limiter.clone(), rule), rate_limit)
    };

    let products_gate = middleware::from_fn_with_state(
        NamedCache::new(state.cache.clone(), PRODUCTS_KEY),
        named_cache_gate,
    );
    let product_gate = middleware::from_fn_with_state(
        ParametricCache::new(state.cache.clone(), product_id_key),
        parametric_cache_gate,
    );
    let redaction = middleware::from_fn_with_state(state.config.clone(), redact_server_errors);

    // The last layer added runs first
    Router::new()
        .route("/", get(home_handler).layer(limited(HOME_LIMIT)))
        .route(
            "/products",
            get(products_handler)
                .layer(products_gate)
                .layer(limited(PRODUCTS_LIMIT)),
        )
        .route(
            "/product/:id",
            get(product_handler)
                .layer(product_gate)
                .layer(limited(PRODUCT_LIMIT)),
        )
        .route("/order/:id", get(order_handler).layer(limited(ORDER_LIMIT)))
        .route("/health", get(health_handler))
        .layer(redaction)
        .layer(middleware::from_fn(response_time))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SimulatedCatalog;
    use crate::config::Config;
    use crate::store::MemoryStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let store = Arc::new(MemoryStore::new());
        let catalog = Arc::new(SimulatedCatalog::new(Duration::ZERO));
        create_router(AppState::new(store, catalog, Config::default()))
    }

    #[test]
    fn test_product_id_key() {
        let mut params = HashMap::new();
        params.insert("id".to_string(), "12".to_string());
        assert_eq!(product_id_key(&params).as_deref(), Some("product:12"));
        assert_eq!(product_id_key(&HashMap::new()), None);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-ratelimit-limit").is_none());
        assert!(response.headers().get("x-response-time").is_some());
    }

    #[tokio::test]
    async fn test_home_endpoint_is_rate_limited() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "30");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "29");
        assert_eq!(response.headers()["x-ratelimit-reset"], "300");
    }

    #[tokio::test]
    async fn test_product_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/product/9999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-cache-status"], "MISS");
    }
}
