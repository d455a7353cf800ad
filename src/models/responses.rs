//! Response DTOs for the HTTP surface
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

use super::Product;

/// Response body for `GET /products`.
///
/// Same shape as a cache hit on the `products` key, so clients cannot tell
/// the two apart except by the cache status header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

/// Response body for `GET /order/:id`
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    /// Always true; failures are reported as errors
    pub success: bool,
    /// Confirmation message
    pub message: String,
    /// Whether the product's cached snapshot was dropped
    pub cache_invalidated: bool,
    /// Order time in RFC 3339 format
    pub placed_at: String,
}

impl OrderResponse {
    /// Creates a confirmation for an order on `product_id`.
    pub fn placed(product_id: &str) -> Self {
        Self {
            success: true,
            message: format!("Order placed successfully for product ID: {}", product_id),
            cache_invalidated: true,
            placed_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for `GET /`
#[derive(Debug, Clone, Serialize)]
pub struct HomeResponse {
    /// Service name
    pub service: String,
    /// Available endpoints
    pub endpoints: Vec<String>,
}

impl HomeResponse {
    /// Describes this service.
    pub fn describe() -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            endpoints: vec![
                "GET /products".to_string(),
                "GET /product/:id".to_string(),
                "GET /order/:id".to_string(),
                "GET /health".to_string(),
            ],
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_response_serialize() {
        let resp = OrderResponse::placed("3");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["cache_invalidated"], true);
        assert!(json["message"].as_str().unwrap().ends_with("product ID: 3"));
        assert!(json["placed_at"].is_string());
    }

    #[test]
    fn test_home_response_lists_endpoints() {
        let resp = HomeResponse::describe();
        assert!(resp.endpoints.iter().any(|e| e == "GET /products"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
