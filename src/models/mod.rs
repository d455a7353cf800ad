//! Response models for the HTTP surface
//!
//! Defines the product resource and the bodies of successful responses.

pub mod product;
pub mod responses;

// Re-export commonly used types
pub use product::Product;
pub use responses::{HealthResponse, HomeResponse, OrderResponse, ProductsResponse};
