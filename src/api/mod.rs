//! API Module
//!
//! HTTP handlers, pipeline stages and routing.
//!
//! # Endpoints
//! - `GET /` - Service description
//! - `GET /products` - All products, cached
//! - `GET /product/:id` - One product, cached per id
//! - `GET /order/:id` - Place an order, invalidates the product's snapshot
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
