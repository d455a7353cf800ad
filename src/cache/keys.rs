//! Cache key formats.
//!
//! These strings are visible to anyone inspecting the store and must stay
//! stable.

/// Key holding the full product list.
pub const PRODUCTS_KEY: &str = "products";

/// Key prefix for single-product snapshots.
const PRODUCT_PREFIX: &str = "product:";

/// Key holding one product snapshot: `product:<id>`.
pub fn product_key(id: &str) -> String {
    format!("{}{}", PRODUCT_PREFIX, id)
}
