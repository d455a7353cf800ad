//! Product model
//!
//! The resource served by the catalog and cached as JSON snapshots.

use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Numeric identifier used in `/product/:id`
    pub id: u32,
    pub name: String,
    pub category: String,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub stock: u32,
}

impl Product {
    /// Creates a new Product
    pub fn new(
        id: u32,
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        stock: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            price,
            stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_snapshot_round_trip() {
        let product = Product::new(7, "Portable SSD 1TB", "storage", 109.0, 48);

        let snapshot = serde_json::to_string(&product).unwrap();
        let restored: Product = serde_json::from_str(&snapshot).unwrap();

        assert_eq!(restored, product);
    }
}
