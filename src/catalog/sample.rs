//! Built-in sample products.

use crate::models::Product;

pub fn products() -> Vec<Product> {
    vec![
        Product::new(1, "Mechanical Keyboard", "peripherals", 89.99, 42),
        Product::new(2, "Wireless Mouse", "peripherals", 29.50, 120),
        Product::new(3, "27\" Monitor", "displays", 249.00, 15),
        Product::new(4, "USB-C Dock", "accessories", 119.95, 30),
        Product::new(5, "Noise Cancelling Headphones", "audio", 199.00, 25),
        Product::new(6, "Webcam 1080p", "peripherals", 59.99, 60),
        Product::new(7, "Portable SSD 1TB", "storage", 109.00, 48),
        Product::new(8, "Laptop Stand", "accessories", 39.90, 75),
        Product::new(9, "Desk Microphone", "audio", 79.00, 18),
        Product::new(10, "Ergonomic Chair", "furniture", 329.00, 8),
    ]
}
