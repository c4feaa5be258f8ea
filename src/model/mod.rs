mod product;
mod user;

pub use product::*;
pub use user::*;

/// Wraps a payload under a single top-level key, e.g. `{"product": {...}}`.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ProductEnvelope<'a, T> {
    pub product: &'a T,
}

/// Catalogue shown by `--demo` runs.
pub fn demo_products() -> Vec<Product> {
    let entry = |id: i64,
                 name: &str,
                 description: &str,
                 price: f64,
                 quantity: u32,
                 fee: f64,
                 margin: f64| Product {
        id,
        name: name.to_string(),
        description: Some(description.to_string()),
        unit_price: price,
        quantity,
        delivery_fee: fee,
        owner_id: Some(1),
        target_margin: margin,
    };
    vec![
        entry(1, "Laptop", "High-performance laptop with 16GB RAM", 899.99, 15, 29.99, 20.0),
        entry(2, "Smartphone", "Latest model with 128GB storage", 699.99, 8, 19.99, 25.0),
        entry(
            3,
            "Wireless Headphones",
            "Noise-cancelling bluetooth headphones",
            199.99,
            0,
            9.99,
            30.0,
        ),
        entry(
            4,
            "Mechanical Keyboard",
            "RGB mechanical keyboard with blue switches",
            129.99,
            22,
            14.99,
            15.0,
        ),
        entry(
            5,
            "Gaming Mouse",
            "High DPI gaming mouse with customizable buttons",
            79.99,
            30,
            9.99,
            20.0,
        ),
    ]
}
