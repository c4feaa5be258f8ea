use serde::{Deserialize, Deserializer, Serialize};

/// Inventory item as returned by `GET /products`.
///
/// Absent and `null` values both decode to the field's default.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "product_name", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "original_price", default, deserialize_with = "null_as_default")]
    pub unit_price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delivery_fee: f64,
    #[serde(rename = "user_id", default)]
    pub owner_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_margin: f64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Product {
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(self.quantity)
    }

    pub fn matches(&self, needle_lower: &str) -> bool {
        if needle_lower.is_empty() {
            return true;
        }
        if self.name.to_lowercase().contains(needle_lower) {
            return true;
        }
        self.description
            .as_deref()
            .map(|d| d.to_lowercase().contains(needle_lower))
            .unwrap_or(false)
    }
}

/// Payload for `POST /products`, sent wrapped under a `product` key.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProductDraft {
    #[serde(rename = "product_name")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "original_price")]
    pub unit_price: f64,
    pub quantity: u32,
    pub delivery_fee: f64,
    pub target_margin: f64,
}

/// Partial update for `PATCH /products/:id`. Unset fields are left out of the body.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProductPatch {
    #[serde(rename = "product_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "original_price", skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_margin: Option<f64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.unit_price.is_none()
            && self.quantity.is_none()
            && self.delivery_fee.is_none()
            && self.target_margin.is_none()
    }
}

pub const LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    pub fn from_quantity(quantity: u32) -> Self {
        match quantity {
            0 => Self::OutOfStock,
            q if q < LOW_STOCK_THRESHOLD => Self::LowStock,
            _ => Self::InStock,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OutOfStock => "Out of Stock",
            Self::LowStock => "Low Stock",
            Self::InStock => "In Stock",
        }
    }

    /// CSS class for the status badge, exposed in JSON output.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::OutOfStock => "status-out",
            Self::LowStock => "status-low",
            Self::InStock => "status-available",
        }
    }
}
