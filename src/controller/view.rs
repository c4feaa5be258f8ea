use serde::Serialize;

use crate::model::{Product, StockStatus};
use crate::utils;

/// One table row, with every field already formatted for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: String,
    pub quantity: u32,
    pub delivery_fee: String,
    pub owner: String,
    pub margin: String,
    pub status: StockStatus,
    pub status_label: &'static str,
    pub status_class: &'static str,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        let status = p.stock_status();
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or("N/A")
                .to_string(),
            price: utils::format_currency(p.unit_price),
            quantity: p.quantity,
            delivery_fee: utils::format_currency(p.delivery_fee),
            owner: p
                .owner_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            margin: utils::format_margin(p.target_margin),
            status,
            status_label: status.label(),
            status_class: status.css_class(),
        }
    }
}

/// Snapshot of the visible page plus the pagination labels and button states.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageView {
    pub rows: Vec<ProductRow>,
    pub empty: bool,
    pub showing: usize,
    pub total: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_info: String,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    pub search_term: String,
}
