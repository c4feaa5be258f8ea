use colored::Colorize;

use crate::controller::{PageView, ProductRow};
use crate::model::StockStatus;

const HEADERS: [&str; 9] = [
    "ID",
    "Name",
    "Description",
    "Price",
    "Qty",
    "Delivery",
    "Owner",
    "Margin",
    "Status",
];

const MAX_DESCRIPTION: usize = 40;

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn cells(row: &ProductRow) -> [String; 9] {
    [
        row.id.to_string(),
        row.name.clone(),
        truncate(&row.description, MAX_DESCRIPTION),
        row.price.clone(),
        row.quantity.to_string(),
        row.delivery_fee.clone(),
        row.owner.clone(),
        row.margin.clone(),
        row.status_label.to_string(),
    ]
}

fn paint_status(padded: String, status: StockStatus) -> String {
    match status {
        StockStatus::OutOfStock => padded.red().bold().to_string(),
        StockStatus::LowStock => padded.yellow().to_string(),
        StockStatus::InStock => padded.green().to_string(),
    }
}

/// Renders the product table followed by the pagination footer.
pub fn render_table(view: &PageView) -> String {
    let mut out = String::new();

    if view.empty {
        out.push_str(&format!("  {}\n", "No products found".dimmed()));
        out.push('\n');
        out.push_str(&render_footer(view));
        return out;
    }

    let rows: Vec<[String; 9]> = view.rows.iter().map(cells).collect();
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    for row in rows.iter() {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let header = HEADERS
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<w$}", h, w = widths[i]))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&format!("  {}\n", header.bold()));

    for (cells, row) in rows.iter().zip(view.rows.iter()) {
        let mut line = Vec::with_capacity(cells.len());
        for (i, cell) in cells.iter().enumerate() {
            let padded = format!("{:<w$}", cell, w = widths[i]);
            if i == HEADERS.len() - 1 {
                line.push(paint_status(padded, row.status));
            } else {
                line.push(padded);
            }
        }
        out.push_str("  ");
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&render_footer(view));
    out
}

pub fn render_footer(view: &PageView) -> String {
    let prev = if view.prev_disabled {
        "< prev".dimmed().to_string()
    } else {
        "< prev".bold().to_string()
    };
    let next = if view.next_disabled {
        "next >".dimmed().to_string()
    } else {
        "next >".bold().to_string()
    };
    let mut out = format!(
        "  Showing {} of {} products · {}   {}  {}\n",
        view.showing, view.total, view.page_info, prev, next
    );
    if !view.search_term.is_empty() {
        out.push_str(&format!("  Filter: \"{}\"\n", view.search_term));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_values() {
        assert_eq!(truncate("Laptop", 10), "Laptop");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
