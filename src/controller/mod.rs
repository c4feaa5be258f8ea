//! In-memory product list with search filtering and fixed-size pagination.

mod view;

pub use view::*;

use crate::model::Product;

pub const ITEMS_PER_PAGE: usize = 10;

pub fn total_pages_for(len: usize) -> usize {
    len.div_ceil(ITEMS_PER_PAGE).max(1)
}

/// Holds the fetched collection and the filtered view derived from it.
///
/// `filtered` is only ever rebuilt from `all` and `search_term`, and `current_page`
/// stays within `1..=total_pages()` after every operation.
#[derive(Clone, Debug)]
pub struct ProductListController {
    all: Vec<Product>,
    filtered: Vec<Product>,
    search_term: String,
    current_page: usize,
}

impl Default for ProductListController {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ProductListController {
    pub fn new(products: Vec<Product>) -> Self {
        let mut controller = Self {
            filtered: products.clone(),
            all: products,
            search_term: String::new(),
            current_page: 1,
        };
        controller.apply_filter();
        controller
    }

    pub fn all(&self) -> &[Product] {
        &self.all
    }

    pub fn filtered(&self) -> &[Product] {
        &self.filtered
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        total_pages_for(self.filtered.len())
    }

    pub fn find(&self, id: i64) -> Option<&Product> {
        self.all.iter().find(|p| p.id == id)
    }

    pub fn set_search_term(&mut self, term: &str) -> PageView {
        self.search_term = term.to_string();
        self.apply_filter();
        self.current_page = 1;
        self.render()
    }

    /// Moves by `delta` pages. Out-of-range moves leave the state untouched and return `None`.
    pub fn set_page(&mut self, delta: i64) -> Option<PageView> {
        let target = i64::try_from(self.current_page).ok()?.checked_add(delta)?;
        let target = usize::try_from(target).ok()?;
        self.go_to_page(target)
    }

    pub fn go_to_page(&mut self, page: usize) -> Option<PageView> {
        if page < 1 || page > self.total_pages() {
            return None;
        }
        self.current_page = page;
        Some(self.render())
    }

    pub fn replace_all(&mut self, products: Vec<Product>) -> PageView {
        self.all = products;
        self.apply_filter();
        self.current_page = self.current_page.clamp(1, self.total_pages());
        self.render()
    }

    pub fn clear(&mut self) {
        self.all.clear();
        self.filtered.clear();
        self.search_term.clear();
        self.current_page = 1;
    }

    pub fn render(&self) -> PageView {
        let total = self.filtered.len();
        let total_pages = self.total_pages();
        let start = ((self.current_page - 1) * ITEMS_PER_PAGE).min(total);
        let end = (start + ITEMS_PER_PAGE).min(total);
        let rows: Vec<ProductRow> = self.filtered[start..end]
            .iter()
            .map(ProductRow::from)
            .collect();

        PageView {
            empty: rows.is_empty(),
            showing: rows.len(),
            total,
            current_page: self.current_page,
            total_pages,
            page_info: format!("Page {} of {}", self.current_page, total_pages),
            prev_disabled: self.current_page == 1,
            next_disabled: self.current_page == total_pages || total_pages == 0,
            search_term: self.search_term.clone(),
            rows,
        }
    }

    fn apply_filter(&mut self) {
        let needle = self.search_term.to_lowercase();
        self.filtered = self
            .all
            .iter()
            .filter(|p| p.matches(&needle))
            .cloned()
            .collect();
    }
}
