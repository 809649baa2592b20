//! HTTP route handlers.

pub mod categories;
pub mod health;
pub mod invoices;
pub mod metrics;
pub mod orders;
pub mod products;

use common::Page;
use serde::Serialize;

/// Paging envelope shared by all listings.
#[derive(Serialize)]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> PageDto<T> {
    pub fn from_page<U>(page: Page<U>, f: impl FnMut(U) -> T) -> Self {
        let items = page.items.into_iter().map(f).collect();
        Self {
            items,
            total_count: page.total_count,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
        }
    }
}
