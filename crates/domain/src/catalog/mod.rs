//! Catalog management: categories and products.

mod request;
mod service;

pub use request::{CategoryRequest, ProductInput};
pub use service::CatalogService;

use store::Product;

/// A product together with its resolved category name, as listings and
/// detail views present it.
#[derive(Debug, Clone)]
pub struct ProductWithCategory {
    pub product: Product,
    pub category_name: String,
}
