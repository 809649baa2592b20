use common::{InvalidEnumValue, OrderNumberError, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (category name, product name
    /// within a category, order number).
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    /// Order-number allocation failed (malformed stored number or the
    /// daily sequence is exhausted).
    #[error(transparent)]
    OrderNumber(#[from] OrderNumberError),

    /// A transactional operation referenced a product that does not exist.
    #[error("referenced product {0} does not exist")]
    UnknownProduct(ProductId),

    /// A stored integer does not map to a known enum variant.
    #[error("invalid stored value: {0}")]
    Decode(#[from] InvalidEnumValue),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
