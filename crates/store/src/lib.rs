//! Persistence layer for the order-management backend.
//!
//! Exposes the [`Store`] trait consumed by the domain engines, together
//! with two complete implementations:
//!
//! - [`PostgresStore`] — sqlx over PostgreSQL, with explicit transactions
//!   around every multi-row write, row locks for the confirmation
//!   check-and-decrement, and an advisory lock serializing order-number
//!   allocation per day prefix.
//! - [`InMemoryStore`] — a mutex-serialized map store used by unit and
//!   service tests and as a no-database fallback.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    Category, CustomerInfo, Invoice, InvoiceItem, Order, OrderItem, Product,
};
pub use store::{
    CategoryDelete, ConfirmApply, CreatedOrder, NewInvoice, NewOrder, ProductFilter, ShortageRow,
    StatusCounts, StockDemand, Store, TransitionApply,
};
