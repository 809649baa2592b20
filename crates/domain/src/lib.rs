//! Domain layer for the order-management backend.
//!
//! This crate provides the engines behind the operation surface:
//! - the order lifecycle engine (create, confirm, complete, cancel,
//!   delivery fee) with its validation sequence and derived totals
//! - the delivery intake engine restocking inventory from supplier
//!   invoices
//! - catalog and category management
//! - the read-only query/reporting operations
//!
//! Engines are generic over [`store::Store`] and hold no state of their
//! own; every multi-row write happens inside the store's transactional
//! operations.

pub mod catalog;
pub mod delivery;
pub mod error;
pub mod order;

pub use catalog::{CatalogService, CategoryRequest, ProductInput, ProductWithCategory};
pub use delivery::{
    DeliveryLine, DeliveryLineRequest, DeliveryService, InvoiceDetail, InvoiceSummary,
    RecordDeliveryRequest, RecordedDelivery,
};
pub use error::{DomainError, Result};
pub use order::{
    line_totals, order_totals, ConfirmOutcome, CreateOrderRequest, CustomerDetails, LineTotals,
    OrderLineRequest, OrderStats, OrderService, OrderTotals,
};
