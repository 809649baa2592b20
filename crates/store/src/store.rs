//! The store trait and the transactional inputs/outcomes it speaks.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{
    CategoryId, CustomerType, DeliveryMethod, InvoiceId, OrderId, OrderNumber, OrderStatus, Page,
    PageRequest, ProductId, UnitOfMeasure,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::records::{Category, CustomerInfo, Invoice, InvoiceItem, Order, OrderItem, Product};
use crate::Result;

/// Input for order creation. Item snapshots are already taken by the
/// caller; the store allocates the order number and persists everything
/// as one atomic unit.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_type: CustomerType,
    pub delivery_method: DeliveryMethod,
    pub customer: CustomerInfo,
    pub items: Vec<OrderItem>,
}

/// Identity handed back after a successful order insert.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub id: OrderId,
    pub order_number: OrderNumber,
}

/// Input for delivery intake. `entry_date` is stamped by the store from
/// the `now` argument.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub supplier_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub items: Vec<InvoiceItem>,
}

/// Per-product quantity an order confirmation wants to take from stock.
/// Quantities are aggregated per product by the caller.
#[derive(Debug, Clone)]
pub struct StockDemand {
    pub product_id: ProductId,
    pub quantity: Decimal,
}

/// One insufficient line discovered during confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortageRow {
    pub product_id: ProductId,
    pub product_name: String,
    pub ordered: Decimal,
    pub available: Decimal,
    pub unit: UnitOfMeasure,
}

/// Outcome of the atomic confirmation check-and-decrement.
#[derive(Debug, Clone)]
pub enum ConfirmApply {
    /// All lines had stock; decrements and the status change committed.
    Applied,
    /// At least one line was short. Nothing was written; every short line
    /// is reported.
    InsufficientStock(Vec<ShortageRow>),
    /// The order was not Pending (or was cancelled) when re-checked
    /// inside the transaction.
    InvalidState {
        status: OrderStatus,
        is_cancelled: bool,
    },
    /// No order with that id.
    NotFound,
}

/// Outcome of a conditional lifecycle transition (complete, cancel).
#[derive(Debug, Clone)]
pub enum TransitionApply {
    Applied,
    InvalidState {
        status: OrderStatus,
        is_cancelled: bool,
    },
    NotFound,
}

/// Outcome of a category delete.
#[derive(Debug, Clone)]
pub enum CategoryDelete {
    Deleted,
    /// The category still owns this many products.
    HasProducts(i64),
    NotFound,
}

/// Filters for the paginated product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    /// Case-insensitive name substring.
    pub search: Option<String>,
    pub include_inactive: bool,
}

/// Non-cancelled order counts per lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
}

/// Persistence operations consumed by the domain engines.
///
/// Every method that writes more than one row is atomic: it either fully
/// commits or leaves the store unchanged. The check-then-act sequences
/// (order-number allocation, confirmation stock check) are serialized by
/// each implementation; see the module docs of [`crate::postgres`] and
/// [`crate::memory`].
#[async_trait]
pub trait Store: Send + Sync {
    // -- categories --

    /// Inserts a category. Fails with `Duplicate` when the name is taken.
    async fn insert_category(&self, category: Category) -> Result<()>;

    /// Renames a category. Returns the updated record, or `None` when the
    /// id does not exist. Fails with `Duplicate` when the name is taken.
    async fn rename_category(
        &self,
        id: CategoryId,
        name: String,
        now: DateTime<Utc>,
    ) -> Result<Option<Category>>;

    /// Deletes a category unless it still owns products.
    async fn delete_category(&self, id: CategoryId) -> Result<CategoryDelete>;

    async fn category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// All categories ordered by name, each with its product count.
    async fn categories(&self) -> Result<Vec<(Category, i64)>>;

    // -- products --

    /// Inserts or fully replaces a product row by id. Fails with
    /// `Duplicate` when another product in the same category has the name.
    async fn save_product(&self, product: &Product) -> Result<()>;

    async fn product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Current records for the given ids; absent ids are simply missing
    /// from the map.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>>;

    /// Paginated product listing ordered by name.
    async fn products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>>;

    /// Active products with stock at or below the threshold, ascending by
    /// stock.
    async fn low_stock_products(&self, threshold: Decimal) -> Result<Vec<Product>>;

    async fn active_product_count(&self) -> Result<i64>;

    // -- orders --

    /// Allocates the next order number for `day` and persists the order,
    /// its customer snapshot and its items in one transaction. Number
    /// allocation is serialized per day prefix, so concurrent creates get
    /// distinct consecutive numbers.
    async fn insert_order(
        &self,
        order: NewOrder,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<CreatedOrder>;

    /// Full order with customer snapshot and items.
    async fn order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Paginated listing, most recent first, optionally filtered by
    /// status.
    async fn orders(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<Order>>;

    /// The most recently created orders, up to `limit`.
    async fn recent_orders(&self, limit: i64) -> Result<Vec<Order>>;

    async fn order_status_counts(&self) -> Result<StatusCounts>;

    /// Atomically re-checks that the order is still Pending and not
    /// cancelled, locks the demanded product rows, and either applies all
    /// stock decrements together with the Confirmed status change or
    /// reports every short line and changes nothing.
    async fn apply_confirmation(
        &self,
        id: OrderId,
        demands: &[StockDemand],
        now: DateTime<Utc>,
    ) -> Result<ConfirmApply>;

    /// Conditionally moves a Confirmed, non-cancelled order to Completed.
    async fn apply_completion(&self, id: OrderId, now: DateTime<Utc>) -> Result<TransitionApply>;

    /// Conditionally sets the cancelled flag on a Pending, non-cancelled
    /// order. The status itself is left untouched.
    async fn apply_cancellation(&self, id: OrderId, now: DateTime<Utc>) -> Result<TransitionApply>;

    /// Sets the delivery fee. Returns false when the order id does not
    /// exist. Preconditions (delivery method, fee sign, not cancelled) are
    /// the caller's responsibility.
    async fn set_delivery_fee(
        &self,
        id: OrderId,
        fee: Decimal,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    // -- invoices / deliveries --

    /// Persists the invoice with its items and increments each referenced
    /// product's stock, all in one transaction.
    async fn insert_invoice(&self, invoice: NewInvoice, now: DateTime<Utc>) -> Result<InvoiceId>;

    async fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>>;

    /// Paginated listing ordered by entry date, most recent first.
    async fn invoices(&self, page: PageRequest) -> Result<Page<Invoice>>;
}
