//! Order lifecycle engine and related types.

mod request;
mod service;
mod totals;

pub use request::{CreateOrderRequest, CustomerDetails, OrderLineRequest};
pub use service::OrderService;
pub use totals::{line_totals, order_totals, LineTotals, OrderTotals};

use common::OrderNumber;
use store::ShortageRow;

/// Outcome of confirming an order.
///
/// Insufficient stock is an expected business outcome, not an error: the
/// caller renders the shortage lines as actionable feedback. The order is
/// left untouched in that case.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    /// Stock was decremented and the order moved to Confirmed.
    Confirmed { order_number: OrderNumber },
    /// One or more lines lacked stock; every short line is reported.
    StockShortage(Vec<ShortageRow>),
}

/// Dashboard counters: active products plus non-cancelled orders per
/// lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderStats {
    pub total_products: i64,
    pub pending_orders: i64,
    pub confirmed_orders: i64,
    pub completed_orders: i64,
}
