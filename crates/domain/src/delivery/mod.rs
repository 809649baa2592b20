//! Delivery intake engine: supplier invoices that restock inventory.

mod request;
mod service;

pub use request::{DeliveryLineRequest, RecordDeliveryRequest};
pub use service::DeliveryService;

use chrono::{DateTime, NaiveDate, Utc};
use common::{InvoiceId, ProductId, UnitOfMeasure};
use rust_decimal::Decimal;
use store::Invoice;

/// Confirmation returned after a delivery is recorded.
#[derive(Debug, Clone)]
pub struct RecordedDelivery {
    pub id: InvoiceId,
    pub supplier_name: String,
    pub invoice_number: String,
}

/// Listing row for a recorded delivery, with aggregates derived from its
/// lines.
#[derive(Debug, Clone)]
pub struct InvoiceSummary {
    pub id: InvoiceId,
    pub supplier_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub entry_date: DateTime<Utc>,
    pub total_items: usize,
    pub total_quantity: Decimal,
    pub invoice_total: Decimal,
}

impl InvoiceSummary {
    pub(crate) fn from_invoice(invoice: Invoice) -> Self {
        let total_quantity = invoice.items.iter().map(|i| i.quantity).sum();
        let invoice_total = invoice
            .items
            .iter()
            .map(|i| i.quantity * i.purchase_price)
            .sum();
        Self {
            id: invoice.id,
            supplier_name: invoice.supplier_name,
            invoice_number: invoice.invoice_number,
            invoice_date: invoice.invoice_date,
            entry_date: invoice.entry_date,
            total_items: invoice.items.len(),
            total_quantity,
            invoice_total,
        }
    }
}

/// One line of a delivery detail view, with the product name and unit
/// resolved from the catalog.
#[derive(Debug, Clone)]
pub struct DeliveryLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit: UnitOfMeasure,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub row_total: Decimal,
}

/// Full delivery detail.
#[derive(Debug, Clone)]
pub struct InvoiceDetail {
    pub id: InvoiceId,
    pub supplier_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub entry_date: DateTime<Utc>,
    pub lines: Vec<DeliveryLine>,
    pub invoice_total: Decimal,
}
