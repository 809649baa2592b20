//! Persisted record types.
//!
//! These structs mirror the relational rows one-to-one. Behavior lives in
//! the domain crate; the store only reads and writes these shapes.

use chrono::{DateTime, NaiveDate, Utc};
use common::{
    CategoryId, CustomerType, DeliveryMethod, InvoiceId, OrderId, OrderNumber, OrderStatus,
    ProductId, UnitOfMeasure,
};
use rust_decimal::Decimal;

/// Product category. Categories own products; a category that still has
/// products cannot be deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog product.
///
/// `price_with_vat == price_without_vat + vat_amount` holds for every
/// stored row; `stock_quantity` never goes negative. Only order
/// confirmation and delivery intake touch the stock field.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub price_without_vat: Decimal,
    pub vat_amount: Decimal,
    pub price_with_vat: Decimal,
    pub unit: UnitOfMeasure,
    pub stock_quantity: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer order with its snapshot lines.
///
/// Orders are never physically deleted; cancellation sets the flag and
/// leaves the row in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_type: CustomerType,
    pub delivery_method: DeliveryMethod,
    pub status: OrderStatus,
    pub is_cancelled: bool,
    pub delivery_fee: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub customer: CustomerInfo,
    /// Lines in insertion order.
    pub items: Vec<OrderItem>,
}

/// Denormalized buyer snapshot attached one-to-one to an order.
///
/// Which fields are set depends on the customer type; all strings are
/// stored trimmed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerInfo {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company_name: Option<String>,
    pub tax_id: Option<String>,
    pub representative: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
}

/// One order line. Name, unit and the three price fields are snapshots
/// copied from the product at order time and never resynchronized.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price_without_vat: Decimal,
    pub vat_amount: Decimal,
    pub unit_price_with_vat: Decimal,
    pub unit: UnitOfMeasure,
}

/// Supplier delivery record.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: InvoiceId,
    pub supplier_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub entry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Lines in insertion order.
    pub items: Vec<InvoiceItem>,
}

/// One delivered line; recording it increments the product's stock.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceItem {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
}
