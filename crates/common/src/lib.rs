//! Shared kernel for the order-management backend.
//!
//! Holds the types every layer agrees on: typed identifiers, the wire
//! enums with their integer representation, the daily order-number
//! scheme, and pagination primitives. No I/O lives here.

pub mod enums;
pub mod order_number;
pub mod pagination;
pub mod types;

pub use enums::{CustomerType, DeliveryMethod, InvalidEnumValue, OrderStatus, UnitOfMeasure};
pub use order_number::{OrderNumber, OrderNumberError, MAX_SEQUENCE};
pub use pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use types::{CategoryId, InvoiceId, OrderId, ProductId};
