//! Derived order totals.
//!
//! Totals are computed on read from the snapshot fields and are never
//! stored.

use rust_decimal::Decimal;
use store::{Order, OrderItem};

/// Row totals for one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTotals {
    pub without_vat: Decimal,
    pub vat: Decimal,
    pub with_vat: Decimal,
}

/// Quantity × unit price, for each of the three price fields.
pub fn line_totals(item: &OrderItem) -> LineTotals {
    LineTotals {
        without_vat: item.quantity * item.unit_price_without_vat,
        vat: item.quantity * item.vat_amount,
        with_vat: item.quantity * item.unit_price_with_vat,
    }
}

/// Order-level totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal_without_vat: Decimal,
    pub total_vat: Decimal,
    pub subtotal_with_vat: Decimal,
    /// Subtotal with VAT plus the delivery fee (zero when unset).
    pub grand_total: Decimal,
}

/// Sums the line rows and adds the delivery fee.
pub fn order_totals(order: &Order) -> OrderTotals {
    let mut subtotal_without_vat = Decimal::ZERO;
    let mut total_vat = Decimal::ZERO;
    let mut subtotal_with_vat = Decimal::ZERO;
    for item in &order.items {
        let line = line_totals(item);
        subtotal_without_vat += line.without_vat;
        total_vat += line.vat;
        subtotal_with_vat += line.with_vat;
    }
    OrderTotals {
        subtotal_without_vat,
        total_vat,
        subtotal_with_vat,
        grand_total: subtotal_with_vat + order.delivery_fee.unwrap_or(Decimal::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{
        CustomerType, DeliveryMethod, OrderId, OrderNumber, OrderStatus, ProductId, UnitOfMeasure,
    };
    use store::CustomerInfo;

    fn item(quantity: Decimal, without_vat: i64, vat: i64) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(),
            product_name: "Granite slab".to_string(),
            quantity,
            unit_price_without_vat: Decimal::new(without_vat, 2),
            vat_amount: Decimal::new(vat, 2),
            unit_price_with_vat: Decimal::new(without_vat + vat, 2),
            unit: UnitOfMeasure::ByArea,
        }
    }

    fn order(items: Vec<OrderItem>, delivery_fee: Option<Decimal>) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(),
            order_number: OrderNumber::from_stored("NSI-20260807-0001".to_string()),
            customer_type: CustomerType::Individual,
            delivery_method: DeliveryMethod::Pickup,
            status: OrderStatus::Pending,
            is_cancelled: false,
            delivery_fee,
            created_at: now,
            confirmed_at: None,
            completed_at: None,
            updated_at: now,
            customer: CustomerInfo::default(),
            items,
        }
    }

    #[test]
    fn line_totals_multiply_by_quantity() {
        let totals = line_totals(&item(Decimal::new(25, 1), 1000, 200)); // 2.5 × 10.00/2.00/12.00
        assert_eq!(totals.without_vat, Decimal::new(2500, 2));
        assert_eq!(totals.vat, Decimal::new(500, 2));
        assert_eq!(totals.with_vat, Decimal::new(3000, 2));
    }

    #[test]
    fn order_totals_sum_lines() {
        let order = order(
            vec![
                item(Decimal::from(2), 1000, 200),
                item(Decimal::from(3), 500, 100),
            ],
            None,
        );
        let totals = order_totals(&order);
        assert_eq!(totals.subtotal_without_vat, Decimal::new(3500, 2));
        assert_eq!(totals.total_vat, Decimal::new(700, 2));
        assert_eq!(totals.subtotal_with_vat, Decimal::new(4200, 2));
        assert_eq!(totals.grand_total, Decimal::new(4200, 2));
    }

    #[test]
    fn grand_total_includes_delivery_fee() {
        let order = order(
            vec![item(Decimal::from(1), 1000, 200)],
            Some(Decimal::new(1550, 2)),
        );
        let totals = order_totals(&order);
        assert_eq!(totals.subtotal_with_vat, Decimal::new(1200, 2));
        assert_eq!(totals.grand_total, Decimal::new(2750, 2));
    }

    #[test]
    fn empty_order_totals_are_zero() {
        let totals = order_totals(&order(vec![], None));
        assert_eq!(totals.grand_total, Decimal::ZERO);
    }
}
