use chrono::{NaiveDate, Utc};
use common::{
    CustomerType, DeliveryMethod, OrderId, OrderNumber, OrderStatus, ProductId, UnitOfMeasure,
};
use criterion::{criterion_group, criterion_main, Criterion};
use domain::order_totals;
use rust_decimal::Decimal;
use std::hint::black_box;
use store::{CustomerInfo, Order, OrderItem};

fn sample_order(lines: usize) -> Order {
    let now = Utc::now();
    let items = (0..lines)
        .map(|i| OrderItem {
            product_id: ProductId::new(),
            product_name: format!("Product {i}"),
            quantity: Decimal::new(25, 1),
            unit_price_without_vat: Decimal::new(1000 + i as i64, 2),
            vat_amount: Decimal::new(200, 2),
            unit_price_with_vat: Decimal::new(1200 + i as i64, 2),
            unit: UnitOfMeasure::ByWeight,
        })
        .collect();
    Order {
        id: OrderId::new(),
        order_number: OrderNumber::from_stored("NSI-20260807-0001".to_string()),
        customer_type: CustomerType::Individual,
        delivery_method: DeliveryMethod::Pickup,
        status: OrderStatus::Pending,
        is_cancelled: false,
        delivery_fee: Some(Decimal::new(1500, 2)),
        created_at: now,
        confirmed_at: None,
        completed_at: None,
        updated_at: now,
        customer: CustomerInfo::default(),
        items,
    }
}

fn bench_order_totals(c: &mut Criterion) {
    let order = sample_order(25);
    c.bench_function("order_totals_25_lines", |b| {
        b.iter(|| order_totals(black_box(&order)))
    });
}

fn bench_order_number_allocation(c: &mut Criterion) {
    let day = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
    let last = OrderNumber::from_parts(day, 4321).unwrap();
    c.bench_function("next_order_number", |b| {
        b.iter(|| OrderNumber::next_for_day(black_box(day), black_box(Some(last.as_str()))))
    });
}

criterion_group!(benches, bench_order_totals, bench_order_number_allocation);
criterion_main!(benches);
