//! Cross-engine integration tests over the in-memory store: order
//! lifecycle, delivery intake and the reporting views working together.

use chrono::Utc;
use common::{CustomerType, DeliveryMethod, OrderStatus, PageRequest, ProductId};
use domain::{
    CatalogService, CategoryRequest, ConfirmOutcome, CreateOrderRequest, CustomerDetails,
    DeliveryLineRequest, DeliveryService, DomainError, OrderLineRequest, OrderService,
    ProductInput, RecordDeliveryRequest,
};
use rust_decimal::Decimal;
use store::InMemoryStore;

struct Backend {
    orders: OrderService<InMemoryStore>,
    deliveries: DeliveryService<InMemoryStore>,
    catalog: CatalogService<InMemoryStore>,
}

fn backend() -> Backend {
    let store = InMemoryStore::new();
    Backend {
        orders: OrderService::new(store.clone()),
        deliveries: DeliveryService::new(store.clone()),
        catalog: CatalogService::new(store),
    }
}

async fn seed_product(backend: &Backend, name: &str, stock: Decimal) -> ProductId {
    let category_id = backend
        .catalog
        .create_category(CategoryRequest {
            name: format!("Category for {name}"),
        })
        .await
        .unwrap()
        .id;
    backend
        .catalog
        .create_product(ProductInput {
            name: name.to_string(),
            description: None,
            category_id,
            price_without_vat: Decimal::new(1000, 2),
            vat_amount: Decimal::new(200, 2),
            price_with_vat: Decimal::new(1200, 2),
            unit: common::UnitOfMeasure::ByWeight,
            stock_quantity: stock,
        })
        .await
        .unwrap()
        .product
        .id
}

fn order_request(product_id: ProductId, quantity: Decimal) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_type: CustomerType::Individual,
        delivery_method: DeliveryMethod::Pickup,
        customer: CustomerDetails {
            full_name: Some("Maria Petrova".to_string()),
            phone: Some("+359888123456".to_string()),
            ..CustomerDetails::default()
        },
        items: vec![OrderLineRequest {
            product_id,
            quantity,
        }],
    }
}

#[tokio::test]
async fn pending_confirm_complete_walkthrough() {
    // Product A stock=10; order qty=4: create leaves stock, confirm
    // decrements to 6, complete changes status only.
    let backend = backend();
    let product = seed_product(&backend, "Product A", Decimal::from(10)).await;

    let created = backend
        .orders
        .create(order_request(product, Decimal::from(4)))
        .await
        .unwrap();

    let order = backend.orders.get(created.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    let stock = backend.catalog.product(product).await.unwrap().product.stock_quantity;
    assert_eq!(stock, Decimal::from(10));

    let outcome = backend.orders.confirm(created.id).await.unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Confirmed { .. }));
    let stock = backend.catalog.product(product).await.unwrap().product.stock_quantity;
    assert_eq!(stock, Decimal::from(6));

    backend.orders.complete(created.id).await.unwrap();
    let order = backend.orders.get(created.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert!(order.completed_at.is_some());
    let stock = backend.catalog.product(product).await.unwrap().product.stock_quantity;
    assert_eq!(stock, Decimal::from(6));
}

#[tokio::test]
async fn shortage_then_restock_then_confirm() {
    // Product B stock=2, order qty=5: confirmation reports the shortage
    // and changes nothing; after a supplier delivery of 10 the same
    // confirmation succeeds.
    let backend = backend();
    let product = seed_product(&backend, "Product B", Decimal::from(2)).await;

    let created = backend
        .orders
        .create(order_request(product, Decimal::from(5)))
        .await
        .unwrap();

    let outcome = backend.orders.confirm(created.id).await.unwrap();
    let ConfirmOutcome::StockShortage(shortages) = outcome else {
        panic!("expected shortage");
    };
    assert_eq!(shortages.len(), 1);
    assert_eq!(shortages[0].product_name, "Product B");
    assert_eq!(shortages[0].ordered, Decimal::from(5));
    assert_eq!(shortages[0].available, Decimal::from(2));

    let order = backend.orders.get(created.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    backend
        .deliveries
        .record(RecordDeliveryRequest {
            supplier_name: "StoneSource Ltd".to_string(),
            invoice_number: "INV-1042".to_string(),
            invoice_date: Utc::now().date_naive(),
            items: vec![DeliveryLineRequest {
                product_id: product,
                quantity: Decimal::from(10),
                purchase_price: Decimal::new(650, 2),
            }],
        })
        .await
        .unwrap();

    let outcome = backend.orders.confirm(created.id).await.unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Confirmed { .. }));
    let stock = backend.catalog.product(product).await.unwrap().product.stock_quantity;
    // 2 + 10 − 5
    assert_eq!(stock, Decimal::from(7));
}

#[tokio::test]
async fn missing_delivery_address_is_reported_and_nothing_is_persisted() {
    let backend = backend();
    let product = seed_product(&backend, "Product C", Decimal::from(10)).await;

    let mut request = order_request(product, Decimal::ONE);
    request.delivery_method = DeliveryMethod::Delivery;
    let err = backend.orders.create(request).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(ref m) if m.contains("delivery address")));

    let page = backend
        .orders
        .list(None, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn order_item_snapshots_survive_product_edits() {
    let backend = backend();
    let product = seed_product(&backend, "Product D", Decimal::from(10)).await;

    let created = backend
        .orders
        .create(order_request(product, Decimal::from(2)))
        .await
        .unwrap();

    // Rename and reprice the product after the order exists.
    let category_id = backend.catalog.product(product).await.unwrap().product.category_id;
    backend
        .catalog
        .update_product(
            product,
            ProductInput {
                name: "Product D renamed".to_string(),
                description: None,
                category_id,
                price_without_vat: Decimal::new(9900, 2),
                vat_amount: Decimal::new(1980, 2),
                price_with_vat: Decimal::new(11880, 2),
                unit: common::UnitOfMeasure::ByWeight,
                stock_quantity: Decimal::from(10),
            },
        )
        .await
        .unwrap();

    let order = backend.orders.get(created.id).await.unwrap();
    assert_eq!(order.items[0].product_name, "Product D");
    assert_eq!(order.items[0].unit_price_without_vat, Decimal::new(1000, 2));
    assert_eq!(order.items[0].unit_price_with_vat, Decimal::new(1200, 2));
}

#[tokio::test]
async fn stats_reflect_lifecycle_and_skip_cancelled() {
    let backend = backend();
    let product = seed_product(&backend, "Product E", Decimal::from(100)).await;

    let a = backend
        .orders
        .create(order_request(product, Decimal::ONE))
        .await
        .unwrap();
    let b = backend
        .orders
        .create(order_request(product, Decimal::ONE))
        .await
        .unwrap();
    let c = backend
        .orders
        .create(order_request(product, Decimal::ONE))
        .await
        .unwrap();

    backend.orders.confirm(a.id).await.unwrap();
    backend.orders.complete(a.id).await.unwrap();
    backend.orders.confirm(b.id).await.unwrap();
    backend.orders.cancel(c.id).await.unwrap();

    let stats = backend.orders.stats().await.unwrap();
    assert_eq!(stats.total_products, 1);
    assert_eq!(stats.pending_orders, 0);
    assert_eq!(stats.confirmed_orders, 1);
    assert_eq!(stats.completed_orders, 1);

    let pending_only = backend
        .orders
        .list(Some(OrderStatus::Pending), PageRequest::default())
        .await
        .unwrap();
    // The cancelled order kept its Pending status.
    assert_eq!(pending_only.total_count, 1);
    assert!(pending_only.items[0].is_cancelled);
}
