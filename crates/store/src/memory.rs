//! In-memory store implementation.
//!
//! Backs unit and service tests, and the no-database fallback of the API
//! binary. A single `RwLock` over the whole state makes every operation
//! one critical section, so the check-then-act sequences (order-number
//! allocation, confirmation stock check) are trivially serialized.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{
    CategoryId, InvoiceId, OrderId, OrderNumber, OrderStatus, Page, PageRequest, ProductId,
};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::records::{Category, Invoice, Order, Product};
use crate::store::{
    CategoryDelete, ConfirmApply, CreatedOrder, NewInvoice, NewOrder, ProductFilter, ShortageRow,
    StatusCounts, StockDemand, Store, TransitionApply,
};
use crate::{Result, StoreError};

#[derive(Default)]
struct MemoryState {
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    invoices: HashMap<InvoiceId, Invoice>,
}

/// In-memory store; cheap to clone, clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let total = items.len() as i64;
    let slice: Vec<T> = items
        .iter()
        .skip(page.offset() as usize)
        .take(page.page_size() as usize)
        .cloned()
        .collect();
    Page::new(slice, total, page)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_category(&self, category: Category) -> Result<()> {
        let mut state = self.state.write().await;
        if state.categories.values().any(|c| c.name == category.name) {
            return Err(StoreError::Duplicate("category name"));
        }
        state.categories.insert(category.id, category);
        Ok(())
    }

    async fn rename_category(
        &self,
        id: CategoryId,
        name: String,
        now: DateTime<Utc>,
    ) -> Result<Option<Category>> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&id) {
            return Ok(None);
        }
        if state
            .categories
            .values()
            .any(|c| c.id != id && c.name == name)
        {
            return Err(StoreError::Duplicate("category name"));
        }
        let category = state.categories.get_mut(&id).expect("checked above");
        category.name = name;
        category.updated_at = now;
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<CategoryDelete> {
        let mut state = self.state.write().await;
        let product_count = state
            .products
            .values()
            .filter(|p| p.category_id == id)
            .count() as i64;
        if product_count > 0 {
            return Ok(CategoryDelete::HasProducts(product_count));
        }
        match state.categories.remove(&id) {
            Some(_) => Ok(CategoryDelete::Deleted),
            None => Ok(CategoryDelete::NotFound),
        }
    }

    async fn category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn categories(&self) -> Result<Vec<(Category, i64)>> {
        let state = self.state.read().await;
        let mut all: Vec<(Category, i64)> = state
            .categories
            .values()
            .map(|c| {
                let count = state
                    .products
                    .values()
                    .filter(|p| p.category_id == c.id)
                    .count() as i64;
                (c.clone(), count)
            })
            .collect();
        all.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        Ok(all)
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.write().await;
        if state.products.values().any(|p| {
            p.id != product.id && p.category_id == product.category_id && p.name == product.name
        }) {
            return Err(StoreError::Duplicate("product name within category"));
        }
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).map(|p| (*id, p.clone())))
            .collect())
    }

    async fn products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>> {
        let state = self.state.read().await;
        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matching: Vec<Product> = state
            .products
            .values()
            .filter(|p| filter.include_inactive || p.is_active)
            .filter(|p| filter.category_id.is_none_or(|c| p.category_id == c))
            .filter(|p| {
                search
                    .as_ref()
                    .is_none_or(|s| p.name.to_lowercase().contains(s))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(paginate(&matching, page))
    }

    async fn low_stock_products(&self, threshold: Decimal) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut matching: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.is_active && p.stock_quantity <= threshold)
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.stock_quantity);
        Ok(matching)
    }

    async fn active_product_count(&self) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.products.values().filter(|p| p.is_active).count() as i64)
    }

    async fn insert_order(
        &self,
        order: NewOrder,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<CreatedOrder> {
        let mut state = self.state.write().await;

        // Greatest existing number under today's prefix; fixed-width
        // suffixes make the string max the numeric max.
        let prefix = OrderNumber::day_prefix(day);
        let last = state
            .orders
            .values()
            .map(|o| o.order_number.as_str())
            .filter(|n| n.starts_with(&prefix))
            .max()
            .map(str::to_owned);
        let order_number = OrderNumber::next_for_day(day, last.as_deref())?;

        let id = OrderId::new();
        state.orders.insert(
            id,
            Order {
                id,
                order_number: order_number.clone(),
                customer_type: order.customer_type,
                delivery_method: order.delivery_method,
                status: OrderStatus::Pending,
                is_cancelled: false,
                delivery_fee: None,
                created_at: now,
                confirmed_at: None,
                completed_at: None,
                updated_at: now,
                customer: order.customer,
                items: order.items,
            },
        );
        Ok(CreatedOrder { id, order_number })
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let mut matching: Vec<Order> = state
            .orders
            .values()
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(&matching, page))
    }

    async fn recent_orders(&self, limit: i64) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut all: Vec<Order> = state.orders.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit.max(0) as usize);
        Ok(all)
    }

    async fn order_status_counts(&self) -> Result<StatusCounts> {
        let state = self.state.read().await;
        let mut counts = StatusCounts::default();
        for order in state.orders.values().filter(|o| !o.is_cancelled) {
            match order.status {
                OrderStatus::Pending => counts.pending += 1,
                OrderStatus::Confirmed => counts.confirmed += 1,
                OrderStatus::Completed => counts.completed += 1,
            }
        }
        Ok(counts)
    }

    async fn apply_confirmation(
        &self,
        id: OrderId,
        demands: &[StockDemand],
        now: DateTime<Utc>,
    ) -> Result<ConfirmApply> {
        let mut state = self.state.write().await;

        let (status, is_cancelled) = match state.orders.get(&id) {
            Some(order) => (order.status, order.is_cancelled),
            None => return Ok(ConfirmApply::NotFound),
        };
        if is_cancelled || !status.can_confirm() {
            return Ok(ConfirmApply::InvalidState {
                status,
                is_cancelled,
            });
        }

        // Check every line; shortages are collected, not short-circuited.
        let mut shortages = Vec::new();
        for demand in demands {
            let product = state
                .products
                .get(&demand.product_id)
                .ok_or(StoreError::UnknownProduct(demand.product_id))?;
            if product.stock_quantity < demand.quantity {
                shortages.push(ShortageRow {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    ordered: demand.quantity,
                    available: product.stock_quantity,
                    unit: product.unit,
                });
            }
        }
        if !shortages.is_empty() {
            return Ok(ConfirmApply::InsufficientStock(shortages));
        }

        for demand in demands {
            let product = state
                .products
                .get_mut(&demand.product_id)
                .expect("existence checked above");
            product.stock_quantity -= demand.quantity;
            product.updated_at = now;
        }
        let order = state.orders.get_mut(&id).expect("existence checked above");
        order.status = OrderStatus::Confirmed;
        order.confirmed_at = Some(now);
        order.updated_at = now;
        Ok(ConfirmApply::Applied)
    }

    async fn apply_completion(&self, id: OrderId, now: DateTime<Utc>) -> Result<TransitionApply> {
        let mut state = self.state.write().await;
        let Some(order) = state.orders.get_mut(&id) else {
            return Ok(TransitionApply::NotFound);
        };
        if order.is_cancelled || !order.status.can_complete() {
            return Ok(TransitionApply::InvalidState {
                status: order.status,
                is_cancelled: order.is_cancelled,
            });
        }
        order.status = OrderStatus::Completed;
        order.completed_at = Some(now);
        order.updated_at = now;
        Ok(TransitionApply::Applied)
    }

    async fn apply_cancellation(
        &self,
        id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<TransitionApply> {
        let mut state = self.state.write().await;
        let Some(order) = state.orders.get_mut(&id) else {
            return Ok(TransitionApply::NotFound);
        };
        if order.is_cancelled || !order.status.can_cancel() {
            return Ok(TransitionApply::InvalidState {
                status: order.status,
                is_cancelled: order.is_cancelled,
            });
        }
        order.is_cancelled = true;
        order.updated_at = now;
        Ok(TransitionApply::Applied)
    }

    async fn set_delivery_fee(
        &self,
        id: OrderId,
        fee: Decimal,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(order) = state.orders.get_mut(&id) else {
            return Ok(false);
        };
        order.delivery_fee = Some(fee);
        order.updated_at = now;
        Ok(true)
    }

    async fn insert_invoice(&self, invoice: NewInvoice, now: DateTime<Utc>) -> Result<InvoiceId> {
        let mut state = self.state.write().await;

        // Existence pass first so a bad reference leaves stock untouched.
        for item in &invoice.items {
            if !state.products.contains_key(&item.product_id) {
                return Err(StoreError::UnknownProduct(item.product_id));
            }
        }

        for item in &invoice.items {
            let product = state
                .products
                .get_mut(&item.product_id)
                .expect("existence checked above");
            product.stock_quantity += item.quantity;
            product.updated_at = now;
        }

        let id = InvoiceId::new();
        state.invoices.insert(
            id,
            Invoice {
                id,
                supplier_name: invoice.supplier_name,
                invoice_number: invoice.invoice_number,
                invoice_date: invoice.invoice_date,
                entry_date: now,
                created_at: now,
                items: invoice.items,
            },
        );
        Ok(id)
    }

    async fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        Ok(self.state.read().await.invoices.get(&id).cloned())
    }

    async fn invoices(&self, page: PageRequest) -> Result<Page<Invoice>> {
        let state = self.state.read().await;
        let mut all: Vec<Invoice> = state.invoices.values().cloned().collect();
        all.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        Ok(paginate(&all, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CustomerInfo, OrderItem};
    use common::{CustomerType, DeliveryMethod, UnitOfMeasure};

    fn category(name: &str) -> Category {
        let now = Utc::now();
        Category {
            id: CategoryId::new(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn product(category_id: CategoryId, name: &str, stock: Decimal) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            name: name.to_string(),
            description: None,
            category_id,
            price_without_vat: Decimal::new(1000, 2),
            vat_amount: Decimal::new(200, 2),
            price_with_vat: Decimal::new(1200, 2),
            unit: UnitOfMeasure::ByWeight,
            stock_quantity: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn item_for(product: &Product, quantity: Decimal) -> OrderItem {
        OrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price_without_vat: product.price_without_vat,
            vat_amount: product.vat_amount,
            unit_price_with_vat: product.price_with_vat,
            unit: product.unit,
        }
    }

    fn new_order(items: Vec<OrderItem>) -> NewOrder {
        NewOrder {
            customer_type: CustomerType::Individual,
            delivery_method: DeliveryMethod::Pickup,
            customer: CustomerInfo {
                full_name: Some("Maria Petrova".to_string()),
                phone: Some("+359888123456".to_string()),
                ..CustomerInfo::default()
            },
            items,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    async fn seed_product(store: &InMemoryStore, stock: Decimal) -> Product {
        let cat = category("Stone");
        store.insert_category(cat.clone()).await.unwrap();
        let prod = product(cat.id, "Granite slab", stock);
        store.save_product(&prod).await.unwrap();
        prod
    }

    #[tokio::test]
    async fn duplicate_category_name_rejected() {
        let store = InMemoryStore::new();
        store.insert_category(category("Stone")).await.unwrap();
        let err = store.insert_category(category("Stone")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn category_with_products_cannot_be_deleted() {
        let store = InMemoryStore::new();
        let prod = seed_product(&store, Decimal::from(5)).await;
        let result = store.delete_category(prod.category_id).await.unwrap();
        assert!(matches!(result, CategoryDelete::HasProducts(1)));
    }

    #[tokio::test]
    async fn duplicate_product_name_within_category_rejected() {
        let store = InMemoryStore::new();
        let cat = category("Stone");
        store.insert_category(cat.clone()).await.unwrap();
        store
            .save_product(&product(cat.id, "Granite slab", Decimal::ZERO))
            .await
            .unwrap();
        let err = store
            .save_product(&product(cat.id, "Granite slab", Decimal::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        // Same name in a different category is fine.
        let other = category("Tiles");
        store.insert_category(other.clone()).await.unwrap();
        store
            .save_product(&product(other.id, "Granite slab", Decimal::ZERO))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn order_numbers_are_consecutive_within_a_day() {
        let store = InMemoryStore::new();
        let prod = seed_product(&store, Decimal::from(100)).await;
        let now = Utc::now();

        let first = store
            .insert_order(new_order(vec![item_for(&prod, Decimal::ONE)]), day(), now)
            .await
            .unwrap();
        let second = store
            .insert_order(new_order(vec![item_for(&prod, Decimal::ONE)]), day(), now)
            .await
            .unwrap();
        assert_eq!(first.order_number.as_str(), "NSI-20260807-0001");
        assert_eq!(second.order_number.as_str(), "NSI-20260807-0002");

        // A new day restarts the sequence.
        let next_day = day().succ_opt().unwrap();
        let third = store
            .insert_order(
                new_order(vec![item_for(&prod, Decimal::ONE)]),
                next_day,
                now,
            )
            .await
            .unwrap();
        assert_eq!(third.order_number.as_str(), "NSI-20260808-0001");
    }

    #[tokio::test]
    async fn confirmation_decrements_stock_and_sets_status() {
        let store = InMemoryStore::new();
        let prod = seed_product(&store, Decimal::from(10)).await;
        let now = Utc::now();
        let created = store
            .insert_order(
                new_order(vec![item_for(&prod, Decimal::from(4))]),
                day(),
                now,
            )
            .await
            .unwrap();

        let demands = vec![StockDemand {
            product_id: prod.id,
            quantity: Decimal::from(4),
        }];
        let outcome = store
            .apply_confirmation(created.id, &demands, now)
            .await
            .unwrap();
        assert!(matches!(outcome, ConfirmApply::Applied));

        let stock = store.product(prod.id).await.unwrap().unwrap().stock_quantity;
        assert_eq!(stock, Decimal::from(6));

        let order = store.order(created.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert!(order.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn shortage_reports_every_line_and_changes_nothing() {
        let store = InMemoryStore::new();
        let cat = category("Stone");
        store.insert_category(cat.clone()).await.unwrap();
        let scarce = product(cat.id, "Marble tile", Decimal::from(2));
        let plenty = product(cat.id, "River gravel", Decimal::from(50));
        let missing_too = product(cat.id, "Slate sheet", Decimal::ZERO);
        for p in [&scarce, &plenty, &missing_too] {
            store.save_product(p).await.unwrap();
        }

        let now = Utc::now();
        let created = store
            .insert_order(
                new_order(vec![
                    item_for(&scarce, Decimal::from(5)),
                    item_for(&plenty, Decimal::from(10)),
                    item_for(&missing_too, Decimal::ONE),
                ]),
                day(),
                now,
            )
            .await
            .unwrap();

        let demands = vec![
            StockDemand {
                product_id: scarce.id,
                quantity: Decimal::from(5),
            },
            StockDemand {
                product_id: plenty.id,
                quantity: Decimal::from(10),
            },
            StockDemand {
                product_id: missing_too.id,
                quantity: Decimal::ONE,
            },
        ];
        let outcome = store
            .apply_confirmation(created.id, &demands, now)
            .await
            .unwrap();

        let ConfirmApply::InsufficientStock(shortages) = outcome else {
            panic!("expected a shortage report");
        };
        assert_eq!(shortages.len(), 2);
        assert_eq!(shortages[0].product_name, "Marble tile");
        assert_eq!(shortages[0].ordered, Decimal::from(5));
        assert_eq!(shortages[0].available, Decimal::from(2));

        // No partial decrement anywhere, order still pending.
        for p in [&scarce, &plenty, &missing_too] {
            let current = store.product(p.id).await.unwrap().unwrap();
            assert_eq!(current.stock_quantity, p.stock_quantity);
        }
        let order = store.order(created.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn confirmation_guards_state() {
        let store = InMemoryStore::new();
        let prod = seed_product(&store, Decimal::from(10)).await;
        let now = Utc::now();
        let created = store
            .insert_order(
                new_order(vec![item_for(&prod, Decimal::ONE)]),
                day(),
                now,
            )
            .await
            .unwrap();
        let demands = vec![StockDemand {
            product_id: prod.id,
            quantity: Decimal::ONE,
        }];

        store
            .apply_confirmation(created.id, &demands, now)
            .await
            .unwrap();
        let again = store
            .apply_confirmation(created.id, &demands, now)
            .await
            .unwrap();
        assert!(matches!(again, ConfirmApply::InvalidState { .. }));

        let missing = store
            .apply_confirmation(OrderId::new(), &demands, now)
            .await
            .unwrap();
        assert!(matches!(missing, ConfirmApply::NotFound));
    }

    #[tokio::test]
    async fn completion_and_cancellation_guards() {
        let store = InMemoryStore::new();
        let prod = seed_product(&store, Decimal::from(10)).await;
        let now = Utc::now();
        let created = store
            .insert_order(
                new_order(vec![item_for(&prod, Decimal::ONE)]),
                day(),
                now,
            )
            .await
            .unwrap();

        // Pending order cannot be completed.
        let premature = store.apply_completion(created.id, now).await.unwrap();
        assert!(matches!(premature, TransitionApply::InvalidState { .. }));

        // Cancel the pending order; a cancelled order accepts nothing.
        let cancelled = store.apply_cancellation(created.id, now).await.unwrap();
        assert!(matches!(cancelled, TransitionApply::Applied));
        let twice = store.apply_cancellation(created.id, now).await.unwrap();
        assert!(matches!(twice, TransitionApply::InvalidState { .. }));

        let order = store.order(created.id).await.unwrap().unwrap();
        assert!(order.is_cancelled);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn invoice_intake_increments_only_referenced_products() {
        let store = InMemoryStore::new();
        let cat = category("Stone");
        store.insert_category(cat.clone()).await.unwrap();
        let delivered = product(cat.id, "Limestone block", Decimal::from(3));
        let untouched = product(cat.id, "Basalt chips", Decimal::from(7));
        store.save_product(&delivered).await.unwrap();
        store.save_product(&untouched).await.unwrap();

        let now = Utc::now();
        let id = store
            .insert_invoice(
                NewInvoice {
                    supplier_name: "StoneSource Ltd".to_string(),
                    invoice_number: "INV-1042".to_string(),
                    invoice_date: day(),
                    items: vec![crate::records::InvoiceItem {
                        product_id: delivered.id,
                        quantity: Decimal::from(12),
                        purchase_price: Decimal::new(850, 2),
                    }],
                },
                now,
            )
            .await
            .unwrap();

        assert!(store.invoice(id).await.unwrap().is_some());
        let restocked = store.product(delivered.id).await.unwrap().unwrap();
        assert_eq!(restocked.stock_quantity, Decimal::from(15));
        let other = store.product(untouched.id).await.unwrap().unwrap();
        assert_eq!(other.stock_quantity, Decimal::from(7));
    }

    #[tokio::test]
    async fn invoice_with_unknown_product_changes_nothing() {
        let store = InMemoryStore::new();
        let prod = seed_product(&store, Decimal::from(3)).await;

        let err = store
            .insert_invoice(
                NewInvoice {
                    supplier_name: "StoneSource Ltd".to_string(),
                    invoice_number: "INV-1043".to_string(),
                    invoice_date: day(),
                    items: vec![
                        crate::records::InvoiceItem {
                            product_id: prod.id,
                            quantity: Decimal::from(5),
                            purchase_price: Decimal::ONE,
                        },
                        crate::records::InvoiceItem {
                            product_id: ProductId::new(),
                            quantity: Decimal::ONE,
                            purchase_price: Decimal::ONE,
                        },
                    ],
                },
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownProduct(_)));

        let unchanged = store.product(prod.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock_quantity, Decimal::from(3));
        assert!(store
            .invoices(PageRequest::default())
            .await
            .unwrap()
            .items
            .is_empty());
    }

    #[tokio::test]
    async fn product_listing_filters_and_paginates() {
        let store = InMemoryStore::new();
        let cat = category("Stone");
        store.insert_category(cat.clone()).await.unwrap();
        for i in 0..5 {
            store
                .save_product(&product(cat.id, &format!("Product {i}"), Decimal::ZERO))
                .await
                .unwrap();
        }
        let mut inactive = product(cat.id, "Retired product", Decimal::ZERO);
        inactive.is_active = false;
        store.save_product(&inactive).await.unwrap();

        let page = store
            .products(&ProductFilter::default(), PageRequest::new(Some(1), Some(3)))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages, 2);

        let with_inactive = store
            .products(
                &ProductFilter {
                    include_inactive: true,
                    ..ProductFilter::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(with_inactive.total_count, 6);

        let searched = store
            .products(
                &ProductFilter {
                    search: Some("product 3".to_string()),
                    ..ProductFilter::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(searched.items.len(), 1);
        assert_eq!(searched.items[0].name, "Product 3");
    }

    #[tokio::test]
    async fn low_stock_sorted_ascending() {
        let store = InMemoryStore::new();
        let cat = category("Stone");
        store.insert_category(cat.clone()).await.unwrap();
        store
            .save_product(&product(cat.id, "A", Decimal::from(9)))
            .await
            .unwrap();
        store
            .save_product(&product(cat.id, "B", Decimal::from(2)))
            .await
            .unwrap();
        store
            .save_product(&product(cat.id, "C", Decimal::from(40)))
            .await
            .unwrap();

        let low = store.low_stock_products(Decimal::from(10)).await.unwrap();
        let names: Vec<&str> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn status_counts_skip_cancelled_orders() {
        let store = InMemoryStore::new();
        let prod = seed_product(&store, Decimal::from(100)).await;
        let now = Utc::now();

        let a = store
            .insert_order(new_order(vec![item_for(&prod, Decimal::ONE)]), day(), now)
            .await
            .unwrap();
        let b = store
            .insert_order(new_order(vec![item_for(&prod, Decimal::ONE)]), day(), now)
            .await
            .unwrap();
        store
            .insert_order(new_order(vec![item_for(&prod, Decimal::ONE)]), day(), now)
            .await
            .unwrap();

        store
            .apply_confirmation(
                a.id,
                &[StockDemand {
                    product_id: prod.id,
                    quantity: Decimal::ONE,
                }],
                now,
            )
            .await
            .unwrap();
        store.apply_cancellation(b.id, now).await.unwrap();

        let counts = store.order_status_counts().await.unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.confirmed, 1);
        assert_eq!(counts.completed, 0);
    }
}
