//! Order lifecycle service.

use chrono::Utc;
use common::{OrderId, OrderStatus, Page, PageRequest, ProductId};
use rust_decimal::Decimal;
use store::{
    ConfirmApply, CreatedOrder, NewOrder, Order, OrderItem, StockDemand, Store, TransitionApply,
};

use crate::error::{DomainError, Result};

use super::totals::order_totals;
use super::{ConfirmOutcome, CreateOrderRequest, OrderStats};

/// Upper bound for the recent-orders view.
const RECENT_MAX: i64 = 20;
/// Default size of the recent-orders view.
const RECENT_DEFAULT: i64 = 5;

/// Service for the order lifecycle and order queries.
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places a new order.
    ///
    /// Runs the validation sequence, snapshots product name/unit/prices
    /// into the order lines, allocates the order number and persists
    /// everything atomically. No stock is reserved or decremented here —
    /// stock is only touched at confirmation.
    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: CreateOrderRequest) -> Result<CreatedOrder> {
        let customer = request.validate()?;

        let mut ids: Vec<ProductId> = request.items.iter().map(|line| line.product_id).collect();
        ids.sort();
        ids.dedup();
        let products = self.store.products_by_ids(&ids).await?;

        for line in &request.items {
            let Some(product) = products.get(&line.product_id) else {
                return Err(DomainError::Validation(format!(
                    "Product with ID {} was not found.",
                    line.product_id
                )));
            };
            if !product.is_active {
                return Err(DomainError::Validation(format!(
                    "Product '{}' is not available.",
                    product.name
                )));
            }
        }

        let items: Vec<OrderItem> = request
            .items
            .iter()
            .map(|line| {
                let product = &products[&line.product_id];
                OrderItem {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    quantity: line.quantity,
                    unit_price_without_vat: product.price_without_vat,
                    vat_amount: product.vat_amount,
                    unit_price_with_vat: product.price_with_vat,
                    unit: product.unit,
                }
            })
            .collect();

        let now = Utc::now();
        let created = self
            .store
            .insert_order(
                NewOrder {
                    customer_type: request.customer_type,
                    delivery_method: request.delivery_method,
                    customer,
                    items,
                },
                now.date_naive(),
                now,
            )
            .await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_number = %created.order_number, "order created");
        Ok(created)
    }

    /// Confirms a pending order, decrementing stock for every line.
    ///
    /// Every line is checked independently; shortages are collected and
    /// reported together as a [`ConfirmOutcome::StockShortage`], leaving
    /// the order and all stock untouched. The check-and-decrement runs as
    /// one atomic store operation.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, id: OrderId) -> Result<ConfirmOutcome> {
        let order = self
            .store
            .order(id)
            .await?
            .ok_or(DomainError::NotFound("Order"))?;
        if order.is_cancelled || !order.status.can_confirm() {
            return Err(DomainError::invalid_transition(
                "confirmed",
                order.status,
                order.is_cancelled,
            ));
        }

        let demands = aggregate_demands(&order.items);
        match self
            .store
            .apply_confirmation(id, &demands, Utc::now())
            .await?
        {
            ConfirmApply::Applied => {
                metrics::counter!("orders_confirmed_total").increment(1);
                tracing::info!(order_number = %order.order_number, "order confirmed");
                Ok(ConfirmOutcome::Confirmed {
                    order_number: order.order_number,
                })
            }
            ConfirmApply::InsufficientStock(shortages) => {
                metrics::counter!("order_confirmations_short_total").increment(1);
                Ok(ConfirmOutcome::StockShortage(shortages))
            }
            ConfirmApply::InvalidState {
                status,
                is_cancelled,
            } => Err(DomainError::invalid_transition(
                "confirmed",
                status,
                is_cancelled,
            )),
            ConfirmApply::NotFound => Err(DomainError::NotFound("Order")),
        }
    }

    /// Marks a confirmed order as completed. No stock effect; stock was
    /// already decremented at confirmation.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, id: OrderId) -> Result<()> {
        match self.store.apply_completion(id, Utc::now()).await? {
            TransitionApply::Applied => {
                metrics::counter!("orders_completed_total").increment(1);
                Ok(())
            }
            TransitionApply::InvalidState {
                status,
                is_cancelled,
            } => Err(DomainError::invalid_transition(
                "completed",
                status,
                is_cancelled,
            )),
            TransitionApply::NotFound => Err(DomainError::NotFound("Order")),
        }
    }

    /// Cancels a pending order. The status is left as it was; the
    /// cancelled flag makes the order terminal. No stock effect — nothing
    /// was reserved.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<()> {
        match self.store.apply_cancellation(id, Utc::now()).await? {
            TransitionApply::Applied => {
                metrics::counter!("orders_cancelled_total").increment(1);
                Ok(())
            }
            TransitionApply::InvalidState {
                status,
                is_cancelled,
            } => Err(DomainError::invalid_transition(
                "cancelled",
                status,
                is_cancelled,
            )),
            TransitionApply::NotFound => Err(DomainError::NotFound("Order")),
        }
    }

    /// Sets the delivery fee on a delivery order and returns the fee
    /// together with the recomputed grand total.
    #[tracing::instrument(skip(self))]
    pub async fn set_delivery_fee(&self, id: OrderId, fee: Decimal) -> Result<(Decimal, Decimal)> {
        if fee < Decimal::ZERO {
            return Err(DomainError::Validation(
                "Delivery fee cannot be negative.".to_string(),
            ));
        }
        let order = self
            .store
            .order(id)
            .await?
            .ok_or(DomainError::NotFound("Order"))?;
        if order.is_cancelled {
            return Err(DomainError::invalid_transition(
                "updated",
                order.status,
                order.is_cancelled,
            ));
        }
        if order.delivery_method != common::DeliveryMethod::Delivery {
            return Err(DomainError::Validation(
                "A delivery fee can only be set on delivery orders.".to_string(),
            ));
        }

        self.store.set_delivery_fee(id, fee, Utc::now()).await?;

        let mut updated = order;
        updated.delivery_fee = Some(fee);
        Ok((fee, order_totals(&updated).grand_total))
    }

    /// Loads the full order, or a not-found error.
    pub async fn get(&self, id: OrderId) -> Result<Order> {
        self.store
            .order(id)
            .await?
            .ok_or(DomainError::NotFound("Order"))
    }

    /// Paginated listing, most recent first, optionally filtered by
    /// status.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        Ok(self.store.orders(status, page).await?)
    }

    /// The most recently created orders; `count` is clamped to [1, 20]
    /// and defaults to 5.
    pub async fn recent(&self, count: Option<i64>) -> Result<Vec<Order>> {
        let count = count.unwrap_or(RECENT_DEFAULT).clamp(1, RECENT_MAX);
        Ok(self.store.recent_orders(count).await?)
    }

    /// Dashboard counters.
    pub async fn stats(&self) -> Result<OrderStats> {
        let counts = self.store.order_status_counts().await?;
        let total_products = self.store.active_product_count().await?;
        Ok(OrderStats {
            total_products,
            pending_orders: counts.pending,
            confirmed_orders: counts.confirmed,
            completed_orders: counts.completed,
        })
    }
}

/// Sums line quantities per product; an order may list the same product
/// on several lines.
fn aggregate_demands(items: &[OrderItem]) -> Vec<StockDemand> {
    let mut demands: Vec<StockDemand> = Vec::new();
    for item in items {
        match demands
            .iter_mut()
            .find(|d| d.product_id == item.product_id)
        {
            Some(demand) => demand.quantity += item.quantity,
            None => demands.push(StockDemand {
                product_id: item.product_id,
                quantity: item.quantity,
            }),
        }
    }
    demands
}
