//! Order endpoints: creation, lifecycle transitions and views.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use common::{CustomerType, DeliveryMethod, OrderId, OrderStatus, PageRequest};
use domain::{
    line_totals, order_totals, CatalogService, ConfirmOutcome, CreateOrderRequest,
    CustomerDetails, DeliveryService, OrderLineRequest, OrderService,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{Order, ShortageRow, Store};
use uuid::Uuid;

use crate::error::ApiError;

use super::PageDto;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub orders: OrderService<S>,
    pub catalog: CatalogService<S>,
    pub deliveries: DeliveryService<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderBody {
    pub customer_type: i16,
    pub delivery_method: i16,
    pub customer_info: Option<CustomerInfoBody>,
    #[serde(default)]
    pub items: Vec<OrderLineBody>,
}

#[derive(Deserialize)]
pub struct CustomerInfoBody {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company_name: Option<String>,
    pub tax_id: Option<String>,
    pub representative: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Deserialize)]
pub struct OrderLineBody {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<i16>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub count: Option<i64>,
}

#[derive(Deserialize)]
pub struct DeliveryFeeBody {
    pub delivery_fee: Decimal,
}

// -- Response types --

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub order_number: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Tagged confirmation outcome: either the order is confirmed, or a
/// structured shortage report. Both are 200 responses — a shortage is an
/// expected business outcome, not a fault.
#[derive(Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ConfirmResponse {
    Confirmed {
        order_number: String,
        message: String,
    },
    StockShortage {
        error: String,
        details: Vec<ShortageDto>,
    },
}

#[derive(Serialize)]
pub struct ShortageDto {
    pub product_id: Uuid,
    pub product_name: String,
    pub ordered: Decimal,
    pub available: Decimal,
    pub unit: i16,
    pub unit_display: &'static str,
}

#[derive(Serialize)]
pub struct DeliveryFeeResponse {
    pub delivery_fee: Decimal,
    pub grand_total: Decimal,
}

#[derive(Serialize)]
pub struct OrderListDto {
    pub id: Uuid,
    pub order_number: String,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_type: i16,
    pub customer_type_display: &'static str,
    pub delivery_method: i16,
    pub delivery_method_display: &'static str,
    pub status: i16,
    pub status_display: &'static str,
    pub is_cancelled: bool,
    pub total_with_vat: Decimal,
    pub item_count: usize,
}

#[derive(Serialize)]
pub struct CustomerInfoDto {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company_name: Option<String>,
    pub tax_id: Option<String>,
    pub representative: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Serialize)]
pub struct OrderItemDto {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price_without_vat: Decimal,
    pub vat_amount: Decimal,
    pub unit_price_with_vat: Decimal,
    pub unit: i16,
    pub unit_display: &'static str,
    pub row_total_without_vat: Decimal,
    pub row_vat_total: Decimal,
    pub row_total_with_vat: Decimal,
}

#[derive(Serialize)]
pub struct OrderDetailDto {
    pub id: Uuid,
    pub order_number: String,
    pub status: i16,
    pub status_display: &'static str,
    pub customer_type: i16,
    pub customer_type_display: &'static str,
    pub delivery_method: i16,
    pub delivery_method_display: &'static str,
    pub delivery_fee: Option<Decimal>,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub customer_info: CustomerInfoDto,
    pub items: Vec<OrderItemDto>,
    pub subtotal_without_vat: Decimal,
    pub total_vat: Decimal,
    pub subtotal_with_vat: Decimal,
    pub grand_total: Decimal,
}

#[derive(Serialize)]
pub struct OrderStatsDto {
    pub total_products: i64,
    pub pending_orders: i64,
    pub confirmed_orders: i64,
    pub completed_orders: i64,
}

// -- DTO mapping --

fn customer_display_name(order: &Order) -> String {
    let name = match order.customer_type {
        CustomerType::Individual => &order.customer.full_name,
        CustomerType::Company => &order.customer.company_name,
    };
    name.clone().unwrap_or_default()
}

fn to_list_dto(order: Order) -> OrderListDto {
    let totals = order_totals(&order);
    OrderListDto {
        id: order.id.as_uuid(),
        order_number: order.order_number.as_str().to_string(),
        created_at: order.created_at,
        customer_name: customer_display_name(&order),
        customer_type: order.customer_type.as_i16(),
        customer_type_display: order.customer_type.as_str(),
        delivery_method: order.delivery_method.as_i16(),
        delivery_method_display: order.delivery_method.as_str(),
        status: order.status.as_i16(),
        status_display: order.status.display(order.is_cancelled),
        is_cancelled: order.is_cancelled,
        total_with_vat: totals.subtotal_with_vat,
        item_count: order.items.len(),
    }
}

fn to_detail_dto(order: Order) -> OrderDetailDto {
    let totals = order_totals(&order);
    let items = order
        .items
        .iter()
        .map(|item| {
            let row = line_totals(item);
            OrderItemDto {
                product_id: item.product_id.as_uuid(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price_without_vat: item.unit_price_without_vat,
                vat_amount: item.vat_amount,
                unit_price_with_vat: item.unit_price_with_vat,
                unit: item.unit.as_i16(),
                unit_display: item.unit.symbol(),
                row_total_without_vat: row.without_vat,
                row_vat_total: row.vat,
                row_total_with_vat: row.with_vat,
            }
        })
        .collect();
    OrderDetailDto {
        id: order.id.as_uuid(),
        order_number: order.order_number.as_str().to_string(),
        status: order.status.as_i16(),
        status_display: order.status.display(order.is_cancelled),
        customer_type: order.customer_type.as_i16(),
        customer_type_display: order.customer_type.as_str(),
        delivery_method: order.delivery_method.as_i16(),
        delivery_method_display: order.delivery_method.as_str(),
        delivery_fee: order.delivery_fee,
        is_cancelled: order.is_cancelled,
        created_at: order.created_at,
        confirmed_at: order.confirmed_at,
        completed_at: order.completed_at,
        customer_info: CustomerInfoDto {
            full_name: order.customer.full_name,
            phone: order.customer.phone,
            address: order.customer.address,
            company_name: order.customer.company_name,
            tax_id: order.customer.tax_id,
            representative: order.customer.representative,
            contact_person: order.customer.contact_person,
            contact_phone: order.customer.contact_phone,
        },
        items,
        subtotal_without_vat: totals.subtotal_without_vat,
        total_vat: totals.total_vat,
        subtotal_with_vat: totals.subtotal_with_vat,
        grand_total: totals.grand_total,
    }
}

fn to_shortage_dto(row: ShortageRow) -> ShortageDto {
    ShortageDto {
        product_id: row.product_id.as_uuid(),
        product_name: row.product_name,
        ordered: row.ordered,
        available: row.available,
        unit: row.unit.as_i16(),
        unit_display: row.unit.symbol(),
    }
}

// -- Handlers --

/// POST /orders — place a new order.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let customer_type = CustomerType::try_from(body.customer_type)
        .map_err(|_| ApiError::BadRequest("Invalid customer type.".to_string()))?;
    let delivery_method = DeliveryMethod::try_from(body.delivery_method)
        .map_err(|_| ApiError::BadRequest("Invalid delivery method.".to_string()))?;
    let customer = body
        .customer_info
        .ok_or_else(|| ApiError::BadRequest("Customer information is required.".to_string()))?;

    let request = CreateOrderRequest {
        customer_type,
        delivery_method,
        customer: CustomerDetails {
            full_name: customer.full_name,
            phone: customer.phone,
            address: customer.address,
            company_name: customer.company_name,
            tax_id: customer.tax_id,
            representative: customer.representative,
            contact_person: customer.contact_person,
            contact_phone: customer.contact_phone,
        },
        items: body
            .items
            .into_iter()
            .map(|line| OrderLineRequest {
                product_id: line.product_id.into(),
                quantity: line.quantity,
            })
            .collect(),
    };

    let created = state.orders.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order_number: created.order_number.as_str().to_string(),
            message: "Your order was placed successfully.".to_string(),
        }),
    ))
}

/// GET /orders — paginated listing with optional status filter.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<PageDto<OrderListDto>>, ApiError> {
    let status = query
        .status
        .map(OrderStatus::try_from)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid order status.".to_string()))?;
    let page = state
        .orders
        .list(status, PageRequest::new(query.page, query.page_size))
        .await?;
    Ok(Json(PageDto::from_page(page, to_list_dto)))
}

/// GET /orders/stats — dashboard counters.
#[tracing::instrument(skip(state))]
pub async fn stats<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<OrderStatsDto>, ApiError> {
    let stats = state.orders.stats().await?;
    Ok(Json(OrderStatsDto {
        total_products: stats.total_products,
        pending_orders: stats.pending_orders,
        confirmed_orders: stats.confirmed_orders,
        completed_orders: stats.completed_orders,
    }))
}

/// GET /orders/recent — the most recent orders.
#[tracing::instrument(skip(state))]
pub async fn recent<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<OrderListDto>>, ApiError> {
    let orders = state.orders.recent(query.count).await?;
    Ok(Json(orders.into_iter().map(to_list_dto).collect()))
}

/// GET /orders/{id} — full order detail with computed totals.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetailDto>, ApiError> {
    let order = state.orders.get(OrderId::from_uuid(id)).await?;
    Ok(Json(to_detail_dto(order)))
}

/// PUT /orders/{id}/confirm — confirm a pending order.
#[tracing::instrument(skip(state))]
pub async fn confirm<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let outcome = state.orders.confirm(OrderId::from_uuid(id)).await?;
    let response = match outcome {
        ConfirmOutcome::Confirmed { order_number } => ConfirmResponse::Confirmed {
            message: format!("Order {order_number} confirmed. Stock has been updated."),
            order_number: order_number.into_string(),
        },
        ConfirmOutcome::StockShortage(rows) => ConfirmResponse::StockShortage {
            error: "Insufficient stock for one or more items.".to_string(),
            details: rows.into_iter().map(to_shortage_dto).collect(),
        },
    };
    Ok(Json(response))
}

/// PUT /orders/{id}/complete — mark a confirmed order completed.
#[tracing::instrument(skip(state))]
pub async fn complete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.orders.complete(OrderId::from_uuid(id)).await?;
    Ok(Json(MessageResponse {
        message: "The order was marked as completed.".to_string(),
    }))
}

/// PUT /orders/{id}/cancel — cancel a pending order.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.orders.cancel(OrderId::from_uuid(id)).await?;
    Ok(Json(MessageResponse {
        message: "The order was cancelled.".to_string(),
    }))
}

/// PUT /orders/{id}/delivery-fee — set the fee, returning the recomputed
/// grand total.
#[tracing::instrument(skip(state, body))]
pub async fn set_delivery_fee<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
    Json(body): Json<DeliveryFeeBody>,
) -> Result<Json<DeliveryFeeResponse>, ApiError> {
    let (delivery_fee, grand_total) = state
        .orders
        .set_delivery_fee(OrderId::from_uuid(id), body.delivery_fee)
        .await?;
    Ok(Json(DeliveryFeeResponse {
        delivery_fee,
        grand_total,
    }))
}
