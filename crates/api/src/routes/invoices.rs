//! Delivery (supplier invoice) endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use common::{InvoiceId, PageRequest};
use domain::{DeliveryLineRequest, InvoiceDetail, InvoiceSummary, RecordDeliveryRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::Store;
use uuid::Uuid;

use crate::error::ApiError;

use super::orders::AppState;
use super::PageDto;

// -- Request types --

#[derive(Deserialize)]
pub struct RecordDeliveryBody {
    pub supplier_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    #[serde(default)]
    pub items: Vec<DeliveryLineBody>,
}

#[derive(Deserialize)]
pub struct DeliveryLineBody {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct InvoicesQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct RecordDeliveryResponse {
    pub id: Uuid,
    pub message: String,
    pub supplier_name: String,
    pub invoice_number: String,
}

#[derive(Serialize)]
pub struct InvoiceListDto {
    pub id: Uuid,
    pub supplier_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub entry_date: DateTime<Utc>,
    pub total_items: usize,
    pub total_quantity: Decimal,
    pub invoice_total: Decimal,
}

#[derive(Serialize)]
pub struct InvoiceItemDto {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit: i16,
    pub unit_display: &'static str,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub row_total: Decimal,
}

#[derive(Serialize)]
pub struct InvoiceDetailDto {
    pub id: Uuid,
    pub supplier_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub entry_date: DateTime<Utc>,
    pub items: Vec<InvoiceItemDto>,
    pub invoice_total: Decimal,
}

fn to_list_dto(summary: InvoiceSummary) -> InvoiceListDto {
    InvoiceListDto {
        id: summary.id.as_uuid(),
        supplier_name: summary.supplier_name,
        invoice_number: summary.invoice_number,
        invoice_date: summary.invoice_date,
        entry_date: summary.entry_date,
        total_items: summary.total_items,
        total_quantity: summary.total_quantity,
        invoice_total: summary.invoice_total,
    }
}

fn to_detail_dto(detail: InvoiceDetail) -> InvoiceDetailDto {
    InvoiceDetailDto {
        id: detail.id.as_uuid(),
        supplier_name: detail.supplier_name,
        invoice_number: detail.invoice_number,
        invoice_date: detail.invoice_date,
        entry_date: detail.entry_date,
        items: detail
            .lines
            .into_iter()
            .map(|line| InvoiceItemDto {
                product_id: line.product_id.as_uuid(),
                product_name: line.product_name,
                unit: line.unit.as_i16(),
                unit_display: line.unit.symbol(),
                quantity: line.quantity,
                purchase_price: line.purchase_price,
                row_total: line.row_total,
            })
            .collect(),
        invoice_total: detail.invoice_total,
    }
}

// -- Handlers --

/// POST /invoices — record a supplier delivery, restocking inventory.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<RecordDeliveryBody>,
) -> Result<(StatusCode, Json<RecordDeliveryResponse>), ApiError> {
    let request = RecordDeliveryRequest {
        supplier_name: body.supplier_name,
        invoice_number: body.invoice_number,
        invoice_date: body.invoice_date,
        items: body
            .items
            .into_iter()
            .map(|line| DeliveryLineRequest {
                product_id: line.product_id.into(),
                quantity: line.quantity,
                purchase_price: line.purchase_price,
            })
            .collect(),
    };
    let recorded = state.deliveries.record(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(RecordDeliveryResponse {
            id: recorded.id.as_uuid(),
            message: "Delivery recorded. Stock has been updated.".to_string(),
            supplier_name: recorded.supplier_name,
            invoice_number: recorded.invoice_number,
        }),
    ))
}

/// GET /invoices — paginated delivery listing.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<InvoicesQuery>,
) -> Result<Json<PageDto<InvoiceListDto>>, ApiError> {
    let page = state
        .deliveries
        .list(PageRequest::new(query.page, query.page_size))
        .await?;
    Ok(Json(PageDto::from_page(page, to_list_dto)))
}

/// GET /invoices/{id} — delivery detail.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceDetailDto>, ApiError> {
    let detail = state.deliveries.get(InvoiceId::from_uuid(id)).await?;
    Ok(Json(to_detail_dto(detail)))
}
