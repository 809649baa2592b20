//! Product management and catalog report endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use common::{PageRequest, ProductId, UnitOfMeasure};
use domain::{ProductInput, ProductWithCategory};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{ProductFilter, Store};
use uuid::Uuid;

use crate::error::ApiError;

use super::orders::{AppState, MessageResponse};
use super::PageDto;

// -- Request types --

#[derive(Deserialize)]
pub struct ProductBody {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub price_without_vat: Decimal,
    pub vat_amount: Decimal,
    pub price_with_vat: Decimal,
    pub unit: i16,
    pub stock_quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Decimal,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub category_name: String,
    pub price_without_vat: Decimal,
    pub vat_amount: Decimal,
    pub price_with_vat: Decimal,
    pub unit: i16,
    pub unit_display: &'static str,
    pub stock_quantity: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn to_dto(entry: ProductWithCategory) -> ProductDto {
    let product = entry.product;
    ProductDto {
        id: product.id.as_uuid(),
        name: product.name,
        description: product.description,
        category_id: product.category_id.as_uuid(),
        category_name: entry.category_name,
        price_without_vat: product.price_without_vat,
        vat_amount: product.vat_amount,
        price_with_vat: product.price_with_vat,
        unit: product.unit.as_i16(),
        unit_display: product.unit.symbol(),
        stock_quantity: product.stock_quantity,
        is_active: product.is_active,
        created_at: product.created_at,
        updated_at: product.updated_at,
    }
}

fn to_input(body: ProductBody) -> Result<ProductInput, ApiError> {
    let unit = UnitOfMeasure::try_from(body.unit)
        .map_err(|_| ApiError::BadRequest("Invalid unit of measure.".to_string()))?;
    Ok(ProductInput {
        name: body.name,
        description: body.description,
        category_id: body.category_id.into(),
        price_without_vat: body.price_without_vat,
        vat_amount: body.vat_amount,
        price_with_vat: body.price_with_vat,
        unit,
        stock_quantity: body.stock_quantity,
    })
}

// -- Handlers --

/// GET /products — paginated listing with filters.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<PageDto<ProductDto>>, ApiError> {
    let filter = ProductFilter {
        category_id: query.category_id.map(Into::into),
        search: query.search,
        include_inactive: query.include_inactive,
    };
    let page = state
        .catalog
        .products(&filter, PageRequest::new(query.page, query.page_size))
        .await?;
    Ok(Json(PageDto::from_page(page, to_dto)))
}

/// GET /products/low-stock — active products at or below the threshold.
#[tracing::instrument(skip(state))]
pub async fn low_stock<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Vec<ProductDto>>, ApiError> {
    let products = state.catalog.low_stock(query.threshold).await?;
    Ok(Json(products.into_iter().map(to_dto).collect()))
}

/// GET /products/{id} — product detail.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = state.catalog.product(ProductId::from_uuid(id)).await?;
    Ok(Json(to_dto(product)))
}

/// POST /products — create a product.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<ProductBody>,
) -> Result<(StatusCode, Json<ProductDto>), ApiError> {
    let created = state.catalog.create_product(to_input(body)?).await?;
    Ok((StatusCode::CREATED, Json(to_dto(created))))
}

/// PUT /products/{id} — update a product.
#[tracing::instrument(skip(state, body))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProductBody>,
) -> Result<Json<ProductDto>, ApiError> {
    let updated = state
        .catalog
        .update_product(ProductId::from_uuid(id), to_input(body)?)
        .await?;
    Ok(Json(to_dto(updated)))
}

/// DELETE /products/{id} — deactivate a product (soft delete).
#[tracing::instrument(skip(state))]
pub async fn deactivate<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .catalog
        .deactivate_product(ProductId::from_uuid(id))
        .await?;
    Ok(Json(MessageResponse {
        message: "The product was deactivated.".to_string(),
    }))
}
