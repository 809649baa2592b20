//! Category management endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use common::CategoryId;
use domain::CategoryRequest;
use serde::{Deserialize, Serialize};
use store::{Category, Store};
use uuid::Uuid;

use crate::error::ApiError;

use super::orders::{AppState, MessageResponse};

#[derive(Deserialize)]
pub struct CategoryBody {
    pub name: String,
}

#[derive(Serialize)]
pub struct CategoryDto {
    pub id: Uuid,
    pub name: String,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

fn to_dto(category: Category, product_count: i64) -> CategoryDto {
    CategoryDto {
        id: category.id.as_uuid(),
        name: category.name,
        product_count,
        created_at: category.created_at,
    }
}

/// GET /categories — all categories with product counts.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryDto>>, ApiError> {
    let categories = state.catalog.categories().await?;
    Ok(Json(
        categories
            .into_iter()
            .map(|(category, count)| to_dto(category, count))
            .collect(),
    ))
}

/// GET /categories/{id} — one category.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryDto>, ApiError> {
    let (category, count) = state.catalog.category(CategoryId::from_uuid(id)).await?;
    Ok(Json(to_dto(category, count)))
}

/// POST /categories — create a category.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<CategoryBody>,
) -> Result<(StatusCode, Json<CategoryDto>), ApiError> {
    let category = state
        .catalog
        .create_category(CategoryRequest { name: body.name })
        .await?;
    Ok((StatusCode::CREATED, Json(to_dto(category, 0))))
}

/// PUT /categories/{id} — rename a category.
#[tracing::instrument(skip(state, body))]
pub async fn rename<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
    Json(body): Json<CategoryBody>,
) -> Result<Json<CategoryDto>, ApiError> {
    let id = CategoryId::from_uuid(id);
    let category = state
        .catalog
        .rename_category(id, CategoryRequest { name: body.name })
        .await?;
    let (_, count) = state.catalog.category(id).await?;
    Ok(Json(to_dto(category, count)))
}

/// DELETE /categories/{id} — delete an empty category.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .catalog
        .delete_category(CategoryId::from_uuid(id))
        .await?;
    Ok(Json(MessageResponse {
        message: "The category was deleted.".to_string(),
    }))
}
