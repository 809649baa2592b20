//! HTTP API server for the order-management backend.
//!
//! Thin transport layer: routes, DTO shaping (integer wire enums with
//! computed display strings), error→status mapping, structured logging
//! and Prometheus metrics. All business behavior lives in the domain
//! crate.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use domain::{CatalogService, DeliveryService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Orders
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/stats", get(routes::orders::stats::<S>))
        .route("/orders/recent", get(routes::orders::recent::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/confirm", put(routes::orders::confirm::<S>))
        .route("/orders/{id}/complete", put(routes::orders::complete::<S>))
        .route("/orders/{id}/cancel", put(routes::orders::cancel::<S>))
        .route(
            "/orders/{id}/delivery-fee",
            put(routes::orders::set_delivery_fee::<S>),
        )
        // Deliveries
        .route("/invoices", post(routes::invoices::create::<S>))
        .route("/invoices", get(routes::invoices::list::<S>))
        .route("/invoices/{id}", get(routes::invoices::get::<S>))
        // Catalog
        .route("/products", post(routes::products::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/low-stock", get(routes::products::low_stock::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", put(routes::products::update::<S>))
        .route("/products/{id}", delete(routes::products::deactivate::<S>))
        .route("/categories", post(routes::categories::create::<S>))
        .route("/categories", get(routes::categories::list::<S>))
        .route("/categories/{id}", get(routes::categories::get::<S>))
        .route("/categories/{id}", put(routes::categories::rename::<S>))
        .route("/categories/{id}", delete(routes::categories::delete::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over any store implementation.
pub fn create_state<S: Store + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orders: OrderService::new(store.clone()),
        catalog: CatalogService::new(store.clone()),
        deliveries: DeliveryService::new(store),
    })
}
