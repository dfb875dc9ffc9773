//! HTTP API server for the order payment system.
//!
//! Exposes the order saga (create/complete/cancel) and the remote
//! product catalog over REST, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use balance::BalanceGateway;
use common::Money;
use domain::Product;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::OrderSaga;
use store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, G>(state: Arc<AppState<S, G>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + 'static,
    G: BalanceGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list::<S, G>))
        .route("/orders", post(routes::orders::create::<S, G>))
        .route("/orders/{id}/complete", post(routes::orders::complete::<S, G>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S, G>))
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

/// Creates the shared application state from a store and a gateway.
///
/// The gateway is held twice: owned by the saga for the payment steps,
/// and directly by the state for the catalog route.
pub fn create_state<S, G>(store: S, gateway: G) -> Arc<AppState<S, G>>
where
    S: OrderStore,
    G: BalanceGateway + Clone,
{
    Arc::new(AppState {
        saga: OrderSaga::new(store, gateway.clone()),
        gateway,
    })
}

/// The catalog a fresh (non-Postgres) deployment starts with.
pub fn default_catalog() -> Vec<Product> {
    vec![
        Product::new("prod-001", "Premium Smartphone", Money::from_cents(1999), "USD", 42)
            .with_description("Latest model with advanced features")
            .with_category("Electronics"),
        Product::new("prod-002", "Wireless Headphones", Money::from_cents(1499), "USD", 78)
            .with_description("Noise-cancelling with premium sound quality")
            .with_category("Electronics"),
        Product::new("prod-003", "Smart Watch", Money::from_cents(1299), "USD", 0)
            .with_description("Fitness tracking and notifications")
            .with_category("Electronics"),
        Product::new("prod-004", "Laptop", Money::from_cents(1999), "USD", 15)
            .with_description("High-performance for work and gaming")
            .with_category("Electronics"),
        Product::new("prod-005", "Wireless Charger", Money::from_cents(999), "USD", 120)
            .with_description("Fast charging for compatible devices")
            .with_category("Accessories"),
    ]
}
