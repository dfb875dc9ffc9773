//! Order lifecycle endpoints: create, complete, cancel.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use balance::BalanceGateway;
use common::OrderId;
use saga::{CompletionResult, OrderSaga, PreorderResult};
use serde::{Deserialize, Serialize};
use store::OrderStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore, G: BalanceGateway> {
    pub saga: OrderSaga<S, G>,
    pub gateway: G,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub product_id: String,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub order_id: OrderId,
    pub cancelled: bool,
}

// -- Handlers --

/// POST /orders — create an order: reserve stock locally, block funds remotely.
#[tracing::instrument(skip(state, req), fields(product_id = %req.product_id, quantity = req.quantity))]
pub async fn create<S: OrderStore + 'static, G: BalanceGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<PreorderResult>, ApiError> {
    let result = state.saga.create_order(&req.product_id, req.quantity).await?;
    Ok(Json(result))
}

/// POST /orders/{id}/complete — capture the blocked funds and finalize the order.
#[tracing::instrument(skip(state))]
pub async fn complete<S: OrderStore + 'static, G: BalanceGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<i64>,
) -> Result<Json<CompletionResult>, ApiError> {
    let result = state.saga.complete_order(OrderId::new(id)).await?;
    Ok(Json(result))
}

/// POST /orders/{id}/cancel — cancel a blocked order and restore its stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: OrderStore + 'static, G: BalanceGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<i64>,
) -> Result<Json<CancelResponse>, ApiError> {
    let order_id = OrderId::new(id);
    let cancelled = state.saga.cancel_order(order_id).await?;
    Ok(Json(CancelResponse {
        order_id,
        cancelled,
    }))
}
