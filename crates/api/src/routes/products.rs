//! Product catalog endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use balance::{BalanceGateway, ProductSnapshot};
use store::OrderStore;

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// GET /products — list the catalog as the balance service sees it.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + 'static, G: BalanceGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
) -> Result<Json<Vec<ProductSnapshot>>, ApiError> {
    let products = state.gateway.fetch_catalog().await?;
    Ok(Json(products))
}
