//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use balance::GatewayError;
use saga::OrderError;

/// API-level error type that maps to HTTP responses.
///
/// The core reports failure kinds; the status-code mapping lives only
/// here at the boundary.
#[derive(Debug)]
pub enum ApiError {
    /// Saga or validation failure from an order operation.
    Order(OrderError),
    /// Remote balance-service failure outside a saga (catalog fetch).
    Gateway(GatewayError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Order(err) => order_error_to_response(err),
            ApiError::Gateway(err) => {
                tracing::error!(error = %err, "balance service unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    let status = match &err {
        OrderError::Validation(_) => StatusCode::BAD_REQUEST,
        OrderError::InsufficientBalance(_) => StatusCode::PAYMENT_REQUIRED,
        OrderError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        OrderError::ExternalService(_) => {
            tracing::error!(error = %err, "order operation failed on an external dependency");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, err.to_string())
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Gateway(err)
    }
}
