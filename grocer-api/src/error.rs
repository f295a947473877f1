use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use grocer_cart::CartError;
use grocer_order::{CheckoutError, OrderError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError { code: &'static str, message: String },
    NotFoundError(String),
    ConflictError(String),
    PaymentGatewayError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::ValidationError { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, "conflict", msg),
            AppError::PaymentGatewayError(msg) => (StatusCode::BAD_GATEWAY, "payment_failed", msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal Server Error".to_string())
            },
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        let message = err.user_message().to_string();
        match err {
            CheckoutError::Validation(v) => AppError::ValidationError { code: v.code(), message },
            CheckoutError::SubmissionInFlight => AppError::ConflictError(message),
            CheckoutError::PaymentGateway { .. } => AppError::PaymentGatewayError(message),
            CheckoutError::Persistence(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => AppError::NotFoundError(format!("Order not found: {}", id)),
            OrderError::InvalidTransition { .. } | OrderError::Duplicate(_) => {
                AppError::ConflictError(err.to_string())
            }
            OrderError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::LineNotFound(_) => AppError::NotFoundError(err.to_string()),
            CartError::NegativePrice(_) => AppError::ValidationError {
                code: "negative_price",
                message: err.to_string(),
            },
            CartError::QuantityOverflow(_) => AppError::ValidationError {
                code: "invalid_quantity",
                message: err.to_string(),
            },
            CartError::AmountOutOfRange(_) => AppError::ValidationError {
                code: "amount_out_of_range",
                message: err.to_string(),
            },
        }
    }
}
