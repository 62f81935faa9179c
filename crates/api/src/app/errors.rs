//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bindery_checkout::CheckoutError;
use bindery_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn checkout_error_to_response(err: CheckoutError) -> axum::response::Response {
    match err {
        CheckoutError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        CheckoutError::QuoteExpired => json_error(
            StatusCode::GONE,
            "quote_expired",
            "quote expired; request a new quote",
        ),
        CheckoutError::QuoteAlreadyUsed => json_error(
            StatusCode::CONFLICT,
            "quote_already_used",
            "quote token was already submitted",
        ),
        CheckoutError::UnknownQuoteToken => {
            json_error(StatusCode::NOT_FOUND, "unknown_quote_token", "unknown quote token")
        }
        CheckoutError::UnknownShippingLevel => json_error(
            StatusCode::BAD_REQUEST,
            "unknown_shipping_level",
            "shipping level not offered by this quote",
        ),
        CheckoutError::RateUnavailable(msg) => {
            json_error(StatusCode::BAD_GATEWAY, "rate_unavailable", msg)
        }
        CheckoutError::StepFailed { step, message } => json_error(
            StatusCode::BAD_GATEWAY,
            "checkout_step_failed",
            format!("step '{step}' failed: {message}"),
        ),
        CheckoutError::InvalidStage(msg) => {
            json_error(StatusCode::CONFLICT, "invalid_stage", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
