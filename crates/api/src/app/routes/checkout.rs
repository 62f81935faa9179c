//! Quote issuance and checkout submission.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use bindery_checkout::QuoteToken;
use bindery_generation::BookStore;

use crate::app::{dto, errors, services::AppServices};

use super::books::parse_book_id;

pub fn router() -> Router {
    Router::new()
        .route("/quote", post(issue_quote))
        .route("/submit", post(submit))
}

/// POST /checkout/quote
///
/// Prices shipping for an address and returns a time-limited quote token.
async fn issue_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::QuoteRequest>,
) -> axum::response::Response {
    let book_id = match parse_book_id(&body.book_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if services.books.book(book_id).is_none() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "book not found");
    }

    match services.issuer.issue(book_id, &body.address, Utc::now()) {
        Ok(quote) => {
            services.quotes.register(quote.clone());
            tracing::info!(book_id = %book_id, token = %quote.token, "quote issued");
            (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response()
        }
        Err(e) => errors::checkout_error_to_response(e),
    }
}

/// POST /checkout/submit
///
/// Consumes the quote token and runs the processing steps. The response is
/// the authoritative result; the progress room is UX only.
async fn submit(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SubmitRequest>,
) -> axum::response::Response {
    let book_id = match parse_book_id(&body.book_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let token: QuoteToken = match body.quote_token.parse() {
        Ok(v) => v,
        Err(e) => return errors::checkout_error_to_response(e),
    };

    match services
        .processor
        .process(book_id, token, body.shipping_level, Utc::now())
    {
        Ok(outcome) => (StatusCode::OK, Json(dto::outcome_to_json(&outcome))).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}
