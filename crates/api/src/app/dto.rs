//! Request/response DTOs and JSON mapping helpers.

use serde::Deserialize;
use serde_json::json;

use bindery_checkout::{CheckoutOutcome, Quote, ShippingAddress};
use bindery_generation::{BookSnapshot, GenerationStatus, Unit};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// `next_unit` or `regenerate_unit`.
    pub kind: bindery_generation::GenerationKind,
    pub target_index: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub book_id: String,
    pub address: ShippingAddress,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub book_id: String,
    pub quote_token: String,
    pub shipping_level: bindery_checkout::ShippingLevel,
}

// -------------------------
// Response mapping
// -------------------------

pub fn book_to_json(book: &BookSnapshot) -> serde_json::Value {
    json!({
        "id": book.id.to_string(),
        "title": book.title,
        "units": book.units.iter().map(unit_to_json).collect::<Vec<_>>(),
        "generation_status": status_to_json(&book.status),
    })
}

pub fn unit_to_json(unit: &Unit) -> serde_json::Value {
    json!({
        "index": unit.index,
        "content": unit.content,
        "generated_at": unit.generated_at.to_rfc3339(),
    })
}

pub fn status_to_json(status: &GenerationStatus) -> serde_json::Value {
    json!({
        "status": status.status,
        "progress": status.progress,
        "last_error": status.last_error,
    })
}

pub fn quote_to_json(quote: &Quote) -> serde_json::Value {
    json!({
        "quote_token": quote.token.to_string(),
        "expires_at": quote.expires_at.to_rfc3339(),
        "base_price": quote.base_price,
        "currency": quote.currency,
        "shipping_options": quote.shipping_options,
        "recommended_level": quote.recommended().map(|o| o.level),
    })
}

pub fn outcome_to_json(outcome: &CheckoutOutcome) -> serde_json::Value {
    json!({
        "order_id": outcome.order_id.to_string(),
        "redirect_url": outcome.redirect_url,
    })
}
