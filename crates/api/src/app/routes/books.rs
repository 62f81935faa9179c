//! Book creation and retrieval.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use bindery_core::BookId;
use bindery_generation::BookStore;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/books", post(create_book))
        .route("/books/:id", get(get_book))
}

pub fn parse_book_id(id: &str) -> Result<BookId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid book id"))
}

async fn create_book(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateBookRequest>,
) -> axum::response::Response {
    if body.title.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "title is required");
    }

    let id = services.books.create(body.title.trim());
    tracing::info!(book_id = %id, "book created");

    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.to_string() })),
    )
        .into_response()
}

async fn get_book(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let book_id = match parse_book_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.books.book(book_id) {
        Some(book) => (StatusCode::OK, Json(dto::book_to_json(&book))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "book not found"),
    }
}
