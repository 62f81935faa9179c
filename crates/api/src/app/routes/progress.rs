//! Server-sent progress stream, one room per book.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::app::services::{self, AppServices};

use super::books::parse_book_id;

pub fn router() -> Router {
    Router::new().route("/books/:id/progress", get(stream_progress))
}

/// GET /books/:id/progress
///
/// Joins the book's progress room. Events published before the subscription
/// are not replayed.
async fn stream_progress(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let book_id = match parse_book_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    services::book_progress_stream(services, book_id).into_response()
}
