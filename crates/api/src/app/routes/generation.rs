//! Generation dispatch and status polling.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use bindery_generation::{BookStore, GenerationKind, GenerationRequest};
use bindery_infra::jobs::{GenerationJob, JobStore};

use crate::app::{dto, errors, services::AppServices};

use super::books::parse_book_id;

pub fn router() -> Router {
    Router::new()
        .route("/books/:id/generate", post(dispatch_generation))
        .route("/books/:id/generation-status", get(generation_status))
}

/// POST /books/:id/generate
///
/// Validates, flips the status register to in-progress, enqueues the job, and
/// returns 202. Completion is observed via polling, not this response.
async fn dispatch_generation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::GenerateRequest>,
) -> axum::response::Response {
    let book_id = match parse_book_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let Some(book) = services.books.book(book_id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "book not found");
    };

    let request = match body.kind {
        GenerationKind::NextUnit => GenerationRequest::next_unit(book_id),
        GenerationKind::RegenerateUnit => GenerationRequest {
            book_id,
            kind: GenerationKind::RegenerateUnit,
            target_index: body.target_index,
        },
    };

    if let Err(e) = request.validate(book.unit_count()) {
        return errors::domain_error_to_response(e);
    }

    // One in-flight generation per book; the store decides under its own
    // lock and answers 409 through the conflict mapping.
    if let Err(e) = services
        .books
        .begin_generation(book_id, request.progress_descriptor(book.unit_count()))
    {
        return errors::domain_error_to_response(e);
    }

    let job = GenerationJob::new(request);
    let job_id = match services.jobs.enqueue(job) {
        Ok(id) => id,
        Err(e) => {
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "enqueue_failed", e.to_string())
        }
    };

    tracing::info!(book_id = %book_id, job_id = %job_id, kind = ?body.kind, "generation dispatched");

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "job_id": job_id.to_string() })),
    )
        .into_response()
}

/// GET /books/:id/generation-status
///
/// Pure read of the status register; safe to poll at sub-second intervals.
async fn generation_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let book_id = match parse_book_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.books.status(book_id) {
        Some(status) => (StatusCode::OK, Json(dto::status_to_json(&status))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "book not found"),
    }
}
