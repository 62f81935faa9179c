//! Operational endpoints: job inspection, dead-letter queue, stats.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use bindery_core::JobId;
use bindery_generation::BookStore;
use bindery_infra::jobs::{JobStore, JobStoreError};

use crate::app::{errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/jobs/:id", get(get_job))
        .route("/dead-letters", get(list_dead_letters))
        .route("/dead-letters/:id/retry", post(retry_dead_letter))
        .route("/stats", get(stats))
}

fn parse_job_id(id: &str) -> Result<JobId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid job id"))
}

/// GET /admin/jobs/:id
async fn get_job(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let job_id = match parse_job_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.jobs.get(job_id) {
        Ok(Some(job)) => (StatusCode::OK, Json(job)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "job not found"),
        Err(e) => store_error_to_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

/// GET /admin/dead-letters
async fn list_dead_letters(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match services.jobs.list_dead_letters(query.limit.unwrap_or(50)) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// POST /admin/dead-letters/:id/retry
///
/// Moves a dead-lettered job back onto the queue with a fresh attempt budget
/// and flips the book's status register back to in-progress. If the book
/// refuses (gone, or another generation already running) the job returns to
/// the dead-letter queue.
async fn retry_dead_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let job_id = match parse_job_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let job = match services.jobs.retry_dead_letter(job_id) {
        Ok(job) => job,
        Err(e) => return store_error_to_response(e),
    };

    let book_id = job.request.book_id;
    let Some(book) = services.books.book(book_id) else {
        let _ = services
            .jobs
            .dead_letter(job, "book no longer exists".to_string());
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "book not found");
    };
    if let Err(e) = services
        .books
        .begin_generation(book_id, job.request.progress_descriptor(book.unit_count()))
    {
        let _ = services
            .jobs
            .dead_letter(job, "book is not ready for a retry".to_string());
        return errors::domain_error_to_response(e);
    }

    tracing::info!(job_id = %job.id, book_id = %book_id, "dead-lettered job requeued");
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "job_id": job.id.to_string() })),
    )
        .into_response()
}

/// GET /admin/stats
async fn stats(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let jobs = match services.jobs.stats() {
        Ok(s) => s,
        Err(e) => return store_error_to_response(e),
    };
    let executor = services.executor.stats();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "jobs": jobs,
            "executor": executor,
        })),
    )
        .into_response()
}

fn store_error_to_response(err: JobStoreError) -> axum::response::Response {
    match err {
        JobStoreError::NotFound(_) => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        JobStoreError::AlreadyExists(_) => {
            errors::json_error(StatusCode::CONFLICT, "conflict", err.to_string())
        }
        JobStoreError::Storage(msg) => {
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}
