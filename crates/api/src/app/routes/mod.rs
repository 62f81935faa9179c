use axum::Router;

pub mod admin;
pub mod books;
pub mod checkout;
pub mod generation;
pub mod progress;
pub mod system;

/// Router for all application endpoints (health is mounted separately).
pub fn router() -> Router {
    Router::new()
        .merge(books::router())
        .merge(generation::router())
        .merge(progress::router())
        .nest("/checkout", checkout::router())
        .nest("/admin", admin::router())
}
