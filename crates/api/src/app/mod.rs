//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: infrastructure wiring (book store, job queue, executor,
//!   quote registry, progress rooms)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Process configuration, read from the environment with dev defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Quote validity window in seconds.
    pub quote_validity_secs: i64,
    /// Book base price in minor currency units.
    pub base_price: u64,
    pub currency: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            quote_validity_secs: 600,
            base_price: 2900,
            currency: "USD".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            quote_validity_secs: std::env::var("QUOTE_VALIDITY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.quote_validity_secs),
            base_price: std::env::var("BASE_PRICE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.base_price),
            currency: std::env::var("CURRENCY").unwrap_or(defaults.currency),
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: AppConfig) -> Router {
    let services = Arc::new(services::build_services(&config));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
