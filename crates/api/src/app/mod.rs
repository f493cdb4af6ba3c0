//! HTTP application wiring (axum router + service wiring).
//!
//! Layout, one concern per file:
//! - `services.rs`: owned registries + startup reconciliation
//! - `routes/`: HTTP routes + handlers (jobs, tenants, system)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{Extension, Router};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
///
/// The services handed in are already reconciled: every durable tenant was
/// re-activated before this router accepts any traffic.
pub fn build_app(services: Arc<AppServices>) -> Router {
    routes::router().layer(Extension(services))
}
