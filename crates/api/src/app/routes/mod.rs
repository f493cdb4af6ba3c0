use axum::{Router, routing::get};

pub mod jobs;
pub mod system;
pub mod tenants;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/jobs", jobs::router())
        .merge(tenants::router())
}
