//! Generation job endpoints: submit a prompt, poll for progress.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use launchkit_core::JobId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_job))
        .route("/:job_id", get(get_job))
}

/// POST /jobs
///
/// Accepts a product idea and starts the pipeline asynchronously; the
/// response carries only the id to poll.
pub async fn create_job(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateJobRequest>,
) -> axum::response::Response {
    if body.prompt.trim().is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "prompt must not be empty",
        );
    }

    let job_id = services.driver.start(body.prompt).await;
    (
        StatusCode::ACCEPTED,
        Json(dto::CreateJobResponse {
            job_id: job_id.to_string(),
        }),
    )
        .into_response()
}

/// GET /jobs/:job_id
///
/// Latest consistent snapshot of the job: status, progress, steps, logs,
/// and the result tenant id once completed.
pub async fn get_job(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_id): Path<String>,
) -> axum::response::Response {
    let job_id = match job_id.parse::<JobId>() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid job id");
        }
    };

    match services.jobs.snapshot(&job_id).await {
        Some(job) => (StatusCode::OK, Json(job)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "job not found"),
    }
}
