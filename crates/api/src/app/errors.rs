use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

/// Uniform JSON error body: `{"error": code, "message": ...}`.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// 404 for an unknown (or unloadable) tenant, always naming the id so the
/// caller never sees a bare framework error page.
pub fn tenant_not_found(tenant_id: &str, reason: Option<String>) -> axum::response::Response {
    let message = match &reason {
        Some(reason) => format!("tenant {tenant_id} failed to load: {reason}"),
        None => format!("no tenant with id {tenant_id}"),
    };
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({
            "error": "tenant_not_found",
            "tenant_id": tenant_id,
            "message": message,
        })),
    )
        .into_response()
}
