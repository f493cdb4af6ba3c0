//! Tenant endpoints: metadata plus the request router that forwards
//! `/tenants/{id}/...` into the hosted application.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Extension, Path, Request},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
};

use launchkit_core::TenantId;
use launchkit_host::{InvokeError, TenantRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Bodies above this size are rejected rather than buffered.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub fn router() -> Router {
    Router::new()
        .route("/tenants", get(list_tenants))
        .route("/tenants/:tenant_id", get(get_tenant))
        .route("/tenants/:tenant_id/", any(invoke_tenant_root))
        .route("/tenants/:tenant_id/*path", any(invoke_tenant))
}

/// GET /tenants
///
/// Every stored tenant with its runtime state, loaded and failed alike.
pub async fn list_tenants(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let records = match services.store.list() {
        Ok(records) => records,
        Err(e) => {
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                e.to_string(),
            );
        }
    };

    let mut items = Vec::with_capacity(records.len());
    for record in &records {
        let entry = services.host.entry(&record.id).await;
        items.push(dto::TenantMetadata::from_parts(record, entry.as_ref()));
    }

    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

/// GET /tenants/:tenant_id
///
/// Metadata only; requests into the application itself go through the
/// wildcard route below.
pub async fn get_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Path(tenant_id): Path<String>,
) -> axum::response::Response {
    let Ok(id) = tenant_id.parse::<TenantId>() else {
        return errors::tenant_not_found(&tenant_id, None);
    };

    match services.store.get(&id) {
        Ok(Some(record)) => {
            let entry = services.host.entry(&id).await;
            (
                StatusCode::OK,
                Json(dto::TenantMetadata::from_parts(&record, entry.as_ref())),
            )
                .into_response()
        }
        Ok(None) => errors::tenant_not_found(&tenant_id, None),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            e.to_string(),
        ),
    }
}

/// ANY /tenants/:tenant_id/
pub async fn invoke_tenant_root(
    Extension(services): Extension<Arc<AppServices>>,
    Path(tenant_id): Path<String>,
    req: Request,
) -> axum::response::Response {
    route_into_tenant(services, tenant_id, String::new(), req).await
}

/// ANY /tenants/:tenant_id/*path
pub async fn invoke_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Path((tenant_id, path)): Path<(String, String)>,
    req: Request,
) -> axum::response::Response {
    route_into_tenant(services, tenant_id, path, req).await
}

/// The request router: strip the tenant prefix, pass everything else
/// through verbatim, and hand the response back untouched.
async fn route_into_tenant(
    services: Arc<AppServices>,
    tenant_id: String,
    rest: String,
    req: Request,
) -> axum::response::Response {
    let Ok(id) = tenant_id.parse::<TenantId>() else {
        return errors::tenant_not_found(&tenant_id, None);
    };

    let method = req.method().as_str().to_string();
    let query = req.uri().query().map(str::to_string);
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let body = match axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.to_string());
        }
    };

    let tenant_req = TenantRequest {
        method,
        path: format!("/{rest}"),
        query,
        headers,
        body,
    };

    match services.host.invoke(id, tenant_req).await {
        Ok(resp) => tenant_response_into_http(resp),
        Err(InvokeError::NotFound(_)) => errors::tenant_not_found(&tenant_id, None),
        Err(InvokeError::Unavailable { reason, .. }) => {
            errors::tenant_not_found(&tenant_id, Some(reason))
        }
    }
}

/// Rebuild the tenant's response verbatim (no content rewriting).
fn tenant_response_into_http(resp: launchkit_host::TenantResponse) -> Response {
    let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut out = axum::http::Response::builder().status(status);
    if let Some(headers) = out.headers_mut() {
        for (name, value) in &resp.headers {
            let Ok(name) = HeaderName::try_from(name.as_str()) else {
                continue;
            };
            let Ok(value) = HeaderValue::try_from(value.as_str()) else {
                continue;
            };
            headers.append(name, value);
        }
    }

    out.body(Body::from(resp.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
