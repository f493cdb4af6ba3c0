//! Manifest compiler: turns generated tenant source into a live handler.
//!
//! Tenant source is a JSON document whose top-level `app` object is the
//! conventional entry point (name + declared routes). Compilation validates
//! the whole declaration up front, so a tenant that would misbehave fails at
//! activation time with a clear error instead of on its first request.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use thiserror::Error;

use crate::handler::{TenantHandler, TenantInvocationError, TenantRequest, TenantResponse};

/// Tenant source failed to load.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("source is not valid JSON: {0}")]
    InvalidSource(String),

    #[error("source does not declare an `app` entry point")]
    MissingEntryPoint,

    #[error("malformed `app` declaration: {0}")]
    MalformedApp(String),

    #[error("invalid route `{method} {path}`: {reason}")]
    InvalidRoute {
        method: String,
        path: String,
        reason: String,
    },
}

const KNOWN_METHODS: [&str; 7] = ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

#[derive(Debug, Deserialize)]
struct AppManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    routes: Vec<RouteSpec>,
}

#[derive(Debug, Deserialize)]
struct RouteSpec {
    method: String,
    path: String,
    #[serde(default)]
    behavior: Behavior,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    body: Option<JsonValue>,
    /// Only meaningful for `behavior = "fail"`.
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Behavior {
    /// Canned status/body.
    #[default]
    Static,
    /// Reflect method, path, query and body back to the caller.
    Echo,
    /// Simulated application fault (exercises per-request isolation).
    Fail,
}

/// A compiled route, validated at activation time.
#[derive(Debug, Clone)]
struct Route {
    method: String,
    path: String,
    behavior: Behavior,
    status: u16,
    body: JsonValue,
    message: String,
}

/// The activated form of a tenant application.
///
/// Each activation builds a fresh instance; nothing is shared between
/// tenants or between activations of the same tenant.
#[derive(Debug)]
pub struct ManifestApp {
    name: Option<String>,
    routes: Vec<Route>,
}

/// Compile tenant source into a handler.
pub fn compile(source: &str) -> Result<ManifestApp, ActivationError> {
    let doc: JsonValue = serde_json::from_str(source)
        .map_err(|e| ActivationError::InvalidSource(e.to_string()))?;

    let app = doc
        .get("app")
        .ok_or(ActivationError::MissingEntryPoint)?
        .clone();

    let manifest: AppManifest = serde_json::from_value(app)
        .map_err(|e| ActivationError::MalformedApp(e.to_string()))?;

    let mut routes = Vec::with_capacity(manifest.routes.len());
    for spec in manifest.routes {
        routes.push(compile_route(spec)?);
    }

    Ok(ManifestApp {
        name: manifest.name,
        routes,
    })
}

fn compile_route(spec: RouteSpec) -> Result<Route, ActivationError> {
    let method = spec.method.to_ascii_uppercase();
    if !KNOWN_METHODS.contains(&method.as_str()) {
        return Err(ActivationError::InvalidRoute {
            method: spec.method,
            path: spec.path,
            reason: "unknown HTTP method".to_string(),
        });
    }
    if !spec.path.starts_with('/') {
        return Err(ActivationError::InvalidRoute {
            method,
            path: spec.path,
            reason: "path must start with '/'".to_string(),
        });
    }

    let status = spec.status.unwrap_or(200);
    if !(100..=599).contains(&status) {
        return Err(ActivationError::InvalidRoute {
            method,
            path: spec.path,
            reason: format!("status {status} out of range"),
        });
    }

    Ok(Route {
        method,
        path: spec.path,
        behavior: spec.behavior,
        status,
        body: spec.body.unwrap_or(JsonValue::Null),
        message: spec
            .message
            .unwrap_or_else(|| "simulated application fault".to_string()),
    })
}

impl ManifestApp {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn find_route(&self, method: &str, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|r| r.method == method && r.path == path)
    }
}

#[async_trait]
impl TenantHandler for ManifestApp {
    async fn handle(&self, req: TenantRequest) -> Result<TenantResponse, TenantInvocationError> {
        let Some(route) = self.find_route(&req.method, &req.path) else {
            // The tenant's own 404, distinct from the router's
            // tenant-not-found response.
            return Ok(TenantResponse::json(
                404,
                &json!({
                    "error": "route_not_found",
                    "method": req.method,
                    "path": req.path,
                }),
            ));
        };

        match route.behavior {
            Behavior::Static => Ok(TenantResponse::json(route.status, &route.body)),
            Behavior::Echo => {
                let body_text = String::from_utf8_lossy(&req.body).into_owned();
                Ok(TenantResponse::json(
                    route.status,
                    &json!({
                        "method": req.method,
                        "path": req.path,
                        "query": req.query,
                        "body": body_text,
                    }),
                ))
            }
            Behavior::Fail => Err(TenantInvocationError::App(route.message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_source() -> String {
        json!({
            "app": {
                "name": "Demo",
                "routes": [
                    {"method": "GET", "path": "/health", "body": {"status": "ok"}},
                    {"method": "POST", "path": "/echo", "behavior": "echo"},
                    {"method": "GET", "path": "/boom", "behavior": "fail", "message": "kaboom"},
                    {"method": "GET", "path": "/gone", "status": 410, "body": {"error": "gone"}}
                ]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn static_route_returns_declared_body() {
        let app = compile(&demo_source()).unwrap();
        let resp = app
            .handle(TenantRequest::new("GET", "/health"))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body_json().unwrap()["status"], "ok");
    }

    #[tokio::test]
    async fn static_route_honors_declared_status() {
        let app = compile(&demo_source()).unwrap();
        let resp = app
            .handle(TenantRequest::new("GET", "/gone"))
            .await
            .unwrap();
        assert_eq!(resp.status, 410);
    }

    #[tokio::test]
    async fn echo_reflects_the_request() {
        let app = compile(&demo_source()).unwrap();
        let req = TenantRequest::new("POST", "/echo")
            .with_query("who=me")
            .with_body(r#"{"hi":1}"#);

        let resp = app.handle(req).await.unwrap();
        let body = resp.body_json().unwrap();
        assert_eq!(body["method"], "POST");
        assert_eq!(body["query"], "who=me");
        assert_eq!(body["body"], r#"{"hi":1}"#);
    }

    #[tokio::test]
    async fn fail_route_raises_an_invocation_error() {
        let app = compile(&demo_source()).unwrap();
        let err = app
            .handle(TenantRequest::new("GET", "/boom"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("kaboom"));
    }

    #[tokio::test]
    async fn unmatched_path_is_the_tenants_own_404() {
        let app = compile(&demo_source()).unwrap();
        let resp = app
            .handle(TenantRequest::new("GET", "/nope"))
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body_json().unwrap()["error"], "route_not_found");
    }

    #[test]
    fn rejects_non_json_source() {
        assert!(matches!(
            compile("def handler(): pass"),
            Err(ActivationError::InvalidSource(_))
        ));
    }

    #[test]
    fn rejects_source_without_entry_point() {
        assert!(matches!(
            compile(r#"{"application": {}}"#),
            Err(ActivationError::MissingEntryPoint)
        ));
    }

    #[test]
    fn rejects_unknown_method() {
        let src = json!({
            "app": {"routes": [{"method": "YEET", "path": "/x"}]}
        })
        .to_string();
        assert!(matches!(
            compile(&src),
            Err(ActivationError::InvalidRoute { .. })
        ));
    }

    #[test]
    fn rejects_relative_path() {
        let src = json!({
            "app": {"routes": [{"method": "GET", "path": "health"}]}
        })
        .to_string();
        assert!(matches!(
            compile(&src),
            Err(ActivationError::InvalidRoute { .. })
        ));
    }

    #[test]
    fn empty_route_list_is_a_valid_app() {
        let app = compile(r#"{"app": {"name": "bare", "routes": []}}"#).unwrap();
        assert_eq!(app.name(), Some("bare"));
    }
}
