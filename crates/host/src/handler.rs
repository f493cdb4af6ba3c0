//! The narrow contract every activated tenant must satisfy.
//!
//! The host and router only ever see this interface; how a handler came to
//! exist (manifest compilation today, anything else tomorrow) is an
//! activation detail.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// A request as seen by a tenant application.
///
/// Framework-free on purpose: the API layer translates from its HTTP types,
/// and everything passes through verbatim (method, path, query, headers,
/// body).
#[derive(Debug, Clone)]
pub struct TenantRequest {
    /// Upper-case HTTP method.
    pub method: String,
    /// Path relative to the tenant mount, always starting with `/`.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TenantRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            query: None,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// A response produced by a tenant application.
#[derive(Debug, Clone)]
pub struct TenantResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TenantResponse {
    /// JSON response with the matching content-type header.
    pub fn json(status: u16, body: &JsonValue) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: serde_json::to_vec(body).unwrap_or_default(),
        }
    }

    /// Parse the body as JSON (test/diagnostic helper).
    pub fn body_json(&self) -> Option<JsonValue> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Error raised by a tenant's own application logic while serving a request.
///
/// This is a per-request fault: the host converts it to a 500-class response
/// and the tenant stays loaded.
#[derive(Debug, Error)]
pub enum TenantInvocationError {
    #[error("tenant application error: {0}")]
    App(String),
}

/// A live, invocable tenant application.
#[async_trait]
pub trait TenantHandler: Send + Sync {
    async fn handle(&self, req: TenantRequest) -> Result<TenantResponse, TenantInvocationError>;
}
