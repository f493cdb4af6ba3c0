//! The live tenant registry and invoke-by-id dispatch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;

use launchkit_core::TenantId;

use crate::handler::{TenantHandler, TenantRequest, TenantResponse};
use crate::manifest::{self, ActivationError};

/// Whether a tenant's most recent activation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Loaded,
    Failed,
}

enum EntryState {
    Loaded { handler: Arc<dyn TenantHandler> },
    Failed { error: String },
}

struct RuntimeEntry {
    state: EntryState,
    activated_at: DateTime<Utc>,
}

/// Introspection view of one registry entry.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeEntrySnapshot {
    pub tenant_id: TenantId,
    pub load_status: LoadStatus,
    pub error: Option<String>,
    pub activated_at: DateTime<Utc>,
}

/// Why an invocation could not be dispatched.
///
/// Request-level faults inside the tenant are NOT represented here; those
/// become a 500-class [`TenantResponse`] at the host boundary.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("tenant not found: {0}")]
    NotFound(TenantId),

    #[error("tenant {tenant_id} failed to load: {reason}")]
    Unavailable { tenant_id: TenantId, reason: String },
}

/// Hosts every activated tenant application in this process.
///
/// The registry supports concurrent read/insert/update: lookups clone the
/// entry's handler out under a short read lock, so no tenant's request ever
/// waits on another tenant's dispatch or activation.
#[derive(Default)]
pub struct TenantRuntimeHost {
    entries: RwLock<HashMap<TenantId, RuntimeEntry>>,
    // Per-tenant activation locks: activations of the SAME tenant are
    // exclusive, activations of different tenants run concurrently.
    activation_locks: Mutex<HashMap<TenantId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TenantRuntimeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn activation_lock(&self, tenant_id: TenantId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .activation_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        locks.entry(tenant_id).or_default().clone()
    }

    /// Activate (or re-activate) a tenant from its source text.
    ///
    /// Compilation happens outside the registry lock; the entry is then
    /// swapped in atomically. On failure the tenant is recorded as `failed`
    /// with its error (not removed), so callers can still query why it
    /// is down.
    pub async fn activate(
        &self,
        tenant_id: TenantId,
        source: &str,
    ) -> Result<(), ActivationError> {
        let lock = self.activation_lock(tenant_id);
        let _exclusive = lock.lock().await;

        let (state, result) = match manifest::compile(source) {
            Ok(app) => {
                tracing::info!(%tenant_id, app_name = app.name().unwrap_or("<unnamed>"), "tenant activated");
                (
                    EntryState::Loaded {
                        handler: Arc::new(app),
                    },
                    Ok(()),
                )
            }
            Err(err) => {
                tracing::warn!(%tenant_id, error = %err, "tenant activation failed");
                (
                    EntryState::Failed {
                        error: err.to_string(),
                    },
                    Err(err),
                )
            }
        };

        let mut entries = self.entries.write().await;
        entries.insert(
            tenant_id,
            RuntimeEntry {
                state,
                activated_at: Utc::now(),
            },
        );
        drop(entries);

        result
    }

    /// Dispatch a request to a tenant.
    ///
    /// A fault inside the tenant's own logic is translated to a 500-class
    /// response here and never propagates; only dispatch-level problems
    /// (unknown or unloadable tenant) surface as [`InvokeError`].
    pub async fn invoke(
        &self,
        tenant_id: TenantId,
        req: TenantRequest,
    ) -> Result<TenantResponse, InvokeError> {
        let handler = {
            let entries = self.entries.read().await;
            match entries.get(&tenant_id) {
                None => return Err(InvokeError::NotFound(tenant_id)),
                Some(entry) => match &entry.state {
                    EntryState::Failed { error } => {
                        return Err(InvokeError::Unavailable {
                            tenant_id,
                            reason: error.clone(),
                        });
                    }
                    EntryState::Loaded { handler } => handler.clone(),
                },
            }
        };

        match handler.handle(req).await {
            Ok(resp) => Ok(resp),
            Err(err) => {
                tracing::error!(%tenant_id, error = %err, "tenant request fault");
                Ok(TenantResponse::json(
                    500,
                    &json!({
                        "error": "tenant_error",
                        "message": err.to_string(),
                    }),
                ))
            }
        }
    }

    /// Ids of every successfully loaded tenant.
    pub async fn list_loaded(&self) -> Vec<TenantId> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|(_, e)| matches!(e.state, EntryState::Loaded { .. }))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Introspect one entry.
    pub async fn entry(&self, tenant_id: &TenantId) -> Option<RuntimeEntrySnapshot> {
        let entries = self.entries.read().await;
        entries.get(tenant_id).map(|e| snapshot(*tenant_id, e))
    }

    /// Introspect every entry, loaded and failed alike.
    pub async fn entries(&self) -> Vec<RuntimeEntrySnapshot> {
        let entries = self.entries.read().await;
        let mut out: Vec<_> = entries.iter().map(|(id, e)| snapshot(*id, e)).collect();
        out.sort_by_key(|s| s.activated_at);
        out
    }
}

fn snapshot(tenant_id: TenantId, entry: &RuntimeEntry) -> RuntimeEntrySnapshot {
    match &entry.state {
        EntryState::Loaded { .. } => RuntimeEntrySnapshot {
            tenant_id,
            load_status: LoadStatus::Loaded,
            error: None,
            activated_at: entry.activated_at,
        },
        EntryState::Failed { error } => RuntimeEntrySnapshot {
            tenant_id,
            load_status: LoadStatus::Failed,
            error: Some(error.clone()),
            activated_at: entry.activated_at,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_source(name: &str) -> String {
        json!({
            "app": {
                "name": name,
                "routes": [
                    {"method": "GET", "path": "/health", "body": {"status": "ok"}},
                    {"method": "GET", "path": "/boom", "behavior": "fail"}
                ]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn activate_then_invoke() {
        let host = TenantRuntimeHost::new();
        let id = TenantId::new();

        host.activate(id, &good_source("a")).await.unwrap();

        let resp = host
            .invoke(id, TenantRequest::new("GET", "/health"))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(host.list_loaded().await, vec![id]);
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let host = TenantRuntimeHost::new();
        let err = host
            .invoke(TenantId::new(), TenantRequest::new("GET", "/"))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_activation_is_recorded_not_removed() {
        let host = TenantRuntimeHost::new();
        let id = TenantId::new();

        assert!(host.activate(id, "not json at all").await.is_err());

        let entry = host.entry(&id).await.unwrap();
        assert_eq!(entry.load_status, LoadStatus::Failed);
        assert!(entry.error.is_some());

        // The failed tenant is unroutable but still queryable.
        let err = host
            .invoke(id, TenantRequest::new("GET", "/"))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Unavailable { .. }));
        assert!(host.list_loaded().await.is_empty());
    }

    #[tokio::test]
    async fn broken_tenant_does_not_affect_working_tenant() {
        let host = TenantRuntimeHost::new();
        let good = TenantId::new();
        let bad = TenantId::new();

        host.activate(good, &good_source("good")).await.unwrap();
        assert!(host.activate(bad, r#"{"no_app": true}"#).await.is_err());

        let resp = host
            .invoke(good, TenantRequest::new("GET", "/health"))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn request_fault_becomes_500_and_tenant_stays_loaded() {
        let host = TenantRuntimeHost::new();
        let id = TenantId::new();
        host.activate(id, &good_source("faulty")).await.unwrap();

        let resp = host
            .invoke(id, TenantRequest::new("GET", "/boom"))
            .await
            .unwrap();
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body_json().unwrap()["error"], "tenant_error");

        // Only load-time errors mark a tenant failed.
        let entry = host.entry(&id).await.unwrap();
        assert_eq!(entry.load_status, LoadStatus::Loaded);

        let resp = host
            .invoke(id, TenantRequest::new("GET", "/health"))
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn reactivation_replaces_the_entry() {
        let host = TenantRuntimeHost::new();
        let id = TenantId::new();

        assert!(host.activate(id, "garbage").await.is_err());
        host.activate(id, &good_source("recovered")).await.unwrap();

        let entry = host.entry(&id).await.unwrap();
        assert_eq!(entry.load_status, LoadStatus::Loaded);
        assert_eq!(entry.error, None);
    }

    #[tokio::test]
    async fn tenants_invoke_concurrently() {
        let host = Arc::new(TenantRuntimeHost::new());
        let ids: Vec<TenantId> = (0..8).map(|_| TenantId::new()).collect();
        for id in &ids {
            host.activate(*id, &good_source("n")).await.unwrap();
        }

        let mut tasks = Vec::new();
        for id in ids {
            let host = host.clone();
            tasks.push(tokio::spawn(async move {
                host.invoke(id, TenantRequest::new("GET", "/health")).await
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().status, 200);
        }
    }
}
