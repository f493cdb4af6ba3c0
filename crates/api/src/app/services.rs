//! Service construction and startup reconciliation.
//!
//! Registries are built here and passed down explicitly; nothing in the
//! process reaches for ambient globals, so tests can wire their own stores
//! and collaborators.

use std::path::PathBuf;
use std::sync::Arc;

use launchkit_host::TenantRuntimeHost;
use launchkit_pipeline::{Collaborators, JobRegistry, PipelineDriver, ScriptedCollaborators};
use launchkit_store::{FsTenantStore, TenantStore};

/// Runtime configuration for the API process.
pub struct AppConfig {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    /// The external generation services. Deterministic scripted ones by
    /// default; production deployments swap in real clients here.
    pub collaborators: Arc<dyn Collaborators>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("LAUNCHKIT_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let data_dir = std::env::var("LAUNCHKIT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        Self {
            bind_addr,
            data_dir,
            collaborators: Arc::new(ScriptedCollaborators::new()),
        }
    }
}

/// Everything the route handlers need, injected via `Extension`.
pub struct AppServices {
    pub jobs: JobRegistry,
    pub store: Arc<dyn TenantStore>,
    pub host: Arc<TenantRuntimeHost>,
    pub driver: Arc<PipelineDriver>,
}

/// Build the services and re-hydrate every durable tenant into the runtime
/// host. Runs to completion before the router is built, so no tenant traffic
/// is routed until reconciliation finishes.
pub async fn build_services(config: AppConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn TenantStore> = Arc::new(FsTenantStore::open(&config.data_dir)?);
    let host = Arc::new(TenantRuntimeHost::new());

    reconcile_tenants(store.as_ref(), &host).await?;

    let jobs = JobRegistry::new();
    let driver = Arc::new(PipelineDriver::new(
        jobs.clone(),
        store.clone(),
        host.clone(),
        config.collaborators,
    ));

    Ok(AppServices {
        jobs,
        store,
        host,
        driver,
    })
}

/// Re-activate every stored tenant. A tenant that fails to load is recorded
/// as failed (and stays queryable) without blocking the rest.
async fn reconcile_tenants(
    store: &dyn TenantStore,
    host: &TenantRuntimeHost,
) -> anyhow::Result<()> {
    let records = store.list()?;
    let total = records.len();
    let mut failed = 0usize;

    for record in records {
        if host.activate(record.id, &record.source_code).await.is_err() {
            // activate() already logged the cause and recorded the entry.
            failed += 1;
        }
    }

    tracing::info!(total, failed, "tenant reconciliation finished");
    Ok(())
}
