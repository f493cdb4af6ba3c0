//! The job driver: executes one pipeline run per spawned task.

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use launchkit_core::{JobId, TenantId};
use launchkit_host::TenantRuntimeHost;
use launchkit_store::{TenantRecord, TenantStore};

use crate::collaborators::{Collaborators, Stage};
use crate::job::{Job, Severity};
use crate::registry::JobRegistry;

/// Why a pipeline run stopped early.
#[derive(Debug)]
struct StageFailure {
    stage: Stage,
    message: String,
}

impl StageFailure {
    fn new(stage: Stage, err: impl fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage.title(), self.message)
    }
}

/// Drives the fixed pipeline for each accepted job.
///
/// All dependencies are injected; the driver owns no global state. Each job
/// runs on its own task and touches nothing shared except its own registry
/// entry, so any number of jobs progress independently.
pub struct PipelineDriver {
    jobs: JobRegistry,
    store: Arc<dyn TenantStore>,
    host: Arc<TenantRuntimeHost>,
    collaborators: Arc<dyn Collaborators>,
}

impl PipelineDriver {
    pub fn new(
        jobs: JobRegistry,
        store: Arc<dyn TenantStore>,
        host: Arc<TenantRuntimeHost>,
        collaborators: Arc<dyn Collaborators>,
    ) -> Self {
        Self {
            jobs,
            store,
            host,
            collaborators,
        }
    }

    /// Accept a prompt: register the job, launch its pipeline task, and
    /// return the id immediately for polling.
    pub async fn start(self: &Arc<Self>, prompt: String) -> JobId {
        let job = Job::new(prompt, &Stage::titles());
        let job_id = job.id;
        let handle = self.jobs.insert(job).await;

        let driver = self.clone();
        tokio::spawn(async move {
            driver.run(job_id, handle).await;
        });

        tracing::info!(%job_id, "generation job accepted");
        job_id
    }

    async fn run(&self, job_id: JobId, job: Arc<RwLock<Job>>) {
        match self.execute(&job).await {
            Ok(tenant_id) => {
                tracing::info!(%job_id, %tenant_id, "generation pipeline completed");
            }
            Err(failure) => {
                tracing::warn!(%job_id, stage = ?failure.stage, error = %failure.message, "generation pipeline failed");
                let mut j = job.write().await;
                if let Err(err) = j.fail(failure.to_string()) {
                    tracing::error!(%job_id, error = %err, "could not record job failure");
                }
            }
        }
    }

    async fn execute(&self, job: &Arc<RwLock<Job>>) -> Result<TenantId, StageFailure> {
        let prompt = job.read().await.prompt.clone();

        self.begin(job, Stage::Discovery).await;
        let research = self
            .collaborators
            .research_market(&prompt)
            .await
            .map_err(|e| StageFailure::new(Stage::Discovery, e))?;
        self.complete(
            job,
            Stage::Discovery,
            format!(
                "Market discovery complete; {} competitors identified",
                research.competitors.len()
            ),
        )
        .await;

        self.begin(job, Stage::Build).await;
        let generated = self
            .collaborators
            .generate_backend(&prompt, &research)
            .await
            .map_err(|e| StageFailure::new(Stage::Build, e))?;
        self.complete(
            job,
            Stage::Build,
            format!("Backend generated for \"{}\"", generated.display_name),
        )
        .await;

        self.begin(job, Stage::Package).await;
        let kit = self
            .collaborators
            .design_brand_kit(&generated)
            .await
            .map_err(|e| StageFailure::new(Stage::Package, e))?;
        self.complete(job, Stage::Package, format!("Brand kit ready: {}", kit.logo_url))
            .await;

        self.begin(job, Stage::Enrich).await;
        let video = self
            .collaborators
            .produce_promo_video(&generated, &kit)
            .await
            .map_err(|e| StageFailure::new(Stage::Enrich, e))?;
        self.complete(
            job,
            Stage::Enrich,
            format!("Promo video rendered: {}", video.video_url),
        )
        .await;

        self.begin(job, Stage::Finalize).await;
        let attestation = self
            .collaborators
            .attest_identity(&generated)
            .await
            .map_err(|e| StageFailure::new(Stage::Finalize, e))?;

        // Pipeline success. Persist the tenant, then try to host it.
        // Activation failure does not fail the job: generation and hosting
        // are independent outcomes, and the failed entry stays queryable.
        let tenant_id = TenantId::new();
        let record = TenantRecord::new(tenant_id, &generated.display_name, &generated.source_code);
        self.store.insert(&record).map_err(|e| {
            StageFailure::new(Stage::Finalize, format!("could not persist tenant: {e}"))
        })?;

        let activation_note = match self.host.activate(tenant_id, &record.source_code).await {
            Ok(()) => (
                format!("Tenant {tenant_id} is live"),
                Severity::Success,
            ),
            Err(err) => (
                format!("Tenant {tenant_id} stored but failed to activate: {err}"),
                Severity::Error,
            ),
        };

        let mut j = job.write().await;
        j.result_tenant_id = Some(tenant_id);
        j.append_log(
            format!("Identity attestation issued: {}", attestation.attestation_id),
            Severity::Success,
        );
        j.append_log(activation_note.0, activation_note.1);
        j.set_progress(Stage::Finalize.progress_after());
        if let Err(err) = j.complete_step(Stage::Finalize.index()) {
            tracing::error!(job_id = %j.id, error = %err, "could not complete final step");
        }

        Ok(tenant_id)
    }

    async fn begin(&self, job: &Arc<RwLock<Job>>, stage: Stage) {
        let mut j = job.write().await;
        if let Err(err) = j.begin_step(stage.index()) {
            tracing::error!(job_id = %j.id, ?stage, error = %err, "could not begin step");
            return;
        }
        j.append_log(format!("{} started", stage.title()), Severity::Info);
    }

    async fn complete(&self, job: &Arc<RwLock<Job>>, stage: Stage, detail: String) {
        let mut j = job.write().await;
        j.append_log(detail, Severity::Success);
        j.set_progress(stage.progress_after());
        if let Err(err) = j.complete_step(stage.index()) {
            tracing::error!(job_id = %j.id, ?stage, error = %err, "could not complete step");
        }
    }
}
