//! In-memory registry of every job this process has accepted.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use launchkit_core::JobId;

use crate::job::Job;

/// Concurrent job registry with per-entry locking.
///
/// The outer map lock is held only long enough to clone the entry's `Arc`
/// out, so polling one job never blocks another job's driver.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, Arc<RwLock<Job>>>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job, returning the shared handle the driver mutates.
    pub async fn insert(&self, job: Job) -> Arc<RwLock<Job>> {
        let id = job.id;
        let handle = Arc::new(RwLock::new(job));
        self.jobs.write().await.insert(id, handle.clone());
        handle
    }

    pub async fn handle(&self, job_id: &JobId) -> Option<Arc<RwLock<Job>>> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Consistent point-in-time copy of a job, for polling.
    pub async fn snapshot(&self, job_id: &JobId) -> Option<Job> {
        let handle = self.handle(job_id).await?;
        let job = handle.read().await;
        Some(job.clone())
    }

    pub async fn list_ids(&self) -> Vec<JobId> {
        self.jobs.read().await.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;

    #[tokio::test]
    async fn snapshot_is_a_detached_copy() {
        let registry = JobRegistry::new();
        let handle = registry.insert(Job::new("p", &["only"])).await;
        let id = handle.read().await.id;

        let before = registry.snapshot(&id).await.unwrap();
        handle.write().await.complete_step(0).unwrap();
        let after = registry.snapshot(&id).await.unwrap();

        assert_eq!(before.status, JobStatus::Processing);
        assert_eq!(after.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn missing_job_is_none() {
        let registry = JobRegistry::new();
        assert!(registry.snapshot(&JobId::new()).await.is_none());
    }
}
