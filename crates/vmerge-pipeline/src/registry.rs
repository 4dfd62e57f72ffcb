//! Authoritative job state.
//!
//! Exactly one orchestrator run mutates a given job, so a per-call lock on
//! the map is all the coordination needed.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use vmerge_models::{Job, JobId};

/// Keyed job store.
///
/// `set_progress`, `complete` and `fail` are no-ops for unknown ids and for
/// jobs that already reached a terminal state.
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Register a new job in `processing` state with zero progress.
    async fn create(&self) -> JobId;

    async fn get(&self, id: &JobId) -> Option<Job>;

    /// Raise progress. Lower or equal values are ignored.
    async fn set_progress(&self, id: &JobId, progress: u8);

    async fn complete(&self, id: &JobId, video_url: String);

    async fn fail(&self, id: &JobId, error: String);
}

/// Process-lifetime registry. Job state is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryJobRegistry {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    async fn update<F>(&self, id: &JobId, op: &'static str, apply: F)
    where
        F: FnOnce(&mut Job) -> bool + Send,
    {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(job) => {
                if !apply(job) {
                    debug!(job_id = %id, op, "Ignored update for job");
                }
            }
            None => debug!(job_id = %id, op, "Update for unknown job"),
        }
    }
}

#[async_trait]
impl JobRegistry for InMemoryJobRegistry {
    async fn create(&self) -> JobId {
        let id = JobId::new();
        self.jobs.write().await.insert(id.clone(), Job::new(id.clone()));
        id
    }

    async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    async fn set_progress(&self, id: &JobId, progress: u8) {
        self.update(id, "set_progress", |job| job.set_progress(progress))
            .await;
    }

    async fn complete(&self, id: &JobId, video_url: String) {
        self.update(id, "complete", move |job| job.complete(video_url))
            .await;
    }

    async fn fail(&self, id: &JobId, error: String) {
        self.update(id, "fail", move |job| job.fail(error)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmerge_models::JobStatus;

    #[tokio::test]
    async fn test_create_is_processing_at_zero() {
        let registry = InMemoryJobRegistry::new();
        let a = registry.create().await;
        let b = registry.create().await;
        assert_ne!(a, b);

        let job = registry.get(&a).await.unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 0);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let registry = InMemoryJobRegistry::new();
        let id = registry.create().await;

        registry.set_progress(&id, 30).await;
        registry.set_progress(&id, 10).await;
        assert_eq!(registry.get(&id).await.unwrap().progress, 30);

        registry.set_progress(&id, 250).await;
        assert_eq!(registry.get(&id).await.unwrap().progress, 100);
    }

    #[tokio::test]
    async fn test_terminal_state_is_write_once() {
        let registry = InMemoryJobRegistry::new();
        let id = registry.create().await;
        registry.set_progress(&id, 50).await;

        registry.complete(&id, "https://cdn/first.mp4".into()).await;
        registry.complete(&id, "https://cdn/second.mp4".into()).await;
        registry.fail(&id, "late failure".into()).await;
        registry.set_progress(&id, 10).await;

        let job = registry.get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.video_url.as_deref(), Some("https://cdn/first.mp4"));
        assert_eq!(job.error, None);
        assert_eq!(job.progress, 100);
    }

    #[tokio::test]
    async fn test_fail_twice_keeps_first_error() {
        let registry = InMemoryJobRegistry::new();
        let id = registry.create().await;
        registry.set_progress(&id, 30).await;

        registry.fail(&id, "first".into()).await;
        registry.fail(&id, "second".into()).await;
        registry.complete(&id, "https://cdn/x.mp4".into()).await;

        let job = registry.get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("first"));
        assert_eq!(job.video_url, None);
        assert_eq!(job.progress, 30);
    }

    #[tokio::test]
    async fn test_unknown_id_is_noop() {
        let registry = InMemoryJobRegistry::new();
        let ghost = JobId::from_string("ghost");
        registry.set_progress(&ghost, 10).await;
        registry.complete(&ghost, "x".into()).await;
        assert!(registry.get(&ghost).await.is_none());
        assert!(registry.is_empty().await);
    }
}
