//! Concurrent in-memory job store.

use crate::store::{JobStore, StoreError};
use crate::types::job::{Job, JobStatus, JobUpdate, NewJob};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use log::info;
use uuid::Uuid;

/// A [`JobStore`] backed by a concurrent map. Suitable for tests and
/// single-process deployments; the per-entry locking of the map is what
/// makes [`JobStore::try_begin_conversion`] atomic.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: DashMap<Uuid, Job>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, new_job: NewJob) -> Result<Job, StoreError> {
        let job = Job {
            id: Uuid::new_v4(),
            owner: new_job.owner,
            location: new_job.location,
            period: new_job.period,
            source_mode: new_job.source_mode,
            status: JobStatus::Pending,
            normalized_data: new_job.normalized_data,
            artifact_ref: None,
            created: Utc::now().date_naive(),
        };
        info!("job {}: inserted with status {}", job.id, job.status);
        self.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Job, StoreError> {
        self.jobs
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn status(&self, id: Uuid) -> Result<JobStatus, StoreError> {
        self.jobs
            .get(&id)
            .map(|entry| entry.status)
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: Uuid, update: JobUpdate) -> Result<(), StoreError> {
        let mut entry = self.jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(location) = update.location {
            entry.location = location;
        }
        if let Some(period) = update.period {
            entry.period = period;
        }
        if let Some(status) = update.status {
            entry.status = status;
        }
        Ok(())
    }

    async fn set_normalized_data(&self, id: Uuid, data: String) -> Result<(), StoreError> {
        let mut entry = self.jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        entry.normalized_data = data;
        Ok(())
    }

    async fn try_begin_conversion(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut entry = self.jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if entry.status != JobStatus::Pending {
            return Ok(false);
        }
        entry.status = JobStatus::Converting;
        info!("job {}: status pending -> converting", id);
        Ok(true)
    }

    async fn finish(&self, id: Uuid, artifact_ref: String) -> Result<(), StoreError> {
        let mut entry = self.jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        entry.artifact_ref = Some(artifact_ref);
        entry.status = JobStatus::Ready;
        info!("job {}: status -> ready", id);
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid) -> Result<(), StoreError> {
        let mut entry = self.jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        entry.status = JobStatus::Failed;
        info!("job {}: status -> failed", id);
        Ok(())
    }
}
