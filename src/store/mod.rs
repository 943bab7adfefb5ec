//! The persistence boundary for job records.
//!
//! The orchestrator only ever talks to the [`JobStore`] trait; the concrete
//! store is injected when the client is built. The crate ships an in-memory
//! implementation; a relational store behind the same trait is a drop-in.

pub mod memory;

use crate::types::job::{Job, JobStatus, JobUpdate, NewJob};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no job found with id {0}")]
    NotFound(Uuid),
}

/// Create/read/update access to job records. Jobs are never deleted by the
/// core; deletion is an external CRUD concern.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a fresh job, assigning id, creation date, and the initial
    /// `Pending` status. Returns the stored record.
    async fn insert(&self, new_job: NewJob) -> Result<Job, StoreError>;

    /// The full job record.
    async fn get(&self, id: Uuid) -> Result<Job, StoreError>;

    /// Just the status, for polling clients.
    async fn status(&self, id: Uuid) -> Result<JobStatus, StoreError>;

    /// Applies an update restricted to the mutable fields (location,
    /// period, status).
    async fn update(&self, id: Uuid, update: JobUpdate) -> Result<(), StoreError>;

    /// Overwrites the serialized dataset after acquisition completes.
    async fn set_normalized_data(&self, id: Uuid, data: String) -> Result<(), StoreError>;

    /// Conditionally moves `Pending -> Converting`. Returns `false` when the
    /// job is in any other state, so concurrent resubmission for the same id
    /// cannot trigger two conversions.
    async fn try_begin_conversion(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Records the artifact and moves the job to `Ready`.
    async fn finish(&self, id: Uuid, artifact_ref: String) -> Result<(), StoreError>;

    /// Moves the job to `Failed`; called by the pipeline when a detached
    /// stage errors.
    async fn mark_failed(&self, id: Uuid) -> Result<(), StoreError>;
}
