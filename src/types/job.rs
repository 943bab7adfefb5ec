//! The job record: one meteorological-data-to-file conversion request and
//! the state it moves through.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Geographic point a job fetches data for.
///
/// Validated against the supported grid on submission: latitude in
/// `[14.5, 52.0]`, longitude in `[-131.0, -53.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Inclusive year range a job covers. Both years must be positive;
/// `start_year <= end_year` is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start_year: i32,
    pub end_year: i32,
}

/// How a job's normalized dataset comes into being.
///
/// The source mode also fixes the time-step profile requested from the
/// conversion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceMode {
    /// Data is fetched from a provider for the job's coordinates; the
    /// converter is asked for 24 steps per day.
    CoordinateFetch,
    /// The caller supplied the dataset directly; the converter is asked for
    /// 48 steps per day.
    ManualUpload,
}

impl SourceMode {
    pub fn time_step(&self) -> TimeStep {
        match self {
            SourceMode::CoordinateFetch => TimeStep::Hourly,
            SourceMode::ManualUpload => TimeStep::HalfHourly,
        }
    }
}

/// Granularity requested from the conversion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeStep {
    /// 24 samples per day.
    Hourly,
    /// 48 samples per day.
    HalfHourly,
}

impl TimeStep {
    pub fn steps_per_day(&self) -> u32 {
        match self {
            TimeStep::Hourly => 24,
            TimeStep::HalfHourly => 48,
        }
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.steps_per_day())
    }
}

/// Job lifecycle state, persisted on every transition.
///
/// `Pending -> Converting -> Ready` is the successful path; any failure in
/// the detached acquisition/conversion chain lands in `Failed` so stalled
/// jobs are observable rather than pending forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Converting,
    Ready,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Pending => "pending",
            JobStatus::Converting => "converting",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Identity of the requesting user. The core does not own user accounts;
/// callers pass whatever reference their identity layer uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
}

impl Owner {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A persisted input job.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub owner: Owner,
    pub location: Location,
    pub period: Period,
    pub source_mode: SourceMode,
    pub status: JobStatus,
    /// Serialized [`crate::ForcingDataset`] text; holds the `"{}"`
    /// placeholder until acquisition completes on the coordinate path.
    pub normalized_data: String,
    /// Reference to the converted binary artifact; set only once the job
    /// reaches [`JobStatus::Ready`].
    pub artifact_ref: Option<String>,
    pub created: NaiveDate,
}

impl Job {
    pub fn time_step(&self) -> TimeStep {
        self.source_mode.time_step()
    }

    /// File name used by the download surface for this job's artifact.
    pub fn artifact_file_name(&self) -> String {
        format!("inputjob_{}.nc", self.id)
    }
}

/// Fields required to insert a fresh job; id, status, and creation date are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub owner: Owner,
    pub location: Location,
    pub period: Period,
    pub source_mode: SourceMode,
    pub normalized_data: String,
}

/// The mutable slice of a job exposed through the update operation.
/// Everything else (dataset, artifact) only changes through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub location: Option<Location>,
    pub period: Option<Period>,
    pub status: Option<JobStatus>,
}
