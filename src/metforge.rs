//! The main entry point: submit input jobs, poll their status, and read
//! the resulting records.
//!
//! A [`Metforge`] client is wired from three injected collaborators: a
//! [`JobStore`] for persistence, a [`ForcingProvider`] for data
//! acquisition, and a [`ConversionGateway`] for the external .nc
//! conversion service. Defaults cover the common case (in-memory store,
//! Daymet, HTTP gateway); tests and other deployments swap any of them.

use crate::acquisition::daymet::DaymetProvider;
use crate::acquisition::provider::{AcquisitionRequest, ForcingProvider};
use crate::convert::{ConversionGateway, HttpConversionGateway};
use crate::error::MetforgeError;
use crate::pipeline;
use crate::store::memory::MemoryJobStore;
use crate::store::JobStore;
use crate::types::dataset::{ForcingDataset, DATASET_PLACEHOLDER};
use crate::types::job::{Job, JobStatus, JobUpdate, Location, NewJob, Owner, Period, SourceMode};
use crate::validation;
use bon::bon;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

/// Client for the input-job pipeline.
///
/// Submission is deliberately asynchronous beyond the initial insert: a
/// successful `submit` call means the job exists with status `pending`,
/// not that data has been fetched. Poll [`Metforge::status`] until the job
/// reaches `ready` (or `failed`).
///
/// # Examples
///
/// ```rust
/// # use metforge::{Metforge, Owner, MetforgeError};
/// # async fn run() -> Result<(), MetforgeError> {
/// let client = Metforge::builder().build();
///
/// let job = client
///     .submit()
///     .owner(Owner::new("cust-42"))
///     .lat(40.0)
///     .lon(-100.0)
///     .start_year(2015)
///     .end_year(2016)
///     .call()
///     .await?;
///
/// println!("created job {} with status {}", job.id, job.status);
/// # Ok(())
/// # }
/// ```
pub struct Metforge {
    store: Arc<dyn JobStore>,
    provider: Arc<dyn ForcingProvider>,
    gateway: Arc<dyn ConversionGateway>,
}

#[bon]
impl Metforge {
    /// Builds a client, with optional overrides for each collaborator.
    ///
    /// # Arguments
    ///
    /// * `.store(Arc<dyn JobStore>)`: Optional. Defaults to [`MemoryJobStore`].
    /// * `.provider(Arc<dyn ForcingProvider>)`: Optional. Which climate API
    ///   the coordinate path fetches from; a configuration decision, not
    ///   derived from job data. Defaults to [`DaymetProvider`].
    /// * `.gateway(Arc<dyn ConversionGateway>)`: Optional. Defaults to the
    ///   HTTP gateway against the public converter endpoint.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use metforge::{Metforge, PowerProvider};
    ///
    /// let client = Metforge::builder()
    ///     .provider(Arc::new(PowerProvider::new()))
    ///     .build();
    /// # let _ = client;
    /// ```
    #[builder]
    pub fn new(
        store: Option<Arc<dyn JobStore>>,
        provider: Option<Arc<dyn ForcingProvider>>,
        gateway: Option<Arc<dyn ConversionGateway>>,
    ) -> Self {
        Self {
            store: store.unwrap_or_else(|| Arc::new(MemoryJobStore::new())),
            provider: provider.unwrap_or_else(|| Arc::new(DaymetProvider::new())),
            gateway: gateway.unwrap_or_else(|| Arc::new(HttpConversionGateway::new())),
        }
    }

    /// Submits a coordinate-fetch job.
    ///
    /// Validates the parameters, inserts a `pending` job with a placeholder
    /// dataset, and returns it. Acquisition, normalization, and conversion
    /// then run detached; their failures mark the job `failed` instead of
    /// reaching the caller.
    ///
    /// # Errors
    ///
    /// Returns [`MetforgeError::Validation`] with one message per violated
    /// field when lat/lon/years are out of range, or
    /// [`MetforgeError::Store`] if the initial insert fails. Nothing else
    /// propagates here.
    #[builder]
    pub async fn submit(
        &self,
        owner: Owner,
        lat: f64,
        lon: f64,
        start_year: i32,
        end_year: i32,
    ) -> Result<Job, MetforgeError> {
        validation::validate_submission(lat, lon, start_year, end_year)?;

        let job = self
            .store
            .insert(NewJob {
                owner,
                location: Location { lat, lon },
                period: Period {
                    start_year,
                    end_year,
                },
                source_mode: SourceMode::CoordinateFetch,
                normalized_data: DATASET_PLACEHOLDER.to_string(),
            })
            .await?;

        info!("job {}: created, scheduling acquisition", job.id);
        let request = AcquisitionRequest {
            lat,
            lon,
            start_year,
            end_year,
        };
        // Fire and return; the caller polls for completion.
        tokio::spawn(pipeline::run_coordinate_chain(
            self.store.clone(),
            self.provider.clone(),
            self.gateway.clone(),
            job.id,
            request,
            job.time_step(),
        ));

        Ok(job)
    }

    /// Submits a manual-upload job.
    ///
    /// The uploaded payload is stored verbatim as the job's normalized
    /// dataset and goes straight to conversion with the 48-step profile;
    /// there is no acquisition stage. Coordinates are optional; when the
    /// form supplies them they are validated like the coordinate path.
    #[builder]
    pub async fn submit_upload(
        &self,
        owner: Owner,
        payload: String,
        lat: Option<f64>,
        lon: Option<f64>,
        start_year: i32,
        end_year: i32,
    ) -> Result<Job, MetforgeError> {
        let location = match (lat, lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        };
        validation::validate_upload(location, start_year, end_year)?;
        let (lat, lon) = location.unwrap_or((validation::MIN_LAT, validation::MAX_LON));

        let job = self
            .store
            .insert(NewJob {
                owner,
                location: Location { lat, lon },
                period: Period {
                    start_year,
                    end_year,
                },
                source_mode: SourceMode::ManualUpload,
                normalized_data: payload.clone(),
            })
            .await?;

        info!("job {}: created from upload, scheduling conversion", job.id);
        tokio::spawn(pipeline::run_upload_chain(
            self.store.clone(),
            self.gateway.clone(),
            job.id,
            payload,
            job.time_step(),
        ));

        Ok(job)
    }
}

impl Metforge {
    /// The full job record.
    pub async fn job(&self, id: Uuid) -> Result<Job, MetforgeError> {
        Ok(self.store.get(id).await?)
    }

    /// Just the job's status. This is the polling surface; clients call it
    /// until the job reaches [`JobStatus::Ready`].
    pub async fn status(&self, id: Uuid) -> Result<JobStatus, MetforgeError> {
        Ok(self.store.status(id).await?)
    }

    /// Applies an update restricted to the mutable fields.
    pub async fn update_job(&self, id: Uuid, update: JobUpdate) -> Result<(), MetforgeError> {
        Ok(self.store.update(id, update).await?)
    }

    /// Parses the job's persisted dataset text back into a
    /// [`ForcingDataset`].
    pub async fn job_dataset(&self, id: Uuid) -> Result<ForcingDataset, MetforgeError> {
        let job = self.store.get(id).await?;
        Ok(ForcingDataset::from_json(&job.normalized_data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::error::ProviderError;
    use crate::convert::error::ConvertError;
    use crate::normalize::{VariableMapping, POWER_MAPPING};
    use crate::types::dataset::CANONICAL_VARIABLES;
    use crate::types::raw_table::RawTable;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};

    const HOURS_PER_YEAR: usize = 8760;

    struct StubProvider {
        table: RawTable,
    }

    #[async_trait]
    impl ForcingProvider for StubProvider {
        async fn fetch(&self, _request: &AcquisitionRequest) -> Result<RawTable, ProviderError> {
            Ok(self.table.clone())
        }

        fn mapping(&self) -> &'static VariableMapping {
            &POWER_MAPPING
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ForcingProvider for FailingProvider {
        async fn fetch(&self, _request: &AcquisitionRequest) -> Result<RawTable, ProviderError> {
            Err(ProviderError::NoDataForLocation {
                message: "outside the grid... No Daymet data for this location!".to_string(),
            })
        }

        fn mapping(&self) -> &'static VariableMapping {
            &POWER_MAPPING
        }
    }

    /// Successful gateway that remembers what it was asked to convert.
    #[derive(Default)]
    struct RecordingGateway {
        calls: Mutex<Vec<(String, u32)>>,
    }

    #[async_trait]
    impl ConversionGateway for RecordingGateway {
        async fn convert(
            &self,
            dataset_json: &str,
            time_step: crate::types::job::TimeStep,
        ) -> Result<String, ConvertError> {
            self.calls
                .lock()
                .unwrap()
                .push((dataset_json.to_string(), time_step.steps_per_day()));
            Ok("CDF\u{1}artifact-bytes".to_string())
        }
    }

    struct FailingGateway;

    #[async_trait]
    impl ConversionGateway for FailingGateway {
        async fn convert(
            &self,
            _dataset_json: &str,
            _time_step: crate::types::job::TimeStep,
        ) -> Result<String, ConvertError> {
            Err(ConvertError::HttpStatus {
                url: "http://converter.test/upload?steps=24".to_string(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "converter exploded".to_string(),
            })
        }
    }

    /// A year of hourly POWER-shaped data for every requested parameter.
    fn power_year_table() -> RawTable {
        let mut table = RawTable::new();
        for variable in [
            "T2M",
            "RH2M",
            "WS2M",
            "PS",
            "CLRSKY_SFC_PAR_TOT",
            "PRECTOTCORR",
        ] {
            for hour in 0..HOURS_PER_YEAR {
                table.insert(variable, &format!("k{hour}"), hour as f64 / 24.0);
            }
        }
        table
    }

    async fn wait_for_status(
        client: &Metforge,
        id: Uuid,
        wanted: JobStatus,
    ) -> Result<(), MetforgeError> {
        for _ in 0..200 {
            if client.status(id).await? == wanted {
                return Ok(());
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "job {} never reached {}, stuck at {}",
            id,
            wanted,
            client.status(id).await?
        );
    }

    fn client_with(
        provider: Arc<dyn ForcingProvider>,
        gateway: Arc<dyn ConversionGateway>,
    ) -> (Metforge, Arc<MemoryJobStore>) {
        let store = Arc::new(MemoryJobStore::new());
        let client = Metforge::builder()
            .store(store.clone())
            .provider(provider)
            .gateway(gateway)
            .build();
        (client, store)
    }

    #[tokio::test]
    async fn submit_returns_pending_job_before_acquisition() {
        let (client, _store) = client_with(
            Arc::new(StubProvider {
                table: power_year_table(),
            }),
            Arc::new(RecordingGateway::default()),
        );

        let job = client
            .submit()
            .owner(Owner::new("cust-1"))
            .lat(40.0)
            .lon(-100.0)
            .start_year(2015)
            .end_year(2016)
            .call()
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.normalized_data, DATASET_PLACEHOLDER);
        assert_eq!(job.artifact_ref, None);
        assert_eq!(job.source_mode, SourceMode::CoordinateFetch);
    }

    #[tokio::test]
    async fn coordinate_job_runs_to_ready_with_normalized_data() {
        let gateway = Arc::new(RecordingGateway::default());
        let (client, _store) = client_with(
            Arc::new(StubProvider {
                table: power_year_table(),
            }),
            gateway.clone(),
        );

        let job = client
            .submit()
            .owner(Owner::new("cust-1"))
            .lat(40.0)
            .lon(-100.0)
            .start_year(2015)
            .end_year(2016)
            .call()
            .await
            .unwrap();

        wait_for_status(&client, job.id, JobStatus::Ready)
            .await
            .unwrap();

        let done = client.job(job.id).await.unwrap();
        assert_eq!(done.artifact_ref.as_deref(), Some("CDF\u{1}artifact-bytes"));

        let dataset = client.job_dataset(job.id).await.unwrap();
        let names: Vec<&str> = dataset.variable_names().collect();
        assert_eq!(names, CANONICAL_VARIABLES);
        for name in CANONICAL_VARIABLES {
            assert_eq!(dataset.get(name).unwrap().len(), HOURS_PER_YEAR);
        }
        // TA carries the raw T2M series unscaled.
        let ta = dataset.get("TA").unwrap();
        assert_eq!(ta[0], Some(0.0));
        assert_eq!(ta[25], Some(25.0 / 24.0));

        // The converter saw the 24-step profile.
        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 24);
    }

    #[tokio::test]
    async fn out_of_range_latitude_fails_synchronously() {
        let (client, store) = client_with(
            Arc::new(StubProvider {
                table: power_year_table(),
            }),
            Arc::new(RecordingGateway::default()),
        );

        let result = client
            .submit()
            .owner(Owner::new("cust-1"))
            .lat(10.0)
            .lon(-100.0)
            .start_year(2015)
            .end_year(2016)
            .call()
            .await;

        assert_matches!(
            result,
            Err(MetforgeError::Validation(ref error)) if error.mentions("lat")
        );
        // The job was never created.
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failed_conversion_marks_job_failed_without_surfacing() {
        let (client, _store) = client_with(
            Arc::new(StubProvider {
                table: power_year_table(),
            }),
            Arc::new(FailingGateway),
        );

        // Submission itself succeeds.
        let job = client
            .submit()
            .owner(Owner::new("cust-1"))
            .lat(40.0)
            .lon(-100.0)
            .start_year(2015)
            .end_year(2016)
            .call()
            .await
            .unwrap();

        wait_for_status(&client, job.id, JobStatus::Failed)
            .await
            .unwrap();

        let stuck = client.job(job.id).await.unwrap();
        assert_eq!(stuck.artifact_ref, None);
    }

    #[tokio::test]
    async fn failed_acquisition_marks_job_failed() {
        let (client, _store) = client_with(
            Arc::new(FailingProvider),
            Arc::new(RecordingGateway::default()),
        );

        let job = client
            .submit()
            .owner(Owner::new("cust-1"))
            .lat(40.0)
            .lon(-100.0)
            .start_year(2015)
            .end_year(2016)
            .call()
            .await
            .unwrap();

        wait_for_status(&client, job.id, JobStatus::Failed)
            .await
            .unwrap();

        // The placeholder is still in place; acquisition never wrote data.
        let stuck = client.job(job.id).await.unwrap();
        assert_eq!(stuck.normalized_data, DATASET_PLACEHOLDER);
    }

    #[tokio::test]
    async fn upload_job_converts_payload_verbatim_at_48_steps() {
        let gateway = Arc::new(RecordingGateway::default());
        let (client, _store) = client_with(
            Arc::new(StubProvider {
                table: RawTable::new(),
            }),
            gateway.clone(),
        );

        let payload = r#"{"TA":[1.0,2.0],"RH":[50.0,51.0]}"#.to_string();
        let job = client
            .submit_upload()
            .owner(Owner::new("cust-2"))
            .payload(payload.clone())
            .start_year(2015)
            .end_year(2016)
            .call()
            .await
            .unwrap();

        assert_eq!(job.source_mode, SourceMode::ManualUpload);
        assert_eq!(job.normalized_data, payload);

        wait_for_status(&client, job.id, JobStatus::Ready)
            .await
            .unwrap();

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, payload);
        assert_eq!(calls[0].1, 48);
    }

    #[tokio::test]
    async fn unknown_job_id_is_not_found() {
        let (client, _store) = client_with(
            Arc::new(StubProvider {
                table: RawTable::new(),
            }),
            Arc::new(RecordingGateway::default()),
        );

        let missing = Uuid::new_v4();
        assert_matches!(
            client.status(missing).await,
            Err(MetforgeError::Store(crate::store::StoreError::NotFound(id))) if id == missing
        );
    }

    #[tokio::test]
    async fn update_job_changes_mutable_fields() {
        let (client, _store) = client_with(
            Arc::new(StubProvider {
                table: RawTable::new(),
            }),
            Arc::new(RecordingGateway::default()),
        );

        let job = client
            .submit_upload()
            .owner(Owner::new("cust-3"))
            .payload("{}".to_string())
            .start_year(2015)
            .end_year(2016)
            .call()
            .await
            .unwrap();

        client
            .update_job(
                job.id,
                JobUpdate {
                    period: Some(Period {
                        start_year: 2010,
                        end_year: 2012,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = client.job(job.id).await.unwrap();
        assert_eq!(updated.period.start_year, 2010);
        assert_eq!(updated.period.end_year, 2012);
    }
}
