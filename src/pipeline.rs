//! Detached acquisition/conversion stages.
//!
//! Submission spawns these and returns immediately; nothing here can reach
//! the submitter. A stage failure is logged and recorded on the job as
//! `Failed`, which is the only failure signal polling clients get.

use crate::acquisition::provider::{AcquisitionRequest, ForcingProvider};
use crate::convert::ConversionGateway;
use crate::error::MetforgeError;
use crate::normalize::normalize;
use crate::store::JobStore;
use crate::types::job::TimeStep;
use log::{error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Coordinate-fetch path: acquire, normalize, persist, convert.
pub(crate) async fn run_coordinate_chain(
    store: Arc<dyn JobStore>,
    provider: Arc<dyn ForcingProvider>,
    gateway: Arc<dyn ConversionGateway>,
    job_id: Uuid,
    request: AcquisitionRequest,
    time_step: TimeStep,
) {
    let outcome =
        acquire_and_convert(&store, &provider, &gateway, job_id, request, time_step).await;
    record_outcome(&store, job_id, outcome).await;
}

/// Manual-upload path: the dataset is already on the job, go straight to
/// conversion.
pub(crate) async fn run_upload_chain(
    store: Arc<dyn JobStore>,
    gateway: Arc<dyn ConversionGateway>,
    job_id: Uuid,
    dataset_json: String,
    time_step: TimeStep,
) {
    let outcome = run_conversion(&store, &gateway, job_id, &dataset_json, time_step).await;
    record_outcome(&store, job_id, outcome).await;
}

async fn acquire_and_convert(
    store: &Arc<dyn JobStore>,
    provider: &Arc<dyn ForcingProvider>,
    gateway: &Arc<dyn ConversionGateway>,
    job_id: Uuid,
    request: AcquisitionRequest,
    time_step: TimeStep,
) -> Result<(), MetforgeError> {
    let raw = provider.fetch(&request).await?;
    info!("job {}: acquired {} raw variable series", job_id, raw.len());

    let dataset = normalize(&raw, provider.mapping());
    let dataset_json = dataset.to_json()?;
    store.set_normalized_data(job_id, dataset_json.clone()).await?;

    run_conversion(store, gateway, job_id, &dataset_json, time_step).await
}

async fn run_conversion(
    store: &Arc<dyn JobStore>,
    gateway: &Arc<dyn ConversionGateway>,
    job_id: Uuid,
    dataset_json: &str,
    time_step: TimeStep,
) -> Result<(), MetforgeError> {
    if !store.try_begin_conversion(job_id).await? {
        warn!("job {}: not pending, another conversion already claimed it; skipping", job_id);
        return Ok(());
    }

    let artifact_ref = gateway.convert(dataset_json, time_step).await?;
    store.finish(job_id, artifact_ref).await?;
    info!("job {}: artifact stored, job ready", job_id);
    Ok(())
}

async fn record_outcome(
    store: &Arc<dyn JobStore>,
    job_id: Uuid,
    outcome: Result<(), MetforgeError>,
) {
    if let Err(pipeline_error) = outcome {
        error!("job {}: pipeline failed: {}", job_id, pipeline_error);
        if let Err(store_error) = store.mark_failed(job_id).await {
            error!("job {}: could not record pipeline failure: {}", job_id, store_error);
        }
    }
}
