//! Gateway to the external service that turns a normalized dataset into a
//! binary .nc artifact.

pub mod error;

use crate::convert::error::ConvertError;
use crate::types::job::TimeStep;
use async_trait::async_trait;
use log::info;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};

pub const CONVERTER_BASE_URL: &str = "https://9yt2fg-5000.csb.app";

/// Submits a normalized dataset for conversion and returns the artifact
/// reference.
///
/// Implementations only run inside the detached pipeline stages; a failure
/// here is logged and recorded on the job, never surfaced to the submitter.
#[async_trait]
pub trait ConversionGateway: Send + Sync {
    /// `dataset_json` is the serialized canonical dataset, posted verbatim.
    async fn convert(&self, dataset_json: &str, time_step: TimeStep)
        -> Result<String, ConvertError>;
}

/// The real gateway: one HTTP POST per conversion, with the time-step
/// profile as a query flag.
pub struct HttpConversionGateway {
    base_url: String,
    client: Client,
}

impl Default for HttpConversionGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpConversionGateway {
    pub fn new() -> Self {
        Self::with_base_url(CONVERTER_BASE_URL)
    }

    /// Points the gateway at a different endpoint, e.g. a stub in tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ConversionGateway for HttpConversionGateway {
    async fn convert(
        &self,
        dataset_json: &str,
        time_step: TimeStep,
    ) -> Result<String, ConvertError> {
        let url = format!("{}/upload?steps={}", self.base_url, time_step);
        info!(
            "submitting {} byte dataset for conversion to {}",
            dataset_json.len(),
            url
        );

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(dataset_json.to_string())
            .send()
            .await
            .map_err(|e| ConvertError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ConvertError::HttpStatus { url, status, body });
        }

        // A 200 body is the artifact reference itself, stored verbatim.
        response.text().await.map_err(ConvertError::BodyRead)
    }
}
