//! NASA POWER point provider: one JSON document per request, no manual
//! text parsing.

use crate::acquisition::error::ProviderError;
use crate::acquisition::provider::{AcquisitionRequest, ForcingProvider};
use crate::normalize::{VariableMapping, POWER_MAPPING};
use crate::types::raw_table::RawTable;
use async_trait::async_trait;
use indexmap::IndexMap;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;

pub const POWER_BASE_URL: &str = "https://power.larc.nasa.gov/api/temporal/hourly/point";

const POWER_PARAMETERS: &str = "T2M,RH2M,WS2M,PS,CLRSKY_SFC_PAR_TOT,PRECTOTCORR";

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    /// `parameter.<VAR>.<timeKey> = value`, in response order.
    parameter: IndexMap<String, IndexMap<String, f64>>,
}

/// Fetches hourly series from the NASA POWER point API.
pub struct PowerProvider {
    base_url: String,
    client: Client,
}

impl Default for PowerProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerProvider {
    pub fn new() -> Self {
        Self::with_base_url(POWER_BASE_URL)
    }

    /// Points the provider at a different endpoint, e.g. a stub in tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    fn request_url(&self, request: &AcquisitionRequest) -> String {
        format!(
            "{}?parameters={}&community=AG&latitude={}&longitude={}&start={}0101&end={}1231&format=JSON",
            self.base_url,
            POWER_PARAMETERS,
            request.lat,
            request.lon,
            request.start_year,
            request.end_year
        )
    }
}

#[async_trait]
impl ForcingProvider for PowerProvider {
    async fn fetch(&self, request: &AcquisitionRequest) -> Result<RawTable, ProviderError> {
        let url = self.request_url(request);
        info!("requesting POWER series from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                warn!("POWER request failed for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    ProviderError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    ProviderError::NetworkRequest(url, e)
                });
            }
        };

        let payload: PowerResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Json(url.clone(), e))?;
        Ok(table_from_response(payload))
    }

    fn mapping(&self) -> &'static VariableMapping {
        &POWER_MAPPING
    }
}

/// Flattens the nested `properties.parameter` object into a raw table,
/// keeping the response's variable and time ordering.
fn table_from_response(payload: PowerResponse) -> RawTable {
    let mut table = RawTable::new();
    for (variable, samples) in payload.properties.parameter {
        table.ensure_variable(&variable);
        for (time_key, value) in samples {
            table.insert(&variable, &time_key, value);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_nested_parameter_object_in_order() {
        let body = r#"{
            "properties": {
                "parameter": {
                    "T2M": {"2015010100": 3.1, "2015010101": 2.9},
                    "PS": {"2015010100": 98.2, "2015010101": 98.3}
                }
            }
        }"#;
        let payload: PowerResponse = serde_json::from_str(body).unwrap();
        let table = table_from_response(payload);

        let names: Vec<&str> = table.variable_names().collect();
        assert_eq!(names, ["T2M", "PS"]);

        let t2m = table.variable("T2M").unwrap();
        let keys: Vec<&String> = t2m.keys().collect();
        assert_eq!(keys, ["2015010100", "2015010101"]);
        assert_eq!(t2m.get("2015010101"), Some(&2.9));
    }

    #[test]
    fn variable_without_samples_survives() {
        let body = r#"{"properties":{"parameter":{"RH2M":{}}}}"#;
        let payload: PowerResponse = serde_json::from_str(body).unwrap();
        let table = table_from_response(payload);
        assert!(table.variable("RH2M").unwrap().is_empty());
    }

    #[test]
    fn request_url_uses_compact_dates() {
        let provider = PowerProvider::new();
        let url = provider.request_url(&AcquisitionRequest {
            lat: 40.0,
            lon: -100.0,
            start_year: 2015,
            end_year: 2016,
        });
        assert!(url.starts_with(POWER_BASE_URL));
        assert!(url.contains("latitude=40&longitude=-100"));
        assert!(url.contains("start=20150101&end=20161231"));
    }
}
