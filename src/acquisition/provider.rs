//! The seam between the orchestrator and the concrete climate-data APIs.

use crate::acquisition::error::ProviderError;
use crate::normalize::VariableMapping;
use crate::types::raw_table::RawTable;
use async_trait::async_trait;

/// Geographic point and year range to acquire data for. Built by the
/// orchestrator from already-validated submission parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionRequest {
    pub lat: f64,
    pub lon: f64,
    pub start_year: i32,
    pub end_year: i32,
}

/// A source of raw meteorological time series.
///
/// Which provider runs is a configuration decision made when the client is
/// built, never derived from job data. Each provider also carries the fixed
/// mapping table that turns its variable names into the canonical schema.
#[async_trait]
pub trait ForcingProvider: Send + Sync {
    /// Fetches the raw per-variable table for the requested point and range.
    async fn fetch(&self, request: &AcquisitionRequest) -> Result<RawTable, ProviderError>;

    /// The provider-specific canonical-variable mapping.
    fn mapping(&self) -> &'static VariableMapping;
}
