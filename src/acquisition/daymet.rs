//! Daymet single-pixel provider: a streamed CSV table with a fixed-format
//! preamble.

use crate::acquisition::error::ProviderError;
use crate::acquisition::provider::{AcquisitionRequest, ForcingProvider};
use crate::normalize::{VariableMapping, DAYMET_MAPPING};
use crate::types::raw_table::RawTable;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::Client;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

pub const DAYMET_BASE_URL: &str = "https://daymet.ornl.gov/single-pixel/api/data";

const DAYMET_VARS: &str = "tmax,tmin,srad,vp,prcp,dayl";

/// Appended to the drained error body when Daymet has no data for a point.
const NO_DATA_TRAILER: &str = "... No Daymet data for this location!";

/// Line index of the column header row; everything before it is metadata.
const HEADER_LINE: usize = 6;

/// Fetches daily series from the Daymet single-pixel API.
///
/// The response is a line-oriented text table: six metadata lines, one
/// header line, then one row per day. The whole body is read to completion
/// before parsing; responses are small and fixed-size, so no streaming
/// parser is needed.
pub struct DaymetProvider {
    base_url: String,
    client: Client,
}

impl Default for DaymetProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DaymetProvider {
    pub fn new() -> Self {
        Self::with_base_url(DAYMET_BASE_URL)
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
            "{}?lat={}&lon={}&vars={}&start={}-01-01&end={}-12-31",
            self.base_url,
            request.lat,
            request.lon,
            DAYMET_VARS,
            request.start_year,
            request.end_year
        )
    }
}

#[async_trait]
impl ForcingProvider for DaymetProvider {
    async fn fetch(&self, request: &AcquisitionRequest) -> Result<RawTable, ProviderError> {
        let url = self.request_url(request);
        info!("downloading Daymet series from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkRequest(url.clone(), e))?;

        if !response.status().is_success() {
            let status = response.status();
            // Drain the error body completely; Daymet explains the refusal
            // (point outside the grid, bad range) in the body.
            let body = drain_text(response).await?;
            warn!("Daymet returned {} for {}", status, url);
            return Err(no_data_error(body));
        }

        let body = drain_text(response).await?;
        info!("downloaded {} bytes of Daymet data", body.len());
        parse_daymet_csv(&body)
    }

    fn mapping(&self) -> &'static VariableMapping {
        &DAYMET_MAPPING
    }
}

/// Wraps a drained Daymet error body as a no-data error, appending the
/// fixed trailer so polling clients see the full explanation.
fn no_data_error(mut body: String) -> ProviderError {
    body.push_str(NO_DATA_TRAILER);
    ProviderError::NoDataForLocation { message: body }
}

/// Reads a response body to completion through a stream reader.
async fn drain_text(response: reqwest::Response) -> Result<String, ProviderError> {
    let stream = response
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
    let mut reader = StreamReader::new(stream);
    let mut text = String::new();
    reader.read_to_string(&mut text).await?;
    Ok(text)
}

/// Parses the fixed-preamble CSV body into a raw table.
///
/// Columns 0 and 1 are year and day-of-year and form the `"{year}_{yday}"`
/// row key; columns from 2 on are variables. Non-numeric cells become NaN
/// rather than failing the row.
fn parse_daymet_csv(text: &str) -> Result<RawTable, ProviderError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= HEADER_LINE {
        return Err(ProviderError::MalformedResponse(format!(
            "expected at least {} lines of preamble and header, got {}",
            HEADER_LINE + 1,
            lines.len()
        )));
    }

    let headers: Vec<&str> = lines[HEADER_LINE].split(',').map(str::trim).collect();
    if headers.len() < 2 {
        return Err(ProviderError::MalformedResponse(format!(
            "header row '{}' has no year/yday columns",
            lines[HEADER_LINE]
        )));
    }

    let mut table = RawTable::new();
    for header in &headers[2..] {
        table.ensure_variable(header);
    }

    for line in &lines[HEADER_LINE + 1..] {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').collect();
        if cells.len() < 2 {
            continue;
        }
        let key = format!("{}_{}", cells[0].trim(), cells[1].trim());
        for (index, header) in headers[2..].iter().enumerate() {
            let cell = cells.get(index + 2).map(|c| c.trim()).unwrap_or("");
            let value = cell.parse::<f64>().unwrap_or(f64::NAN);
            table.insert(header, &key, value);
        }
    }

    Ok(table)
}
