use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered, but with an error body instead of data. The
    /// message carries the fully drained body plus the fixed trailer, so
    /// callers still see everything the provider said.
    #[error("no data for this location: {message}")]
    NoDataForLocation { message: String },

    #[error("failed to read response body")]
    BodyRead(#[from] std::io::Error),

    #[error("failed to decode JSON response from {0}")]
    Json(String, #[source] reqwest::Error),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}
