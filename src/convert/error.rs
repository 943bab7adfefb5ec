use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("conversion service returned {status} for {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        /// Whatever the service said alongside the status, for the logs.
        body: String,
    },

    #[error("failed to read conversion response body")]
    BodyRead(#[source] reqwest::Error),
}
