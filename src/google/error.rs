use reqwest::blocking::Response;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum GoogleError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Credential error: {0}")]
    Credentials(String),

    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turn a non-success response into `GoogleError::Status`, keeping the body.
pub(crate) fn check_status(service: &'static str, response: Response) -> Result<Response, GoogleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    tracing::error!(service, %status, "Google API request failed");
    Err(GoogleError::Status {
        service,
        status,
        body,
    })
}
