//! API error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Status {
        status: u16,
        message: String,
    },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid API base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Malformed(err.to_string())
    }
}

impl ApiError {
    /// HTTP status when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http(err) => err.status().map(|s| s.as_u16()),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Malformed(_) | ApiError::InvalidBaseUrl(_) => None,
        }
    }
}
