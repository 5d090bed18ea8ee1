use fetchflow_core::FlowError;
use thiserror::Error;

/// Errors that can occur when talking to an HTTP endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The resource path could not be joined onto the endpoint
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// The request failed before a response arrived
    #[error("Request failed: {0}")]
    Request(String),

    /// The reachability probe reported the endpoint as down
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    /// The server answered with a non-success status
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if it could be read
        body: String,
    },
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

impl From<url::ParseError> for SourceError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<SourceError> for FlowError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unreachable(endpoint) => Self::Unreachable(endpoint),
            SourceError::Status { status, body } => Self::Status { status, body },
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Result type for source operations
pub type Result<T> = std::result::Result<T, SourceError>;
