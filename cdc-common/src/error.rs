use reqwest::StatusCode;
use thiserror::Error;

/// Enumeration of errors raised while turning a transport record into a `ChangeEventHeader`.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("change notification data is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("change notification data is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("change notification data is not a valid change event: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("change event is missing required field {0}")]
    MissingField(&'static str),
}

/// Enumeration of errors related to reading records and schemas from Salesforce.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("failed to log in to Salesforce: {0}")]
    Login(String),
    #[error("request to Salesforce failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Salesforce responded with status {status}: {body}")]
    Status {
        status: StatusCode,
        body: String,
    },
    #[error("unexpected response from Salesforce: {0}")]
    InvalidResponse(String),
}

impl QueryError {
    /// Whether the same request could succeed later. Salesforce answers malformed queries, unknown
    /// objects or fields and oversized requests with a 4xx that no redelivery will change.
    pub fn is_retryable(&self) -> bool {
        match self {
            QueryError::Login(_) | QueryError::Request(_) => true,
            QueryError::Status { status, .. } => {
                status.is_server_error()
                    || [
                        StatusCode::UNAUTHORIZED,
                        StatusCode::REQUEST_TIMEOUT,
                        StatusCode::TOO_MANY_REQUESTS,
                    ]
                    .contains(status)
            }
            QueryError::InvalidResponse(_) => false,
        }
    }
}

/// Enumeration of errors related to writing enriched records to the output stream.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("failed to serialize enriched record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to build delivery stream record: {0}")]
    Build(String),
    #[error("failed to put record on delivery stream {stream}: {error}")]
    Put { stream: String, error: String },
}
