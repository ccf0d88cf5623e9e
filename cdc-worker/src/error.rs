use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cdc_common::error::{DecodeError, PublishError, QueryError};
use thiserror::Error;

/// Enumeration of the ways processing a batch of change notifications can fail.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to decode change notification: {0}")]
    Decode(#[from] DecodeError),
    #[error("failed to fetch changed records: {0}")]
    Query(#[from] QueryError),
    #[error("failed to publish enriched record: {0}")]
    Publish(#[from] PublishError),
}

impl PipelineError {
    /// Whether delivering the same batch again could succeed.
    /// A notification that cannot be decoded will never decode, so redelivering it only blocks the stream.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Decode(_) => false,
            PipelineError::Query(error) => error.is_retryable(),
            PipelineError::Publish(_) => true,
        }
    }

    /// Short label used to tag failure metrics.
    pub fn cause(&self) -> &'static str {
        match self {
            PipelineError::Decode(_) => "decode",
            PipelineError::Query(_) => "query",
            PipelineError::Publish(_) => "publish",
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = if self.is_retryable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::BAD_REQUEST
        };

        (status, self.to_string()).into_response()
    }
}
