use thiserror::Error;

use crate::request::ValidationError;

pub type Result<T, E = FeedError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("HTTP request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("HTTP status {0}")]
    Http(u16),

    #[error("empty response")]
    EmptyResponse,

    #[error("JSON parsing failed: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Error-Response: {0}")]
    ErrorResponse(String),

    #[error("unexpected response shape: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("Invalid city type code: {0}")]
    InvalidTypeCode(u32),

    #[error("call cancelled")]
    Cancelled,

    #[error("blocking call made from within an async context")]
    BlockingInAsync,

    #[error("worker failed: {0}")]
    Worker(String),

    #[error("cannot start worker pool: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FeedError::Http(status.as_u16()),
            None => FeedError::Transport(Box::new(err)),
        }
    }
}
