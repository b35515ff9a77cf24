pub use crate::responses::*;

pub mod http;
pub mod query;
pub mod responses;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("transport failure: {0}")]
    Transport(reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },
    #[error("API error: {message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },
    #[error("invalid response format (HTTP {status})")]
    Format { status: u16, body: String },
    #[error("client is closed")]
    Closed,
}

impl ClientError {
    /// HTTP status code of the failed call, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. }
            | ClientError::Api { status, .. }
            | ClientError::Format { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body of the failed call, when one was received.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ClientError::Http { body, .. }
            | ClientError::Api { body, .. }
            | ClientError::Format { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
