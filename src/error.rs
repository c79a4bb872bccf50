//! Error taxonomy shared by the credential caches, managers and dispatcher.

use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// Library error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("credential '{0}' not found in cache")]
    NotFound(String),

    #[error("credential '{0}' expired")]
    Expired(String),

    #[error("credential storage failure for '{name}': {source}")]
    Storage {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server error: {0}")]
    HttpStatus(StatusCode),

    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("upload file is empty")]
    EmptyUpload,

    #[error("remote error: {0}")]
    Remote(RemoteError),
}

/// Error envelope reported by the platform with HTTP 200
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    Standard {
        code: i64,
        message: String,
    },
    Legacy {
        code: i64,
        msg: String,
        sub_code: String,
        sub_msg: String,
    },
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Standard { code, message } => write!(f, "{}: {}", code, message),
            RemoteError::Legacy { code, msg, sub_code, sub_msg } => write!(
                f,
                "code: {}, msg: {}, sub_code: {}, sub_msg: {}",
                code, msg, sub_code, sub_msg
            ),
        }
    }
}

impl Error {
    /// Short label used for failure metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::Expired(_) => "expired",
            Error::Storage { .. } => "storage",
            Error::Network(_) => "network",
            Error::HttpStatus(_) => "http_status",
            Error::Decode(_) => "decode",
            Error::Encode(_) => "encode",
            Error::EmptyUpload => "empty_upload",
            Error::Remote(_) => "remote",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
