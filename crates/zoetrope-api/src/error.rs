use thiserror::Error;
use url::Url;

/// Centralized error type for the backend client.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timeout")]
    Timeout,

    /// Non-success HTTP response. `message` carries the server-supplied
    /// error text when the body had one.
    #[error("HTTP {status} for {url}")]
    Status {
        status: u16,
        url: Url,
        message: Option<String>,
    },

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status code, when the server answered at all.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for credential rejections (401/403).
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self.status_code(), Some(401 | 403))
    }

    /// Server-supplied error message, if the response body carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
