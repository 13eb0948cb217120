use thiserror::Error;
use zoetrope_api::ApiError;

/// Terminal session failures.
///
/// By the time one of these surfaces, local recovery (token refresh, bounded
/// in-place retry) has already been exhausted or was never applicable. The
/// `Display` text is what the UI shows in the error banner, so fetch
/// variants carry the server-supplied message when the response had one.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no video identifier provided")]
    IdentifierMissing,

    #[error("{message}")]
    MetadataFetch {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("{message}")]
    UrlFetch {
        message: String,
        #[source]
        source: Option<ApiError>,
    },

    #[error("playback token missing or undecodable: {detail}")]
    TokenMissing { detail: String },

    #[error("adaptive playback is not supported on this surface")]
    CapabilityUnsupported { host: String },

    #[error("streaming network error: {detail}")]
    EngineNetwork {
        detail: String,
        status: Option<u16>,
    },

    #[error("playback error: {detail}")]
    EngineMedia { detail: String },

    #[error("fatal streaming error: {detail}")]
    EngineFatal { detail: String },
}

impl SessionError {
    pub(crate) fn metadata_fetch(source: ApiError) -> Self {
        let message = source
            .server_message()
            .unwrap_or("failed to load video")
            .to_owned();
        Self::MetadataFetch { message, source }
    }

    pub(crate) fn url_fetch(source: ApiError) -> Self {
        let message = source
            .server_message()
            .unwrap_or("failed to load video stream")
            .to_owned();
        Self::UrlFetch {
            message,
            source: Some(source),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
