use std::time::Duration;

use url::Url;

/// Backend client configuration.
#[derive(Clone, Debug)]
pub struct ApiOptions {
    /// Base URL of the REST API, e.g. `http://backend:8080/`.
    pub api_base: Url,
    /// Base URL relative stream paths are resolved against. Defaults to
    /// `api_base` when the streaming host is the same origin.
    pub stream_base: Url,
    /// Bearer credential sent as `Authorization` on every request.
    pub bearer: Option<String>,
    pub request_timeout: Duration,
}

impl ApiOptions {
    #[must_use]
    pub fn new(api_base: Url) -> Self {
        let stream_base = api_base.clone();
        Self {
            api_base,
            stream_base,
            bearer: None,
            request_timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_stream_base(mut self, stream_base: Url) -> Self {
        self.stream_base = stream_base;
        self
    }

    #[must_use]
    pub fn with_bearer(mut self, bearer: impl Into<String>) -> Self {
        self.bearer = Some(bearer.into());
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
