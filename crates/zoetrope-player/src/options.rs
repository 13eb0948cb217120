use std::time::Duration;

use zoetrope_engine::EngineOptions;

/// Session controller configuration.
#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Query parameter the signed credential travels in.
    pub token_param: String,
    /// Safety margin subtracted from token expiry when scheduling refresh.
    pub refresh_grace: Duration,
    /// Pause between a terminal error and the redirect event.
    pub redirect_delay: Duration,
    /// Window inside which a recurring fault escalates instead of retrying.
    pub burst_window: Duration,
    /// Pause before retrying a failed stream-URL refresh.
    pub refresh_retry_delay: Duration,
    /// Session event channel capacity.
    pub event_capacity: usize,
    /// Intent command channel capacity.
    pub command_capacity: usize,
    /// Options forwarded to the engine factory.
    pub engine: EngineOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            token_param: "token".to_owned(),
            refresh_grace: Duration::from_secs(30),
            redirect_delay: Duration::from_secs(3),
            burst_window: Duration::from_secs(10),
            refresh_retry_delay: Duration::from_secs(5),
            event_capacity: 32,
            command_capacity: 16,
            engine: EngineOptions::new(),
        }
    }

    #[must_use]
    pub fn with_token_param(mut self, param: impl Into<String>) -> Self {
        self.token_param = param.into();
        self
    }

    #[must_use]
    pub fn with_refresh_grace(mut self, grace: Duration) -> Self {
        self.refresh_grace = grace;
        self
    }

    #[must_use]
    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_burst_window(mut self, window: Duration) -> Self {
        self.burst_window = window;
        self
    }

    #[must_use]
    pub fn with_refresh_retry_delay(mut self, delay: Duration) -> Self {
        self.refresh_retry_delay = delay;
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: EngineOptions) -> Self {
        self.engine = engine;
        self
    }
}
