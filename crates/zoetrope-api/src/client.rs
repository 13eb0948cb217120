use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, trace};
use url::Url;

use crate::{
    error::{ApiError, ApiResult},
    options::ApiOptions,
    traits::Backend,
    types::VideoDetails,
};

/// Reqwest-backed [`Backend`] implementation.
#[derive(Clone, Debug)]
pub struct ApiClient {
    inner: Client,
    options: ApiOptions,
}

impl ApiClient {
    /// # Panics
    ///
    /// Panics if the `reqwest::Client` builder fails to build.
    #[must_use]
    pub fn new(options: ApiOptions) -> Self {
        let inner = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .expect("failed to build reqwest client");
        Self { inner, options }
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.options
            .api_base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.options.bearer {
            Some(bearer) => req.bearer_auth(bearer),
            None => req,
        }
    }

    async fn fail(url: Url, resp: reqwest::Response) -> ApiError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        ApiError::Status {
            status,
            url,
            message: server_message(&body),
        }
    }
}

/// Pull the human-readable error text out of a JSON error body.
///
/// The backend answers failures with `{"message": "..."}`, older routes with
/// `{"error": "..."}`; anything else yields no message.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| value.get("error").and_then(serde_json::Value::as_str))?;
    (!message.is_empty()).then(|| message.to_owned())
}

#[async_trait]
impl Backend for ApiClient {
    async fn video_details(&self, video_id: &str) -> ApiResult<VideoDetails> {
        let url = self.endpoint(&format!("videos/{video_id}"))?;
        debug!(url = %url, "zoetrope-api: fetching video details");
        let req = self.apply_auth(self.inner.get(url.clone()));

        let resp = req.send().await.map_err(ApiError::from)?;
        if !resp.status().is_success() {
            return Err(Self::fail(url, resp).await);
        }

        resp.json::<VideoDetails>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn stream_url(&self, video_id: &str) -> ApiResult<Url> {
        let url = self.endpoint(&format!("videos/{video_id}/hls-stream-url"))?;
        debug!(url = %url, "zoetrope-api: requesting signed stream url");
        let req = self.apply_auth(self.inner.get(url.clone()));

        let resp = req.send().await.map_err(ApiError::from)?;
        if !resp.status().is_success() {
            return Err(Self::fail(url, resp).await);
        }

        let relative = resp.text().await.map_err(ApiError::from)?;
        let relative = relative.trim();
        if relative.is_empty() {
            return Err(ApiError::Decode("empty stream URL body".into()));
        }

        self.options
            .stream_base
            .join(relative)
            .map_err(|e| ApiError::InvalidUrl(format!("{relative}: {e}")))
    }

    async fn record_view(&self, video_id: &str) -> ApiResult<()> {
        let url = self.endpoint(&format!("videos/{video_id}/views"))?;
        trace!(url = %url, "zoetrope-api: recording view");
        let req = self.apply_auth(self.inner.patch(url.clone()));

        let resp = req.send().await.map_err(ApiError::from)?;
        if !resp.status().is_success() {
            return Err(Self::fail(url, resp).await);
        }
        Ok(())
    }
}
