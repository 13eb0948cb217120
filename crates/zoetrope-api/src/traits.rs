use async_trait::async_trait;
use url::Url;

use crate::error::ApiResult;
use crate::types::VideoDetails;

/// What a playback session needs from the backend.
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = BackendMock)
)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch metadata for a video.
    async fn video_details(&self, video_id: &str) -> ApiResult<VideoDetails>;

    /// Fetch the signed playback URL, resolved to an absolute URL.
    async fn stream_url(&self, video_id: &str) -> ApiResult<Url>;

    /// Increment the view counter. Callers treat failures as soft.
    async fn record_view(&self, video_id: &str) -> ApiResult<()>;
}
