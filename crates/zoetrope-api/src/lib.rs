#![forbid(unsafe_code)]

//! REST client for the video-hosting backend.
//!
//! Three endpoints matter to a playback session: video metadata, the signed
//! stream URL, and the fire-and-forget view increment. Everything is reached
//! through the [`Backend`] trait so the session layer can be driven against
//! mocks.

mod client;
mod error;
mod options;
mod traits;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use options::ApiOptions;
pub use traits::Backend;
pub use types::VideoDetails;
