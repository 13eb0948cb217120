#![forbid(unsafe_code)]

//! # Zoetrope
//!
//! Facade crate for adaptive-streaming video playback sessions.
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use zoetrope::prelude::*;
//!
//! let api = ApiClient::new(ApiOptions::new(api_base));
//! let mut controller = PlaybackController::new(
//!     Arc::new(api),
//!     engine_factory,
//!     player_host,
//!     SessionOptions::new(),
//! );
//!
//! let mut events = controller.subscribe();
//! controller.load("video-id");
//! while let Ok(event) = events.recv().await {
//!     // drive the UI
//! }
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod api {
    pub use zoetrope_api::*;
}

pub mod engine {
    pub use zoetrope_engine::*;
}

pub mod player {
    pub use zoetrope_player::*;
}

#[cfg(feature = "test-utils")]
pub mod test_utils {
    pub use zoetrope_test_utils::*;
}

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use zoetrope_api::{ApiClient, ApiError, ApiOptions, Backend, VideoDetails};
    pub use zoetrope_engine::{
        Capability, EngineEvent, EngineFactory, EngineOptions, LevelId, LevelInfo, PlayerHost,
        StreamingEngine,
    };
    pub use zoetrope_player::{
        PlaybackController, PlaybackState, QualityLevel, Selection, SessionEvent, SessionOptions,
        SessionStatus,
    };
}
