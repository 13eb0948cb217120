use std::sync::Arc;

use tokio::sync::broadcast;
use url::Url;

use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::types::{Capability, EngineOptions, LevelId};

/// Rendering surface the engine attaches media to.
///
/// Deliberately small: the session layer never draws frames, it only needs
/// capability answers and, for natively-capable hosts, direct source
/// attachment.
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = PlayerHostMock)
)]
pub trait PlayerHost: Send + Sync {
    /// Diagnostic name for logs.
    fn name(&self) -> &str;

    /// Host can feed media-source buffers (engine-driven playback).
    fn supports_media_source(&self) -> bool;

    /// Host decodes HLS itself when handed the manifest URL.
    fn supports_native_hls(&self) -> bool;

    /// Attach or clear a direct source URL (native-HLS path only).
    fn set_source(&self, url: Option<Url>);
}

/// One live adaptive-streaming engine instance.
///
/// Methods never fail synchronously; runtime trouble arrives as
/// [`EngineEvent::Fault`] on the subscription stream. Implementations use
/// interior mutability — the session layer holds the instance behind a
/// `Box<dyn StreamingEngine>` and calls through `&self`.
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = StreamingEngineMock)
)]
pub trait StreamingEngine: Send + Sync {
    /// Bind the engine's output to a host surface.
    fn attach(&self, host: Arc<dyn PlayerHost>);

    /// Release the host surface. Must precede [`StreamingEngine::destroy`].
    fn detach(&self);

    /// Set or replace the manifest source. Replacing the source on a live
    /// instance re-arms its credential without dropping decoder state.
    fn load(&self, url: Url);

    fn play(&self);

    fn pause(&self);

    /// Pin one ladder level, or `None` to re-enable adaptive selection.
    fn select_level(&self, level: Option<LevelId>);

    /// In-place recovery from a media fault.
    fn recover_media(&self);

    /// Restart loading after a network fault.
    fn restart_load(&self);

    /// Tear the instance down. Idempotent; the instance is dead afterwards.
    fn destroy(&self);

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}

/// Probes host capability and constructs engine instances.
///
/// Not unimock-able: `probe` borrows the host as `&dyn PlayerHost`, which
/// mock call recording cannot format. Tests script this seam with a
/// hand-written factory instead.
pub trait EngineFactory: Send + Sync {
    fn probe(&self, host: &dyn PlayerHost) -> Capability;

    fn create(&self, options: &EngineOptions) -> Result<Box<dyn StreamingEngine>, EngineError>;
}
