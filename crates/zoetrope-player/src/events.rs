use tokio::sync::broadcast;
use tracing::trace;
use zoetrope_api::VideoDetails;

use crate::quality::{QualityLevel, Selection};

/// Coarse lifecycle of a playback session as surfaced to the UI.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStatus {
    /// Metadata and stream URL are being fetched, or the engine is attaching.
    Loading,
    /// The engine is armed and the session reacts to intents.
    Ready,
    /// The session failed terminally; a redirect follows shortly.
    Error { message: String },
}

/// Transport state as reported by the streaming engine.
///
/// Sessions always start paused; playback only begins on an explicit
/// play intent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaybackState {
    #[default]
    Paused,
    Playing,
    Ended,
}

/// Events published by a [`PlaybackController`](crate::PlaybackController).
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum SessionEvent {
    StatusChanged(SessionStatus),
    MetadataLoaded { details: VideoDetails },
    /// The selectable quality list changed; element order is stable.
    QualityListChanged { levels: Vec<QualityLevel> },
    /// The effective selection or its display label changed.
    SelectionChanged { selection: Selection, label: String },
    PlaybackChanged(PlaybackState),
    /// Non-fatal condition worth surfacing without interrupting playback.
    Notice { message: String },
    /// Terminal error grace period elapsed; the host should leave the page.
    Redirect,
}

/// Broadcast hub for session events.
///
/// Emitting never fails: events published while nobody listens are dropped.
#[derive(Clone, Debug)]
pub(crate) struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        trace!(?event, "session event");
        let _ = self.tx.send(event);
    }

    pub(crate) fn status(&self, status: SessionStatus) {
        self.emit(SessionEvent::StatusChanged(status));
    }

    pub(crate) fn metadata(&self, details: VideoDetails) {
        self.emit(SessionEvent::MetadataLoaded { details });
    }

    pub(crate) fn quality_list(&self, levels: Vec<QualityLevel>) {
        self.emit(SessionEvent::QualityListChanged { levels });
    }

    pub(crate) fn selection(&self, selection: Selection, label: String) {
        self.emit(SessionEvent::SelectionChanged { selection, label });
    }

    pub(crate) fn playback(&self, state: PlaybackState) {
        self.emit(SessionEvent::PlaybackChanged(state));
    }

    pub(crate) fn notice(&self, message: impl Into<String>) {
        self.emit(SessionEvent::Notice {
            message: message.into(),
        });
    }

    pub(crate) fn redirect(&self) {
        self.emit(SessionEvent::Redirect);
    }
}
