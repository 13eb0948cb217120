//! Bridge between a session and one streaming engine instance.
//!
//! The adapter owns the engine lifecycle so the session never has to
//! sequence attach/detach/destroy itself. At most one instance is live at
//! any time; a rebuild destroys the old instance before creating the next.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;
use url::Url;
use zoetrope_engine::{
    Capability, EngineEvent, EngineFactory, EngineOptions, LevelId, PlayerHost, StreamingEngine,
};

use crate::error::{SessionError, SessionResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AdapterState {
    Empty,
    Attaching,
    Attached,
    Rebuilding,
    Disposed,
}

/// How media reaches the host surface.
enum Driver {
    /// Engine-driven playback through media-source buffers.
    Engine(Box<dyn StreamingEngine>),
    /// The host decodes the stream itself; no engine instance exists.
    Native,
}

pub(crate) struct EngineAdapter {
    factory: Arc<dyn EngineFactory>,
    host: Arc<dyn PlayerHost>,
    options: EngineOptions,
    state: AdapterState,
    driver: Option<Driver>,
}

impl EngineAdapter {
    pub(crate) fn new(
        factory: Arc<dyn EngineFactory>,
        host: Arc<dyn PlayerHost>,
        options: EngineOptions,
    ) -> Self {
        Self {
            factory,
            host,
            options,
            state: AdapterState::Empty,
            driver: None,
        }
    }

    /// Probes the host and brings up playback for `url`.
    ///
    /// Returns the engine's event stream, or `None` on the native path
    /// where no engine exists and nothing is emitted.
    pub(crate) fn arm(
        &mut self,
        url: &Url,
    ) -> SessionResult<Option<broadcast::Receiver<EngineEvent>>> {
        if self.state != AdapterState::Empty {
            return Err(SessionError::EngineFatal {
                detail: "playback is already armed".to_owned(),
            });
        }

        match self.factory.probe(self.host.as_ref()) {
            Capability::Unsupported => Err(SessionError::CapabilityUnsupported {
                host: self.host.name().to_owned(),
            }),
            Capability::NativeHls => {
                debug!(host = self.host.name(), "native playback, no engine");
                self.host.set_source(Some(url.clone()));
                self.driver = Some(Driver::Native);
                self.transition(AdapterState::Attached);
                Ok(None)
            }
            Capability::MediaSource => {
                self.transition(AdapterState::Attaching);
                let rx = self.bring_up(url)?;
                self.transition(AdapterState::Attached);
                Ok(Some(rx))
            }
        }
    }

    /// Replaces the engine instance for a new source URL.
    ///
    /// The old instance is detached and destroyed before its successor is
    /// created. On the native path this is a plain source swap.
    pub(crate) fn rebuild(
        &mut self,
        url: &Url,
    ) -> SessionResult<Option<broadcast::Receiver<EngineEvent>>> {
        match self.driver.take() {
            Some(Driver::Engine(engine)) => {
                self.transition(AdapterState::Rebuilding);
                engine.detach();
                engine.destroy();
                let rx = self.bring_up(url)?;
                self.transition(AdapterState::Attached);
                Ok(Some(rx))
            }
            Some(Driver::Native) => {
                self.host.set_source(Some(url.clone()));
                self.driver = Some(Driver::Native);
                Ok(None)
            }
            None => Err(SessionError::EngineFatal {
                detail: "no live playback to rebuild".to_owned(),
            }),
        }
    }

    /// Feeds a re-signed URL to the live instance without replacing it.
    pub(crate) fn rearm(&self, url: &Url) {
        match &self.driver {
            Some(Driver::Engine(engine)) => {
                engine.load(url.clone());
                engine.restart_load();
            }
            Some(Driver::Native) => self.host.set_source(Some(url.clone())),
            None => debug!("rearm ignored, nothing is armed"),
        }
    }

    pub(crate) fn play(&self) {
        if let Some(Driver::Engine(engine)) = &self.driver {
            engine.play();
        }
    }

    pub(crate) fn pause(&self) {
        if let Some(Driver::Engine(engine)) = &self.driver {
            engine.pause();
        }
    }

    pub(crate) fn select_level(&self, level: Option<LevelId>) {
        if let Some(Driver::Engine(engine)) = &self.driver {
            engine.select_level(level);
        }
    }

    pub(crate) fn recover_media(&self) {
        if let Some(Driver::Engine(engine)) = &self.driver {
            engine.recover_media();
        }
    }

    pub(crate) fn restart_load(&self) {
        if let Some(Driver::Engine(engine)) = &self.driver {
            engine.restart_load();
        }
    }

    /// Tears playback down. Safe to call repeatedly.
    pub(crate) fn dispose(&mut self) {
        match self.driver.take() {
            Some(Driver::Engine(engine)) => {
                engine.detach();
                engine.destroy();
            }
            Some(Driver::Native) => self.host.set_source(None),
            None => {}
        }
        if self.state != AdapterState::Disposed {
            self.transition(AdapterState::Disposed);
        }
    }

    fn bring_up(&mut self, url: &Url) -> SessionResult<broadcast::Receiver<EngineEvent>> {
        let engine = self
            .factory
            .create(&self.options)
            .map_err(|err| SessionError::EngineFatal {
                detail: err.to_string(),
            })?;
        // Subscribe before attaching so no early event slips past.
        let rx = engine.subscribe();
        engine.attach(self.host.clone());
        engine.load(url.clone());
        self.driver = Some(Driver::Engine(engine));
        Ok(rx)
    }

    fn transition(&mut self, to: AdapterState) {
        debug!(from = ?self.state, to = ?to, "adapter state");
        self.state = to;
    }
}

impl Drop for EngineAdapter {
    fn drop(&mut self) {
        self.dispose();
    }
}
