use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::fault::EngineFault;
use crate::types::{LevelId, LevelInfo};

/// Event union emitted by a streaming engine.
///
/// The session layer consumes exactly this set; engines map their internal
/// callback zoo onto it.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum EngineEvent {
    /// Initial manifest parse finished; the ladder is known.
    ManifestParsed { levels: Vec<LevelInfo> },
    /// Ladder changed after the initial parse (re-parse, level removal).
    LevelsUpdated { levels: Vec<LevelInfo> },
    /// Engine switched rendition, adaptively or on request.
    LevelSwitched { level: LevelId, auto: bool },
    Playing,
    Paused,
    Ended,
    Fault(EngineFault),
}

/// Broadcast fan-out for engine events.
///
/// Send errors are ignored: an engine with no listeners is legal (the
/// session may not have subscribed yet, or is tearing down).
#[derive(Debug)]
pub struct EventEmitter {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventEmitter {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: EngineEvent) {
        trace!(?event, "engine event");
        let _ = self.tx.send(event);
    }

    pub fn emit_fault(&self, fault: EngineFault) {
        if fault.fatal {
            warn!(%fault, domain = ?fault.domain, "fatal engine fault");
        } else {
            trace!(%fault, domain = ?fault.domain, "non-fatal engine fault");
        }
        let _ = self.tx.send(EngineEvent::Fault(fault));
    }

    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(64)
    }
}
