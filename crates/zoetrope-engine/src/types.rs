/// Stable handle into the engine's bitrate ladder.
///
/// Ids are assigned by the engine when it parses the manifest and stay valid
/// until the next ladder report that drops them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelId(pub u32);

impl std::fmt::Display for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One rung of the bitrate ladder as reported by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelInfo {
    pub id: LevelId,
    /// Vertical resolution in pixels.
    pub height: u32,
    pub bitrate_bps: u64,
    /// Engine- or manifest-supplied name, if any.
    pub name: Option<String>,
}

impl LevelInfo {
    #[must_use]
    pub fn new(id: u32, height: u32, bitrate_bps: u64) -> Self {
        Self {
            id: LevelId(id),
            height,
            bitrate_bps,
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Result of probing a player host for adaptive playback support.
///
/// The adapter matches on this exhaustively; a new capability kind is a
/// breaking change by design.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Host supports media-source buffers; the engine drives playback.
    MediaSource,
    /// Host plays HLS natively; the source URL is attached directly and no
    /// engine instance exists.
    NativeHls,
    #[default]
    Unsupported,
}

/// Construction-time engine configuration.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Bearer credential applied to the engine's segment requests.
    pub bearer: Option<String>,
    /// Event channel capacity.
    pub event_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bearer: None,
            event_capacity: 64,
        }
    }

    #[must_use]
    pub fn with_bearer(mut self, bearer: impl Into<String>) -> Self {
        self.bearer = Some(bearer.into());
        self
    }

    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}
