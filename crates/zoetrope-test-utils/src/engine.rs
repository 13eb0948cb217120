//! Hand-driven streaming-engine fake.
//!
//! Unlike a unimock mock, the scripted engine records every lifecycle call
//! in order and lets the test inject [`EngineEvent`]s at will, which is what
//! session-level scenarios need: the test plays the engine's role.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use url::Url;
use zoetrope_engine::{
    Capability, EngineError, EngineEvent, EngineFactory, EngineOptions, EventEmitter, LevelId,
    PlayerHost, StreamingEngine,
};

/// Player host with canned capability answers.
pub struct StubHost {
    name: String,
    media_source: bool,
    native_hls: bool,
    source: Mutex<Option<Url>>,
}

impl StubHost {
    #[must_use]
    pub fn media_source() -> Self {
        Self {
            name: "stub-mse".into(),
            media_source: true,
            native_hls: false,
            source: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn native() -> Self {
        Self {
            name: "stub-native".into(),
            media_source: false,
            native_hls: true,
            source: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            name: "stub-none".into(),
            media_source: false,
            native_hls: false,
            source: Mutex::new(None),
        }
    }

    /// URL last attached via the native-HLS path, if any.
    #[must_use]
    pub fn current_source(&self) -> Option<Url> {
        self.source.lock().clone()
    }
}

impl PlayerHost for StubHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_media_source(&self) -> bool {
        self.media_source
    }

    fn supports_native_hls(&self) -> bool {
        self.native_hls
    }

    fn set_source(&self, url: Option<Url>) {
        *self.source.lock() = url;
    }
}

/// One recorded engine lifecycle call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    Attach,
    Detach,
    Load(Url),
    Play,
    Pause,
    SelectLevel(Option<LevelId>),
    RecoverMedia,
    RestartLoad,
    Destroy,
}

/// Shared core of a scripted engine instance.
///
/// The factory hands the boxed engine to the code under test and keeps an
/// `Arc<EngineProbe>` so the test can inject events and inspect calls.
pub struct EngineProbe {
    emitter: EventEmitter,
    calls: Mutex<Vec<EngineCall>>,
    destroyed: AtomicBool,
    attached: AtomicBool,
    live: Arc<AtomicUsize>,
}

impl EngineProbe {
    fn new(live: Arc<AtomicUsize>) -> Self {
        Self {
            emitter: EventEmitter::new(64),
            calls: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
            attached: AtomicBool::new(false),
            live,
        }
    }

    /// Inject an event as if the engine produced it. Works on destroyed
    /// instances too, which is exactly what stale-event tests need.
    pub fn emit(&self, event: EngineEvent) {
        self.emitter.emit(event);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// URLs passed to `load`, in order.
    #[must_use]
    pub fn loads(&self) -> Vec<Url> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                EngineCall::Load(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }
}

struct ScriptedEngine {
    probe: Arc<EngineProbe>,
}

impl StreamingEngine for ScriptedEngine {
    fn attach(&self, _host: Arc<dyn PlayerHost>) {
        self.probe.attached.store(true, Ordering::SeqCst);
        self.probe.record(EngineCall::Attach);
    }

    fn detach(&self) {
        self.probe.attached.store(false, Ordering::SeqCst);
        self.probe.record(EngineCall::Detach);
    }

    fn load(&self, url: Url) {
        self.probe.record(EngineCall::Load(url));
    }

    fn play(&self) {
        self.probe.record(EngineCall::Play);
    }

    fn pause(&self) {
        self.probe.record(EngineCall::Pause);
    }

    fn select_level(&self, level: Option<LevelId>) {
        self.probe.record(EngineCall::SelectLevel(level));
    }

    fn recover_media(&self) {
        self.probe.record(EngineCall::RecoverMedia);
    }

    fn restart_load(&self) {
        self.probe.record(EngineCall::RestartLoad);
    }

    fn destroy(&self) {
        if !self.probe.destroyed.swap(true, Ordering::SeqCst) {
            self.probe.live.fetch_sub(1, Ordering::SeqCst);
        }
        self.probe.record(EngineCall::Destroy);
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.probe.emitter.subscribe()
    }
}

/// Factory producing scripted engines and tracking instance accounting.
pub struct ScriptedFactory {
    engines: Mutex<Vec<Arc<EngineProbe>>>,
    last_options: Mutex<Option<EngineOptions>>,
    live: Arc<AtomicUsize>,
    peak_live: AtomicUsize,
    fail_create: AtomicBool,
}

impl ScriptedFactory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            engines: Mutex::new(Vec::new()),
            last_options: Mutex::new(None),
            live: Arc::new(AtomicUsize::new(0)),
            peak_live: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
        }
    }

    /// Factory whose `create` always fails.
    #[must_use]
    pub fn failing() -> Self {
        let factory = Self::new();
        factory.fail_create.store(true, Ordering::SeqCst);
        factory
    }

    #[must_use]
    pub fn engines(&self) -> Vec<Arc<EngineProbe>> {
        self.engines.lock().clone()
    }

    /// # Panics
    ///
    /// Panics if fewer than `index + 1` engines were created.
    #[must_use]
    pub fn engine(&self, index: usize) -> Arc<EngineProbe> {
        self.engines.lock()[index].clone()
    }

    /// Total instances ever constructed.
    #[must_use]
    pub fn created(&self) -> usize {
        self.engines.lock().len()
    }

    /// Instances constructed and not yet destroyed.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Highest simultaneous live count ever observed.
    #[must_use]
    pub fn peak_live(&self) -> usize {
        self.peak_live.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent `create`.
    #[must_use]
    pub fn last_options(&self) -> Option<EngineOptions> {
        self.last_options.lock().clone()
    }
}

impl Default for ScriptedFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory for ScriptedFactory {
    fn probe(&self, host: &dyn PlayerHost) -> Capability {
        if host.supports_media_source() {
            Capability::MediaSource
        } else if host.supports_native_hls() {
            Capability::NativeHls
        } else {
            Capability::Unsupported
        }
    }

    fn create(&self, options: &EngineOptions) -> Result<Box<dyn StreamingEngine>, EngineError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(EngineError::Construction {
                reason: "scripted create failure".into(),
            });
        }

        *self.last_options.lock() = Some(options.clone());
        let now_live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_live.fetch_max(now_live, Ordering::SeqCst);

        let probe = Arc::new(EngineProbe::new(Arc::clone(&self.live)));
        self.engines.lock().push(Arc::clone(&probe));
        Ok(Box::new(ScriptedEngine { probe }))
    }
}
