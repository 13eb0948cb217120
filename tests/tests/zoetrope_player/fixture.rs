//! Shared rig for playback session tests: in-process backend, scripted
//! engine factory, stub host surface.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use zoetrope::engine::LevelInfo;
use zoetrope::player::{PlaybackController, SessionEvent, SessionOptions, SessionStatus};
use zoetrope_test_utils::{EngineCall, EngineProbe, ScriptedFactory, StubHost};

use crate::common::VideoService;

pub(crate) const DEADLINE: Duration = Duration::from_secs(5);

/// Session options tuned so failure paths finish quickly.
pub(crate) fn quick_options() -> SessionOptions {
    SessionOptions::new().with_redirect_delay(Duration::from_millis(30))
}

/// Three-rung ladder reported out of engine order on purpose.
pub(crate) fn ladder() -> Vec<LevelInfo> {
    vec![
        LevelInfo::new(0, 1080, 6_000_000),
        LevelInfo::new(1, 360, 800_000),
        LevelInfo::new(2, 720, 3_000_000),
    ]
}

pub(crate) struct PlayerRig {
    pub service: VideoService,
    pub factory: Arc<ScriptedFactory>,
    pub host: Arc<StubHost>,
    pub controller: PlaybackController,
    pub events: broadcast::Receiver<SessionEvent>,
}

impl PlayerRig {
    pub(crate) async fn start(options: SessionOptions) -> Self {
        Self::assemble(VideoService::start().await, StubHost::media_source(), options)
    }

    pub(crate) async fn start_on(host: StubHost, options: SessionOptions) -> Self {
        Self::assemble(VideoService::start().await, host, options)
    }

    pub(crate) fn assemble(
        service: VideoService,
        host: StubHost,
        options: SessionOptions,
    ) -> Self {
        let factory = Arc::new(ScriptedFactory::new());
        let host = Arc::new(host);
        let controller = PlaybackController::new(
            Arc::new(service.client()),
            factory.clone(),
            host.clone(),
            options,
        );
        let events = controller.subscribe();
        Self {
            service,
            factory,
            host,
            controller,
            events,
        }
    }

    pub(crate) async fn load_until_ready(&mut self, video_id: &str) {
        self.controller.load(video_id);
        wait_for_ready(&mut self.events).await;
    }

    /// Loads and consumes the whole startup event burst, which ends with the
    /// initial selection publication. Afterwards the event queue is empty.
    pub(crate) async fn load_and_settle(&mut self, video_id: &str) {
        self.controller.load(video_id);
        wait_for(&mut self.events, |event| {
            matches!(event, SessionEvent::SelectionChanged { .. })
        })
        .await;
    }

    /// Probe for the most recently created engine instance.
    pub(crate) fn probe(&self) -> Arc<EngineProbe> {
        self.factory.engine(self.factory.created() - 1)
    }
}

pub(crate) async fn next_event(rx: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(DEADLINE, rx.recv())
        .await
        .expect("session event within deadline")
        .expect("session event stream open")
}

/// Skips events until `pred` matches, returning the matching event.
pub(crate) async fn wait_for<F>(rx: &mut broadcast::Receiver<SessionEvent>, pred: F) -> SessionEvent
where
    F: Fn(&SessionEvent) -> bool,
{
    loop {
        let event = next_event(rx).await;
        if pred(&event) {
            return event;
        }
    }
}

pub(crate) async fn wait_for_ready(rx: &mut broadcast::Receiver<SessionEvent>) {
    wait_for(rx, |event| {
        matches!(event, SessionEvent::StatusChanged(SessionStatus::Ready))
    })
    .await;
}

/// Waits for the terminal error status and returns its message.
pub(crate) async fn wait_for_error(rx: &mut broadcast::Receiver<SessionEvent>) -> String {
    let event = wait_for(rx, |event| {
        matches!(event, SessionEvent::StatusChanged(SessionStatus::Error { .. }))
    })
    .await;
    match event {
        SessionEvent::StatusChanged(SessionStatus::Error { message }) => message,
        _ => unreachable!(),
    }
}

/// Polls the probe's recorded calls until `pred` holds.
pub(crate) async fn wait_for_calls<F>(probe: &EngineProbe, expecting: &str, pred: F)
where
    F: Fn(&[EngineCall]) -> bool,
{
    let deadline = tokio::time::Instant::now() + DEADLINE;
    loop {
        let calls = probe.calls();
        if pred(&calls) {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {expecting}; recorded calls: {calls:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Polls an arbitrary condition, e.g. a fixture counter.
pub(crate) async fn wait_until<F>(what: &str, pred: F)
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + DEADLINE;
    while !pred() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting until {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Polls until the factory has created `count` engine instances.
pub(crate) async fn wait_for_created(factory: &ScriptedFactory, count: usize) {
    let deadline = tokio::time::Instant::now() + DEADLINE;
    while factory.created() < count {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for engine instance {count}; created: {}",
            factory.created()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
