//! Playback session lifecycle.
//!
//! A [`PlaybackController`] runs at most one session at a time. Each load
//! spawns a task that fetches metadata and a signed stream URL, arms the
//! engine, and then reacts to UI intents, engine events, and the token
//! refresh timer until it is cancelled or fails terminally.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;
use zoetrope_api::{ApiResult, Backend};
use zoetrope_engine::{EngineEvent, EngineFactory, EngineFault, LevelId, PlayerHost};

use crate::adapter::EngineAdapter;
use crate::error::{SessionError, SessionResult};
use crate::events::{PlaybackState, SessionEvent, SessionEvents, SessionStatus};
use crate::options::SessionOptions;
use crate::quality::{QualityRegistry, ReconcileOutcome, Selection};
use crate::recovery::{self, FaultKind, Recovery, RecoveryPolicy};
use crate::token::{self, RefreshDue, RefreshScheduler};

/// UI intent delivered to the running session.
#[derive(Clone, Copy, Debug)]
enum SessionCommand {
    Play,
    Pause,
    SetQuality(Selection),
}

struct ActiveSession {
    commands: mpsc::Sender<SessionCommand>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives adaptive playback of one video at a time.
///
/// The controller is the only write path into a session: UI intents go
/// through it, and everything the UI renders comes back as
/// [`SessionEvent`]s on the subscription stream.
pub struct PlaybackController {
    backend: Arc<dyn Backend>,
    factory: Arc<dyn EngineFactory>,
    host: Arc<dyn PlayerHost>,
    options: SessionOptions,
    events: SessionEvents,
    active: Option<ActiveSession>,
    /// Video ids whose view was already counted by this controller.
    viewed: Arc<Mutex<HashSet<String>>>,
}

impl PlaybackController {
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        factory: Arc<dyn EngineFactory>,
        host: Arc<dyn PlayerHost>,
        options: SessionOptions,
    ) -> Self {
        let events = SessionEvents::new(options.event_capacity);
        Self {
            backend,
            factory,
            host,
            options,
            events,
            active: None,
            viewed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Subscribes to session events. Late subscribers only see events
    /// published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Starts a session for `video_id`, tearing down any previous one.
    ///
    /// The new session waits for its predecessor to release the engine
    /// before arming its own, so instances never overlap.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn load(&mut self, video_id: impl Into<String>) {
        let predecessor = self.teardown_active();
        let video_id = video_id.into().trim().to_owned();
        info!(video = %video_id, "starting playback session");

        let (commands_tx, commands) = mpsc::channel(self.options.command_capacity);
        let cancel = CancellationToken::new();
        let (scheduler, refresh_rx) = RefreshScheduler::new(self.options.refresh_grace);
        let adapter = EngineAdapter::new(
            self.factory.clone(),
            self.host.clone(),
            self.options.engine.clone(),
        );

        let task = SessionTask {
            video_id,
            backend: self.backend.clone(),
            options: self.options.clone(),
            events: self.events.clone(),
            adapter,
            registry: QualityRegistry::new(),
            policy: RecoveryPolicy::new(self.options.burst_window),
            scheduler,
            refresh_rx,
            commands,
            cancel: cancel.clone(),
            engine_rx: None,
            current_url: None,
            refresh_failures: 0,
            viewed: self.viewed.clone(),
            predecessor,
        };
        let handle = tokio::spawn(task.run());
        self.active = Some(ActiveSession {
            commands: commands_tx,
            cancel,
            handle,
        });
    }

    pub fn play(&self) {
        self.send(SessionCommand::Play);
    }

    pub fn pause(&self) {
        self.send(SessionCommand::Pause);
    }

    /// Requests a quality pin, or a return to adaptive selection.
    ///
    /// The published selection only moves once the engine confirms the
    /// switch.
    pub fn set_quality(&self, selection: Selection) {
        self.send(SessionCommand::SetQuality(selection));
    }

    /// Cancels the running session and waits for it to release the engine.
    pub async fn shutdown(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            let _ = active.handle.await;
        }
    }

    fn send(&self, command: SessionCommand) {
        let Some(active) = &self.active else {
            debug!(?command, "no active session for command");
            return;
        };
        if let Err(err) = active.commands.try_send(command) {
            warn!(error = %err, "session command dropped");
        }
    }

    fn teardown_active(&mut self) -> Option<JoinHandle<()>> {
        self.active.take().map(|active| {
            active.cancel.cancel();
            active.handle
        })
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        let _ = self.teardown_active();
    }
}

/// Outcome of one turn of the session loop.
enum Step {
    Cancelled,
    Command(Option<SessionCommand>),
    Refresh(Option<RefreshDue>),
    Engine(Result<EngineEvent, RecvError>),
}

struct SessionTask {
    video_id: String,
    backend: Arc<dyn Backend>,
    options: SessionOptions,
    events: SessionEvents,
    adapter: EngineAdapter,
    registry: QualityRegistry,
    policy: RecoveryPolicy,
    scheduler: RefreshScheduler,
    refresh_rx: mpsc::Receiver<RefreshDue>,
    commands: mpsc::Receiver<SessionCommand>,
    cancel: CancellationToken,
    engine_rx: Option<broadcast::Receiver<EngineEvent>>,
    current_url: Option<Url>,
    refresh_failures: u32,
    viewed: Arc<Mutex<HashSet<String>>>,
    predecessor: Option<JoinHandle<()>>,
}

impl SessionTask {
    async fn run(mut self) {
        // The engine surface is exclusive; wait until the previous session
        // has let go of it.
        if let Some(predecessor) = self.predecessor.take() {
            let _ = predecessor.await;
        }
        if let Err(err) = self.drive().await {
            self.fail(err).await;
        }
        self.teardown();
    }

    /// Runs the session to completion. `Ok` means cancelled or wound down;
    /// any error is terminal.
    async fn drive(&mut self) -> SessionResult<()> {
        self.events.status(SessionStatus::Loading);
        if self.video_id.is_empty() {
            return Err(SessionError::IdentifierMissing);
        }

        let details = tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            result = self.backend.video_details(&self.video_id) => {
                result.map_err(SessionError::metadata_fetch)?
            }
        };
        self.events.metadata(details);

        let url = match self.fetch_stream_url().await {
            None => return Ok(()),
            Some(result) => result.map_err(SessionError::url_fetch)?,
        };
        let stream_token = token::extract(&url, &self.options.token_param)?;
        self.scheduler.schedule(&stream_token);

        self.engine_rx = self.adapter.arm(&url)?;
        self.current_url = Some(url);

        self.events.status(SessionStatus::Ready);
        let outcome = self.registry.reconcile(&[]);
        self.publish(outcome);
        self.record_view_once();

        loop {
            let step = {
                let engine_rx = self.engine_rx.as_mut();
                tokio::select! {
                    () = self.cancel.cancelled() => Step::Cancelled,
                    command = self.commands.recv() => Step::Command(command),
                    due = self.refresh_rx.recv() => Step::Refresh(due),
                    event = recv_or_pending(engine_rx) => Step::Engine(event),
                }
            };

            match step {
                Step::Cancelled | Step::Command(None) => return Ok(()),
                Step::Command(Some(command)) => self.handle_command(command),
                Step::Refresh(None) => return Ok(()),
                Step::Refresh(Some(due)) => {
                    if self.scheduler.is_current(due) {
                        self.handle_refresh().await?;
                    } else {
                        debug!(generation = due.generation, "stale refresh timer ignored");
                    }
                }
                Step::Engine(Ok(event)) => self.handle_engine_event(event).await?,
                Step::Engine(Err(RecvError::Lagged(skipped))) => {
                    warn!(skipped, "engine event stream lagged");
                }
                Step::Engine(Err(RecvError::Closed)) => {
                    debug!("engine event stream closed");
                    self.engine_rx = None;
                }
            }
        }
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Play => self.adapter.play(),
            SessionCommand::Pause => self.adapter.pause(),
            SessionCommand::SetQuality(selection) => {
                if self.registry.select(selection) {
                    self.adapter.select_level(selection_to_level(selection));
                } else {
                    debug!(?selection, "ignoring pin to unknown level");
                }
            }
        }
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) -> SessionResult<()> {
        match event {
            EngineEvent::ManifestParsed { levels } | EngineEvent::LevelsUpdated { levels } => {
                let before = self.registry.selection();
                let outcome = self.registry.reconcile(&levels);
                if before != self.registry.selection() {
                    // The pinned level vanished; put the engine back in
                    // adaptive mode.
                    self.adapter.select_level(None);
                }
                self.publish(outcome);
            }
            EngineEvent::LevelSwitched { level, auto } => {
                trace!(%level, auto, "engine switched level");
                if let Some(view) = self.registry.level_switched() {
                    self.events.selection(view.selection, view.label);
                }
            }
            EngineEvent::Playing => self.events.playback(PlaybackState::Playing),
            EngineEvent::Paused => self.events.playback(PlaybackState::Paused),
            EngineEvent::Ended => self.events.playback(PlaybackState::Ended),
            EngineEvent::Fault(fault) => self.handle_fault(fault).await?,
            _ => {}
        }
        Ok(())
    }

    async fn handle_fault(&mut self, fault: EngineFault) -> SessionResult<()> {
        let Some(kind) = recovery::classify(&fault) else {
            debug!(error = %fault, "non-fatal engine fault");
            return Ok(());
        };
        warn!(error = %fault, ?kind, "fatal engine fault");

        match self.policy.decide(kind) {
            Recovery::RecoverMedia => {
                self.events.notice("recovering from a playback glitch");
                self.adapter.recover_media();
                Ok(())
            }
            Recovery::RestartLoad => {
                self.events.notice("reconnecting to the stream");
                self.adapter.restart_load();
                Ok(())
            }
            Recovery::RefreshToken => {
                // Silent path: the user only hears about auth trouble if
                // the refresh itself keeps failing.
                debug!("stream credential rejected, refreshing in place");
                self.refresh_in_place().await
            }
            Recovery::Abort => Err(fault_error(&fault, kind)),
        }
    }

    /// Proactive refresh: fetch a fresh signed URL and rebuild the engine
    /// on it before the current token lapses.
    async fn handle_refresh(&mut self) -> SessionResult<()> {
        debug!("refreshing stream url ahead of token expiry");
        let url = match self.fetch_stream_url().await {
            None => return Ok(()),
            Some(Err(err)) => return self.refresh_setback(SessionError::url_fetch(err)),
            Some(Ok(url)) => url,
        };
        if Some(&url) == self.current_url.as_ref() {
            return self.refresh_setback(SessionError::UrlFetch {
                message: "signing service returned the same stream url".to_owned(),
                source: None,
            });
        }

        let stream_token = token::extract(&url, &self.options.token_param)?;
        self.refresh_failures = 0;
        self.scheduler.schedule(&stream_token);
        self.engine_rx = self.adapter.rebuild(&url)?;
        // A fresh instance starts in adaptive mode; restore the pin.
        if let Selection::Manual(id) = self.registry.selection() {
            self.adapter.select_level(Some(id));
        }
        self.current_url = Some(url);
        debug!("stream url refreshed");
        Ok(())
    }

    /// Reactive refresh after an auth rejection: the engine instance stays,
    /// it just gets the re-signed URL fed in.
    async fn refresh_in_place(&mut self) -> SessionResult<()> {
        let url = match self.fetch_stream_url().await {
            None => return Ok(()),
            Some(Err(err)) => return self.refresh_setback(SessionError::url_fetch(err)),
            Some(Ok(url)) => url,
        };
        let stream_token = token::extract(&url, &self.options.token_param)?;
        self.refresh_failures = 0;
        self.scheduler.schedule(&stream_token);
        self.adapter.rearm(&url);
        self.current_url = Some(url);
        debug!("stream credential re-armed");
        Ok(())
    }

    /// Books one failed refresh attempt; the second in a row is terminal.
    fn refresh_setback(&mut self, err: SessionError) -> SessionResult<()> {
        self.refresh_failures += 1;
        if self.refresh_failures >= 2 {
            return Err(err);
        }
        warn!(error = %err, "stream refresh setback, retrying");
        self.scheduler.schedule_in(self.options.refresh_retry_delay);
        Ok(())
    }

    async fn fetch_stream_url(&self) -> Option<ApiResult<Url>> {
        tokio::select! {
            () = self.cancel.cancelled() => None,
            result = self.backend.stream_url(&self.video_id) => Some(result),
        }
    }

    /// Counts the view once per video id for the controller's lifetime.
    /// Failures surface as a notice and never disturb playback.
    fn record_view_once(&self) {
        if !self.viewed.lock().insert(self.video_id.clone()) {
            return;
        }
        let backend = self.backend.clone();
        let events = self.events.clone();
        let video_id = self.video_id.clone();
        tokio::spawn(async move {
            if let Err(err) = backend.record_view(&video_id).await {
                warn!(video = %video_id, error = %err, "view count not recorded");
                events.notice("view count not recorded");
            }
        });
    }

    fn publish(&self, outcome: ReconcileOutcome) {
        if let Some(levels) = outcome.list {
            self.events.quality_list(levels);
        }
        if let Some(view) = outcome.selection {
            self.events.selection(view.selection, view.label);
        }
    }

    async fn fail(&mut self, err: SessionError) {
        error!(error = %err, video = %self.video_id, "playback session failed");
        self.scheduler.cancel_pending();
        self.adapter.dispose();
        self.engine_rx = None;
        let outcome = self.registry.reset();
        self.publish(outcome);
        self.events.status(SessionStatus::Error {
            message: err.to_string(),
        });

        tokio::select! {
            () = self.cancel.cancelled() => {}
            () = tokio::time::sleep(self.options.redirect_delay) => self.events.redirect(),
        }
    }

    fn teardown(&mut self) {
        self.scheduler.cancel_pending();
        self.adapter.dispose();
    }
}

fn selection_to_level(selection: Selection) -> Option<LevelId> {
    match selection {
        Selection::Auto => None,
        Selection::Manual(id) => Some(id),
    }
}

fn fault_error(fault: &EngineFault, kind: FaultKind) -> SessionError {
    match kind {
        FaultKind::AuthExpired | FaultKind::Network => SessionError::EngineNetwork {
            detail: fault.detail.clone(),
            status: fault.status(),
        },
        FaultKind::Media => SessionError::EngineMedia {
            detail: fault.detail.clone(),
        },
        FaultKind::Other => SessionError::EngineFatal {
            detail: fault.detail.clone(),
        },
    }
}

async fn recv_or_pending(
    rx: Option<&mut broadcast::Receiver<EngineEvent>>,
) -> Result<EngineEvent, RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
