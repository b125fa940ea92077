//! Playback session controller.
//!
//! Owns at most one backend at a time and drives it through
//! `Idle → Initializing → Active ⇄ Recovering → PendingRemoval / TornDown`.
//!
//! All work happens on the owner's task: backend reports and escalation
//! timers arrive through one mailbox and are dispatched by [`PlaybackController::tick`]
//! or [`PlaybackController::process_pending`]. A channel switch tears the
//! old backend down completely before the new one is constructed, so two
//! backends never feed the media element at once.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::backends::{Backend, BackendHandle};
use super::engine::{BackendEvent, ControllerEvent, EngineProvider, EventSink, StreamSource};
use super::health::{self, HealthMonitor};
use super::media::SharedMedia;
use super::recovery::{self, Verdict};
use crate::config::PlayerConfig;
use crate::error::{PlayError, PlaybackFailure};
use crate::models::{Channel, ErrorReport, HealthSample, Protocol, SessionState};
use crate::services::protocol;

/// Delivered once per dead channel, after the escalation delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFailure {
    pub channel_id: String,
    pub failure: PlaybackFailure,
}

pub type FatalCallback = Box<dyn FnMut(&ChannelFailure) + Send>;

/// State of the channel currently loaded into the player
struct Session {
    id: Uuid,
    channel: Channel,
    protocol: Option<Protocol>,
    backend: Option<BackendHandle>,
    failure: Option<PlaybackFailure>,
    escalation: Option<CancellationToken>,
    escalated: bool,
}

impl Session {
    fn new(channel: &Channel) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.clone(),
            protocol: None,
            backend: None,
            failure: None,
            escalation: None,
            escalated: false,
        }
    }
}

/// Playback controller. Must be driven from within a Tokio runtime.
pub struct PlaybackController {
    config: PlayerConfig,
    provider: Arc<dyn EngineProvider>,
    media: SharedMedia,
    state: SessionState,
    session: Option<Session>,
    /// Bumped on every teardown; events tagged with an older value are stale
    generation: u64,
    volume: f64,
    muted: bool,
    awaiting_user_start: bool,
    on_fatal: Option<FatalCallback>,
    pending_removal: watch::Sender<bool>,
    monitor: Option<HealthMonitor>,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl PlaybackController {
    pub fn new(config: PlayerConfig, provider: Arc<dyn EngineProvider>, media: SharedMedia) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (pending_removal, _) = watch::channel(false);

        Self {
            volume: config.initial_volume.clamp(0.0, 1.0),
            muted: config.initial_muted,
            config,
            provider,
            media,
            state: SessionState::Idle,
            session: None,
            generation: 0,
            awaiting_user_start: false,
            on_fatal: None,
            pending_removal,
            monitor: None,
            events_tx,
            events_rx,
        }
    }

    /// Register the channel-failed callback. Replaces any earlier one.
    pub fn on_channel_fatal<F>(&mut self, callback: F)
    where
        F: FnMut(&ChannelFailure) + Send + 'static,
    {
        self.on_fatal = Some(Box::new(callback));
    }

    /// Start sampling buffer health for the lifetime of this controller
    pub fn start_health_monitor(&mut self) {
        if self.monitor.is_some() {
            return;
        }
        self.monitor = Some(HealthMonitor::spawn(
            self.media.clone(),
            self.pending_removal.subscribe(),
            self.config.health_sample_interval,
        ));
    }

    /// Current advisory health reading
    pub fn health(&self) -> HealthSample {
        match &self.monitor {
            Some(monitor) => monitor.latest(),
            None => health::sample(self.media.as_ref(), self.is_pending_removal()),
        }
    }

    /// Begin a new session, tearing down the previous one first
    pub fn select_channel(&mut self, channel: &Channel) {
        self.teardown();

        let mut session = Session::new(channel);
        self.state = SessionState::Initializing;

        self.media.set_volume(self.volume);
        self.media.set_muted(self.muted);

        let source = StreamSource::from(channel);
        let protocol = protocol::classify(&source.url, &self.provider.capabilities());
        session.protocol = Some(protocol);

        info!(
            session = %session.id,
            "Selecting channel '{}' ({}) via {}",
            channel.name,
            channel.id,
            protocol
        );

        let events = EventSink::new(self.generation, self.events_tx.clone());
        let attached = BackendHandle::create(protocol, &source, self.provider.as_ref(), &self.config)
            .and_then(|mut backend| match backend.attach(self.media.clone(), &source, events) {
                Ok(()) => Ok(backend),
                Err(e) => {
                    backend.destroy();
                    Err(e)
                }
            });

        match attached {
            Ok(backend) => {
                session.backend = Some(backend);
                self.session = Some(session);
                self.state = SessionState::Active;
                debug!("[{}] backend attached", protocol);
            }
            Err(e) => {
                error!("[{}] setup failed for '{}': {}", protocol, channel.name, e);
                self.session = Some(session);
                self.raise_fatal(PlaybackFailure::setup(e.to_string()));
            }
        }
    }

    /// Destroy the attached backend and clear the media element.
    /// Safe to call in any state, any number of times.
    pub fn teardown(&mut self) {
        self.generation += 1;

        if let Some(mut session) = self.session.take() {
            if let Some(token) = session.escalation.take() {
                token.cancel();
            }
            if let Some(mut backend) = session.backend.take() {
                backend.destroy();
            }
            debug!(session = %session.id, "Session torn down");
            self.state = SessionState::TornDown;
        }

        self.media.clear_source();
        self.pending_removal.send_replace(false);
        self.awaiting_user_start = false;
    }

    /// Tear down and stop health sampling; the player view is going away
    pub fn unmount(&mut self) {
        self.teardown();
        self.monitor = None;
        self.state = SessionState::TornDown;
    }

    /// Wait for the next backend event or timer and handle it
    pub async fn tick(&mut self) {
        if let Some(event) = self.events_rx.recv().await {
            self.dispatch(event);
        }
    }

    /// Handle every event that is already queued. Returns how many were handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    pub fn toggle_play(&mut self) {
        if self.session.is_none() {
            return;
        }

        if !self.media.is_paused() {
            self.media.pause();
            return;
        }

        match self.media.play() {
            Ok(()) => self.awaiting_user_start = false,
            Err(PlayError::NotAllowed) => {
                info!("Play refused by autoplay policy");
                self.awaiting_user_start = true;
            }
            Err(PlayError::Aborted) => debug!("Play request aborted"),
            Err(e) => warn!("Play request failed: {}", e),
        }
    }

    /// Set volume in 0.0..=1.0; out-of-range values are clamped
    pub fn set_volume(&mut self, volume: f64) {
        if volume.is_nan() {
            warn!("Ignoring NaN volume");
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.media.set_volume(self.volume);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.media.set_muted(muted);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_channel(&self) -> Option<&Channel> {
        self.session.as_ref().map(|s| &s.channel)
    }

    pub fn protocol(&self) -> Option<Protocol> {
        self.session.as_ref().and_then(|s| s.protocol)
    }

    /// Reason shown while a dead channel waits to be skipped
    pub fn failure(&self) -> Option<&PlaybackFailure> {
        self.session.as_ref().and_then(|s| s.failure.as_ref())
    }

    /// Autoplay was refused; playback waits for a manual start
    pub fn needs_user_start(&self) -> bool {
        self.awaiting_user_start
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn is_pending_removal(&self) -> bool {
        self.state == SessionState::PendingRemoval
    }

    fn dispatch(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Backend { generation, event } => {
                if generation != self.generation || self.session.is_none() {
                    debug!("Dropping stale backend event {:?}", event);
                    return;
                }
                self.handle_backend_event(event);
            }
            ControllerEvent::EscalationDue { generation } => {
                if generation == self.generation {
                    self.deliver_escalation();
                }
            }
        }
    }

    fn handle_backend_event(&mut self, event: BackendEvent) {
        if self.is_pending_removal() {
            debug!("Session pending removal, ignoring {:?}", event);
            return;
        }

        match event {
            BackendEvent::ManifestParsed => {
                if let Some(backend) = self.session.as_mut().and_then(|s| s.backend.as_mut()) {
                    backend.on_manifest_parsed();
                }
            }
            BackendEvent::AutoplayBlocked => {
                self.awaiting_user_start = true;
            }
            BackendEvent::Error(report) => self.handle_error(report),
        }
    }

    fn handle_error(&mut self, report: ErrorReport) {
        let Some(protocol) = self.protocol() else {
            return;
        };

        match recovery::classify(protocol, &report) {
            Verdict::Ignore => {
                debug!(
                    "[{}] {} error left to the engine (fatal={}): {}",
                    protocol, report.class, report.fatal, report.detail
                );
            }
            Verdict::Recover(action) => {
                self.state = SessionState::Recovering;
                warn!(
                    "[{}] recovering from {} error via {:?}: {}",
                    protocol, report.class, action, report.detail
                );
                if let Some(backend) = self.session.as_mut().and_then(|s| s.backend.as_mut()) {
                    backend.recover(action);
                }
                self.state = SessionState::Active;
            }
            Verdict::Fatal(failure) => {
                error!(
                    "[{}] fatal {} error: {} ({})",
                    protocol, report.class, failure, report.detail
                );
                if let Some(mut backend) = self.session.as_mut().and_then(|s| s.backend.take()) {
                    backend.destroy();
                }
                self.raise_fatal(failure);
            }
        }
    }

    /// Mark the session dead and schedule the channel-failed notification.
    /// A session already pending removal is left alone.
    fn raise_fatal(&mut self, failure: PlaybackFailure) {
        if self.is_pending_removal() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        self.state = SessionState::PendingRemoval;
        self.pending_removal.send_replace(true);
        session.failure = Some(failure);

        let token = CancellationToken::new();
        let cancel = token.clone();
        let deadline = Instant::now() + self.config.fatal_escalation_delay;
        let tx = self.events_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    let _ = tx.send(ControllerEvent::EscalationDue { generation });
                }
            }
        });

        session.escalation = Some(token);
        info!(
            session = %session.id,
            "Channel '{}' offline, skipping in {:?}",
            session.channel.name,
            self.config.fatal_escalation_delay
        );
    }

    fn deliver_escalation(&mut self) {
        if !self.is_pending_removal() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.escalated {
            return;
        }
        let Some(failure) = session.failure.clone() else {
            return;
        };

        session.escalated = true;
        session.escalation = None;

        let report = ChannelFailure {
            channel_id: session.channel.id.clone(),
            failure,
        };
        info!("Channel {} failed: {}", report.channel_id, report.failure);

        if let Some(callback) = self.on_fatal.as_mut() {
            callback(&report);
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.teardown();
    }
}
