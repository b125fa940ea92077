//! Third-party engine seams.
//!
//! The streaming engines themselves (a DASH player, a segmented TS/FLV
//! player, an HLS player) are host-provided. The engine only needs the
//! narrow surface below; each backend adapter drives one of these traits.
//!
//! Engines report asynchronous events (errors, manifest parsed) through the
//! [`EventSink`] handed to them on attach. Every sink is tagged with the
//! session that created it, so reports arriving after a channel switch are
//! dropped by the controller.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

use super::media::SharedMedia;
use crate::error::BackendError;
use crate::models::{Capabilities, Channel, Container, DrmConfig, ErrorReport, HttpHeaders};

/// Event reported by an attached backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// The HLS manifest was parsed; playback may start
    ManifestParsed,
    Error(ErrorReport),
    /// A play request was refused by autoplay policy
    AutoplayBlocked,
}

/// Message consumed by the controller loop
#[derive(Debug)]
pub(crate) enum ControllerEvent {
    Backend { generation: u64, event: BackendEvent },
    EscalationDue { generation: u64 },
}

/// Event channel handed to an engine on attach
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl EventSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<ControllerEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn manifest_parsed(&self) {
        self.emit(BackendEvent::ManifestParsed);
    }

    pub fn error(&self, report: ErrorReport) {
        self.emit(BackendEvent::Error(report));
    }

    /// Error event raised by the media element itself
    pub fn media_error(&self, detail: impl Into<String>) {
        self.emit(BackendEvent::Error(ErrorReport::media(true, detail)));
    }

    pub fn autoplay_blocked(&self) {
        self.emit(BackendEvent::AutoplayBlocked);
    }

    fn emit(&self, event: BackendEvent) {
        // Receiver gone means the controller was dropped; nothing to notify
        let _ = self.tx.send(ControllerEvent::Backend {
            generation: self.generation,
            event,
        });
    }
}

/// What a backend needs to know about the stream it plays
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSource {
    pub url: String,
    pub drm: Option<DrmConfig>,
    pub headers: HttpHeaders,
}

impl From<&Channel> for StreamSource {
    fn from(channel: &Channel) -> Self {
        Self {
            url: channel.url.clone(),
            drm: channel.drm.clone(),
            headers: channel.headers.clone(),
        }
    }
}

/// License server entry of DASH protection data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseServer {
    pub server_url: String,
    pub http_request_headers: HashMap<String, String>,
}

/// DASH protection data, keyed by key system
pub type ProtectionData = HashMap<String, LicenseServer>;

/// Construction parameters for the segmented TS/FLV engine
#[derive(Debug, Clone, PartialEq)]
pub struct MpegTsConfig {
    pub container: Container,
    pub url: String,
    pub is_live: bool,
    pub headers: HttpHeaders,
}

/// Construction parameters for the HLS engine
#[derive(Debug, Clone, PartialEq)]
pub struct HlsConfig {
    /// Decode/demux on a background worker
    pub enable_worker: bool,
    pub manifest_load_timeout: Duration,
    pub headers: HttpHeaders,
}

pub trait DashEngine: Send {
    fn set_protection_data(&mut self, data: ProtectionData);

    fn initialize(
        &mut self,
        media: SharedMedia,
        source: &StreamSource,
        autoplay: bool,
        events: EventSink,
    ) -> Result<(), BackendError>;

    /// Stop all network activity and detach from the media element
    fn reset(&mut self);
}

pub trait MpegTsEngine: Send {
    fn attach_media(&mut self, media: SharedMedia, events: EventSink) -> Result<(), BackendError>;
    fn load(&mut self) -> Result<(), BackendError>;
    fn unload(&mut self);
    fn detach_media(&mut self);
    fn destroy(&mut self);
}

pub trait HlsEngine: Send {
    fn load_source(&mut self, url: &str);
    fn attach_media(&mut self, media: SharedMedia, events: EventSink) -> Result<(), BackendError>;
    /// Restart loading; used to recover from fatal network errors
    fn start_load(&mut self);
    fn recover_media_error(&mut self);
    fn destroy(&mut self);
}

/// Host environment: capability probe plus engine constructors.
///
/// A host without a given engine simply keeps the default constructor,
/// which reports it as unavailable.
pub trait EngineProvider: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    fn create_dash(&self) -> Result<Box<dyn DashEngine>, BackendError> {
        Err(BackendError::Unavailable("dash"))
    }

    fn create_mpegts(&self, _config: &MpegTsConfig) -> Result<Box<dyn MpegTsEngine>, BackendError> {
        Err(BackendError::Unavailable("mpegts"))
    }

    fn create_hls(&self, _config: &HlsConfig) -> Result<Box<dyn HlsEngine>, BackendError> {
        Err(BackendError::Unavailable("hls"))
    }
}
