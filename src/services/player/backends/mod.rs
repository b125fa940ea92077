//! Backend adapters.
//!
//! One adapter per playback path, all behind the same [`Backend`] lifecycle:
//! attach → (manifest parsed / recover)* → destroy. The controller only ever
//! holds one [`BackendHandle`] at a time.

pub mod dash;
pub mod hls;
pub mod mpegts;
pub mod native;

pub use dash::DashBackend;
pub use hls::HlsBackend;
pub use mpegts::MpegTsBackend;
pub use native::NativeBackend;

use super::engine::{EngineProvider, EventSink, StreamSource};
use super::media::SharedMedia;
use crate::config::PlayerConfig;
use crate::error::BackendError;
use crate::models::{Protocol, RecoveryAction};

/// Uniform lifecycle of a playback backend.
///
/// `destroy` must stop network activity, detach from the media element and
/// release workers/timers before returning. It must be safe to call twice.
pub trait Backend: Send {
    fn protocol(&self) -> Protocol;

    /// Start feeding `media` from `source`. Events are reported through `events`.
    fn attach(
        &mut self,
        media: SharedMedia,
        source: &StreamSource,
        events: EventSink,
    ) -> Result<(), BackendError>;

    fn on_manifest_parsed(&mut self) {}

    fn recover(&mut self, action: RecoveryAction) {
        tracing::debug!("[{}] no local recovery for {:?}", self.protocol(), action);
    }

    fn destroy(&mut self);
}

/// The closed set of backends the controller can hold
pub enum BackendHandle {
    Dash(DashBackend),
    MpegTs(MpegTsBackend),
    Hls(HlsBackend),
    Native(NativeBackend),
}

impl BackendHandle {
    /// Construct the backend for `protocol`. Engine construction errors
    /// surface here and are treated as a setup failure by the caller.
    pub fn create(
        protocol: Protocol,
        source: &StreamSource,
        provider: &dyn EngineProvider,
        config: &PlayerConfig,
    ) -> Result<Self, BackendError> {
        let handle = match protocol {
            Protocol::Dash => Self::Dash(DashBackend::new(provider)?),
            Protocol::MpegTsFlv => Self::MpegTs(MpegTsBackend::new(provider, source)?),
            Protocol::Hls => Self::Hls(HlsBackend::new(provider, source, config)?),
            Protocol::Native => Self::Native(NativeBackend::new()),
        };
        Ok(handle)
    }

    fn inner(&mut self) -> &mut dyn Backend {
        match self {
            BackendHandle::Dash(b) => b,
            BackendHandle::MpegTs(b) => b,
            BackendHandle::Hls(b) => b,
            BackendHandle::Native(b) => b,
        }
    }
}

impl Backend for BackendHandle {
    fn protocol(&self) -> Protocol {
        match self {
            BackendHandle::Dash(_) => Protocol::Dash,
            BackendHandle::MpegTs(_) => Protocol::MpegTsFlv,
            BackendHandle::Hls(_) => Protocol::Hls,
            BackendHandle::Native(_) => Protocol::Native,
        }
    }

    fn attach(
        &mut self,
        media: SharedMedia,
        source: &StreamSource,
        events: EventSink,
    ) -> Result<(), BackendError> {
        self.inner().attach(media, source, events)
    }

    fn on_manifest_parsed(&mut self) {
        self.inner().on_manifest_parsed()
    }

    fn recover(&mut self, action: RecoveryAction) {
        self.inner().recover(action)
    }

    fn destroy(&mut self) {
        self.inner().destroy()
    }
}
