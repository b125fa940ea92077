//! HLS adapter.
//!
//! Runs the engine with worker decoding and a bounded manifest timeout.
//! Playback starts once the manifest is parsed. This is the only backend
//! with local recovery: resume loading after a network failure, media error
//! recovery after a decode failure.

use tracing::{debug, warn};

use super::Backend;
use crate::config::PlayerConfig;
use crate::error::BackendError;
use crate::models::{Protocol, RecoveryAction};
use crate::services::player::engine::{
    EngineProvider, EventSink, HlsConfig, HlsEngine, StreamSource,
};
use crate::services::player::media::{request_play, SharedMedia};

pub struct HlsBackend {
    engine: Option<Box<dyn HlsEngine>>,
    media: Option<SharedMedia>,
    events: Option<EventSink>,
}

impl HlsBackend {
    pub fn new(
        provider: &dyn EngineProvider,
        source: &StreamSource,
        config: &PlayerConfig,
    ) -> Result<Self, BackendError> {
        let hls_config = HlsConfig {
            enable_worker: config.hls_enable_worker,
            manifest_load_timeout: config.hls_manifest_timeout,
            headers: source.headers.clone(),
        };

        Ok(Self {
            engine: Some(provider.create_hls(&hls_config)?),
            media: None,
            events: None,
        })
    }
}

impl Backend for HlsBackend {
    fn protocol(&self) -> Protocol {
        Protocol::Hls
    }

    fn attach(
        &mut self,
        media: SharedMedia,
        source: &StreamSource,
        events: EventSink,
    ) -> Result<(), BackendError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| BackendError::Setup("hls engine already destroyed".to_string()))?;

        engine.load_source(&source.url);
        engine.attach_media(media.clone(), events.clone())?;

        self.media = Some(media);
        self.events = Some(events);
        Ok(())
    }

    fn on_manifest_parsed(&mut self) {
        if let (Some(media), Some(events)) = (&self.media, &self.events) {
            debug!("[hls] manifest parsed, starting playback");
            let _ = request_play(media.as_ref(), events, Protocol::Hls);
        }
    }

    fn recover(&mut self, action: RecoveryAction) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        match action {
            RecoveryAction::ResumeLoading => {
                warn!("[hls] fatal network error, resuming load");
                engine.start_load();
            }
            RecoveryAction::RecoverMedia => {
                warn!("[hls] fatal media error, attempting recovery");
                engine.recover_media_error();
            }
        }
    }

    fn destroy(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
            debug!("[hls] engine destroyed");
        }
        self.media = None;
        self.events = None;
    }
}
