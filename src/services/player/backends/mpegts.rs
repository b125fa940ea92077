//! Segmented MPEG-TS/FLV adapter.
//!
//! Autoplay is not implicit for this engine: a play request is issued right
//! after load. Play rejections never fail the adapter.

use tracing::debug;

use super::Backend;
use crate::error::BackendError;
use crate::models::Protocol;
use crate::services::player::engine::{
    EngineProvider, EventSink, MpegTsConfig, MpegTsEngine, StreamSource,
};
use crate::services::player::media::{request_play, SharedMedia};
use crate::services::protocol::container_for;

pub struct MpegTsBackend {
    engine: Option<Box<dyn MpegTsEngine>>,
}

impl MpegTsBackend {
    pub fn new(provider: &dyn EngineProvider, source: &StreamSource) -> Result<Self, BackendError> {
        let config = MpegTsConfig {
            container: container_for(&source.url),
            url: source.url.clone(),
            is_live: true,
            headers: source.headers.clone(),
        };
        debug!("[mpegts] creating engine for {:?} container", config.container);

        Ok(Self {
            engine: Some(provider.create_mpegts(&config)?),
        })
    }
}

impl Backend for MpegTsBackend {
    fn protocol(&self) -> Protocol {
        Protocol::MpegTsFlv
    }

    fn attach(
        &mut self,
        media: SharedMedia,
        _source: &StreamSource,
        events: EventSink,
    ) -> Result<(), BackendError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| BackendError::Setup("mpegts engine already destroyed".to_string()))?;

        engine.attach_media(media.clone(), events.clone())?;
        engine.load()?;

        // Rejections are logged inside; they are not fatal to the adapter
        let _ = request_play(media.as_ref(), &events, Protocol::MpegTsFlv);
        Ok(())
    }

    fn destroy(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.unload();
            engine.detach_media();
            engine.destroy();
            debug!("[mpegts] engine destroyed");
        }
    }
}
