//! DASH adapter.
//!
//! DRM configuration is translated into protection data keyed by key system
//! and applied before initialization. Initialization requests autoplay, so
//! no explicit play request is issued here.

use tracing::{debug, info};

use super::Backend;
use crate::error::BackendError;
use crate::models::{DrmConfig, Protocol};
use crate::services::player::engine::{
    DashEngine, EngineProvider, EventSink, LicenseServer, ProtectionData, StreamSource,
};
use crate::services::player::media::SharedMedia;

pub struct DashBackend {
    engine: Option<Box<dyn DashEngine>>,
}

/// Protection data for a single key system
pub fn protection_data(drm: &DrmConfig) -> ProtectionData {
    let mut data = ProtectionData::new();
    data.insert(
        drm.key_system.clone(),
        LicenseServer {
            server_url: drm.license_url.clone(),
            http_request_headers: drm.headers.clone(),
        },
    );
    data
}

impl DashBackend {
    pub fn new(provider: &dyn EngineProvider) -> Result<Self, BackendError> {
        Ok(Self {
            engine: Some(provider.create_dash()?),
        })
    }
}

impl Backend for DashBackend {
    fn protocol(&self) -> Protocol {
        Protocol::Dash
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
            .ok_or_else(|| BackendError::Setup("dash engine already destroyed".to_string()))?;

        if let Some(drm) = &source.drm {
            info!("[dash] applying {} protection data", drm.key_system);
            engine.set_protection_data(protection_data(drm));
        }

        engine.initialize(media, source, true, events)
    }

    fn destroy(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.reset();
            debug!("[dash] engine reset");
        }
    }
}
