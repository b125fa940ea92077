//! Native element playback: the element gets the URL directly.
//! There is no recovery path, so "format not supported" is fatal at once.
//! Destroying the adapter stops the element and drops its source.

use tracing::debug;

use super::Backend;
use crate::error::{BackendError, PlayError};
use crate::models::{ErrorReport, Protocol};
use crate::services::player::engine::{EventSink, StreamSource};
use crate::services::player::media::{request_play, SharedMedia};

#[derive(Default)]
pub struct NativeBackend {
    media: Option<SharedMedia>,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for NativeBackend {
    fn protocol(&self) -> Protocol {
        Protocol::Native
    }

    fn attach(
        &mut self,
        media: SharedMedia,
        source: &StreamSource,
        events: EventSink,
    ) -> Result<(), BackendError> {
        if !source.headers.is_empty() {
            debug!("[native] custom HTTP headers cannot be applied to the element");
        }

        media.set_error_sink(Some(events.clone()));
        media.set_source(&source.url);
        self.media = Some(media.clone());

        if let Err(PlayError::NotSupported) = request_play(media.as_ref(), &events, Protocol::Native) {
            events.error(ErrorReport::media(true, "format not supported"));
        }
        Ok(())
    }

    fn destroy(&mut self) {
        if let Some(media) = self.media.take() {
            media.set_error_sink(None);
            media.pause();
            media.clear_source();
            debug!("[native] detached from media element");
        }
    }
}
