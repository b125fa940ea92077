//! Media element seam.
//!
//! The media element is the output target every backend feeds. It is owned
//! by the host (a video element, a native surface, a test double); the
//! engine only talks to it through [`MediaElement`].

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::engine::EventSink;
use crate::error::PlayError;
use crate::models::Protocol;

/// Shared handle to the media output target
pub type SharedMedia = Arc<dyn MediaElement>;

/// One buffered time range, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Half-open: `end` belongs to the next range, if any
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position < self.end
    }
}

/// Readiness of the media element, ordered like the HTML media ready states
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// Whether there is enough data to render the next frame
    pub fn can_advance(self) -> bool {
        self >= ReadyState::HaveFutureData
    }
}

/// Media output target driven by the backends.
///
/// Implementations use interior mutability; every method takes `&self`.
pub trait MediaElement: Send + Sync {
    /// Point the element at a URL (native playback)
    fn set_source(&self, url: &str);

    /// Drop the current source and reset the element
    fn clear_source(&self);

    fn play(&self) -> Result<(), PlayError>;
    fn pause(&self);
    fn is_paused(&self) -> bool;

    fn set_volume(&self, volume: f64);
    fn set_muted(&self, muted: bool);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;
    fn buffered(&self) -> Vec<TimeRange>;
    fn ready_state(&self) -> ReadyState;

    /// Whether the element currently reports a decode/source error
    fn has_error(&self) -> bool;

    /// Route the element's own error events to `sink`, or stop routing them
    fn set_error_sink(&self, sink: Option<EventSink>);
}

/// Issue a play request and apply the shared rejection policy:
/// an aborted request is expected during fast switching and swallowed,
/// an autoplay refusal is reported as "needs manual start", anything
/// else is logged and handed back to the caller.
pub(crate) fn request_play(
    media: &dyn MediaElement,
    events: &EventSink,
    protocol: Protocol,
) -> Result<(), PlayError> {
    match media.play() {
        Ok(()) => Ok(()),
        Err(PlayError::Aborted) => {
            debug!("[{}] play request aborted by a newer load", protocol);
            Ok(())
        }
        Err(PlayError::NotAllowed) => {
            info!("[{}] autoplay blocked, waiting for manual start", protocol);
            events.autoplay_blocked();
            Ok(())
        }
        Err(e) => {
            warn!("[{}] play request rejected: {}", protocol, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_contains() {
        let range = TimeRange::new(10.0, 10.5);
        assert!(range.contains(10.0));
        assert!(range.contains(10.49));
        assert!(!range.contains(10.5));
        assert!(!range.contains(9.0));
    }

    #[test]
    fn test_ready_state_ordering() {
        assert!(!ReadyState::HaveCurrentData.can_advance());
        assert!(ReadyState::HaveFutureData.can_advance());
        assert!(ReadyState::HaveEnoughData.can_advance());
    }
}
