//! Error taxonomy of the playback engine.
//!
//! Only [`PlaybackFailure`] ever crosses the engine boundary, and only through
//! the delayed channel-failed notification. Everything else is absorbed.

use thiserror::Error;

/// Playlist text could not produce a usable channel list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("playlist is empty")]
    EmptyInput,
    #[error("playlist contains no channels")]
    NoChannels,
}

/// Construction or attach of a backend failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("{0} engine is not available")]
    Unavailable(&'static str),
    #[error("engine setup failed: {0}")]
    Setup(String),
}

/// Rejection of a play request on the media element
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    /// The request was interrupted by a new load (fast channel switching)
    #[error("play request aborted")]
    Aborted,
    /// Autoplay policy refused playback without a user gesture
    #[error("play request not allowed")]
    NotAllowed,
    #[error("media format not supported")]
    NotSupported,
    #[error("play request failed: {0}")]
    Other(String),
}

/// Verdict that ends playback of a channel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackFailure {
    #[error("Setup Failed: {reason}")]
    SetupFailure { reason: String },
    #[error("{reason}")]
    FatalStream { reason: String },
}

impl PlaybackFailure {
    pub fn setup(reason: impl Into<String>) -> Self {
        Self::SetupFailure {
            reason: reason.into(),
        }
    }

    pub fn stream(reason: impl Into<String>) -> Self {
        Self::FatalStream {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            PlaybackFailure::SetupFailure { reason } => reason,
            PlaybackFailure::FatalStream { reason } => reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let setup = PlaybackFailure::setup("hls engine is not available");
        assert_eq!(setup.to_string(), "Setup Failed: hls engine is not available");
        assert_eq!(setup.reason(), "hls engine is not available");

        let stream = PlaybackFailure::stream("Stream Connection Failed");
        assert_eq!(stream.to_string(), "Stream Connection Failed");
    }
}
