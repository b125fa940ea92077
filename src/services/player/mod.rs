//! Playback side of the engine: media element seam, engine adapters,
//! session controller, recovery policy and health monitoring.

pub mod backends;
pub mod engine;
pub mod health;
pub mod media;
pub mod recovery;
pub mod session;

#[cfg(test)]
pub mod testing;

pub use backends::{Backend, BackendHandle};
pub use engine::{
    BackendEvent, DashEngine, EngineProvider, EventSink, HlsConfig, HlsEngine, LicenseServer,
    MpegTsConfig, MpegTsEngine, ProtectionData, StreamSource,
};
pub use health::HealthMonitor;
pub use media::{MediaElement, ReadyState, SharedMedia, TimeRange};
pub use recovery::Verdict;
pub use session::{ChannelFailure, FatalCallback, PlaybackController};
