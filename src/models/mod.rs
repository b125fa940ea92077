pub mod channel;
pub mod playback;

pub use channel::{
    Category, Channel, DrmConfig, HttpHeaders, Playlist, ALL_CHANNELS_ID, ALL_CHANNELS_NAME,
    DEFAULT_GROUP,
};
pub use playback::{
    Capabilities, Container, ErrorClass, ErrorReport, HealthSample, HealthStatus, Protocol,
    RecoveryAction, SessionState,
};
