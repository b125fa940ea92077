use serde::{Deserialize, Serialize};

/// Protocol class used to pick a playback backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Dash,
    #[serde(rename = "mpegts")]
    MpegTsFlv,
    Hls,
    Native,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Dash => write!(f, "dash"),
            Protocol::MpegTsFlv => write!(f, "mpegts"),
            Protocol::Hls => write!(f, "hls"),
            Protocol::Native => write!(f, "native"),
        }
    }
}

/// Container hint handed to the segmented TS/FLV engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Flv,
    MpegTs,
}

/// What the host environment can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Segmented in-process playback of MPEG-TS/FLV is available
    pub segmented_ts_flv: bool,
    /// A dedicated HLS engine is available
    pub hls_engine: bool,
    /// The media element itself claims HLS support
    pub native_hls: bool,
}

/// Advisory stream health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Buffering,
    Poor,
    Fair,
    Good,
    Offline,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::Buffering
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Buffering => write!(f, "buffering"),
            HealthStatus::Poor => write!(f, "poor"),
            HealthStatus::Fair => write!(f, "fair"),
            HealthStatus::Good => write!(f, "good"),
            HealthStatus::Offline => write!(f, "offline"),
        }
    }
}

/// One health reading. Purely observational.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSample {
    pub status: HealthStatus,
    /// Seconds of buffered media ahead of the playback position
    pub buffer_lead_secs: f64,
}

impl HealthSample {
    pub fn new(status: HealthStatus, buffer_lead_secs: f64) -> Self {
        Self {
            status,
            buffer_lead_secs,
        }
    }
}

/// Lifecycle state of the playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Initializing,
    Active,
    Recovering,
    /// A fatal verdict was raised; escalation is scheduled
    PendingRemoval,
    TornDown,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Error class reported by a backend engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    Network,
    Media,
    Other,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Network => write!(f, "network"),
            ErrorClass::Media => write!(f, "media"),
            ErrorClass::Other => write!(f, "other"),
        }
    }
}

/// Error event emitted by a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub class: ErrorClass,
    pub fatal: bool,
    pub detail: String,
}

impl ErrorReport {
    pub fn new(class: ErrorClass, fatal: bool, detail: impl Into<String>) -> Self {
        Self {
            class,
            fatal,
            detail: detail.into(),
        }
    }

    pub fn network(fatal: bool, detail: impl Into<String>) -> Self {
        Self::new(ErrorClass::Network, fatal, detail)
    }

    pub fn media(fatal: bool, detail: impl Into<String>) -> Self {
        Self::new(ErrorClass::Media, fatal, detail)
    }

    pub fn other(fatal: bool, detail: impl Into<String>) -> Self {
        Self::new(ErrorClass::Other, fatal, detail)
    }
}

/// Local recovery a backend can attempt without escalating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Restart network loading from the current position
    ResumeLoading,
    /// Ask the engine to recover from a decode/media error
    RecoverMedia,
}
