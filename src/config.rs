use std::env;
use std::time::Duration;

use crate::models::Capabilities;

/// Delay between a fatal verdict and the channel-failed notification
pub const DEFAULT_FATAL_ESCALATION_DELAY_MS: u64 = 2500;
pub const DEFAULT_HEALTH_SAMPLE_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_HLS_MANIFEST_TIMEOUT_MS: u64 = 10_000;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Playlist loading
    pub user_agent: String,
    pub fetch_timeout_ms: u64,
    pub max_retries: u32,
    pub max_m3u_size_mb: usize,

    // Playback
    pub fatal_escalation_delay_ms: u64,
    pub health_sample_interval_ms: u64,
    pub hls_manifest_timeout_ms: u64,
    pub hls_enable_worker: bool,

    // Preferences passed in at session start
    pub initial_volume: f64,
    pub initial_muted: bool,

    // Host capabilities (reported by the inspection binary)
    pub capabilities: Capabilities,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Use VLC user agent to avoid IPTV server blocks
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| "VLC/3.0.20 LibVLC/3.0.20".to_string()),
            fetch_timeout_ms: env_or("FETCH_TIMEOUT_MS", 30_000),
            max_retries: env_or("MAX_RETRIES", 3),
            max_m3u_size_mb: env_or("MAX_M3U_SIZE_MB", 50),

            fatal_escalation_delay_ms: env_or(
                "FATAL_ESCALATION_DELAY_MS",
                DEFAULT_FATAL_ESCALATION_DELAY_MS,
            ),
            health_sample_interval_ms: env_or(
                "HEALTH_SAMPLE_INTERVAL_MS",
                DEFAULT_HEALTH_SAMPLE_INTERVAL_MS,
            ),
            hls_manifest_timeout_ms: env_or(
                "HLS_MANIFEST_TIMEOUT_MS",
                DEFAULT_HLS_MANIFEST_TIMEOUT_MS,
            ),
            hls_enable_worker: env_or("HLS_ENABLE_WORKER", true),

            initial_volume: env_or("INITIAL_VOLUME", 1.0_f64).clamp(0.0, 1.0),
            initial_muted: env_or("INITIAL_MUTED", false),

            capabilities: Capabilities {
                segmented_ts_flv: env_or("CAP_SEGMENTED_TS_FLV", true),
                hls_engine: env_or("CAP_HLS_ENGINE", true),
                native_hls: env_or("CAP_NATIVE_HLS", false),
            },
        }
    }

    /// Playback settings handed to the controller
    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            fatal_escalation_delay: Duration::from_millis(self.fatal_escalation_delay_ms),
            health_sample_interval: Duration::from_millis(self.health_sample_interval_ms.max(1)),
            hls_manifest_timeout: Duration::from_millis(self.hls_manifest_timeout_ms),
            hls_enable_worker: self.hls_enable_worker,
            initial_volume: self.initial_volume,
            initial_muted: self.initial_muted,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Settings of one playback controller
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub fatal_escalation_delay: Duration,
    pub health_sample_interval: Duration,
    pub hls_manifest_timeout: Duration,
    pub hls_enable_worker: bool,
    /// Volume in 0.0..=1.0 applied when a session starts
    pub initial_volume: f64,
    pub initial_muted: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            fatal_escalation_delay: Duration::from_millis(DEFAULT_FATAL_ESCALATION_DELAY_MS),
            health_sample_interval: Duration::from_millis(DEFAULT_HEALTH_SAMPLE_INTERVAL_MS),
            hls_manifest_timeout: Duration::from_millis(DEFAULT_HLS_MANIFEST_TIMEOUT_MS),
            hls_enable_worker: true,
            initial_volume: 1.0,
            initial_muted: false,
        }
    }
}
