//! Adaptive IPTV playback engine.
//!
//! Turns M3U playlist text into channels and categories, picks a playback
//! backend per stream URL, and runs one playback session at a time with
//! per-backend failure recovery and advisory buffer health.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::{Config, PlayerConfig};
pub use error::{BackendError, ParseFailure, PlayError, PlaybackFailure};
pub use services::m3u_parser::{load_playlist, parse};
pub use services::player::{ChannelFailure, EngineProvider, MediaElement, PlaybackController};
pub use services::protocol::classify;
