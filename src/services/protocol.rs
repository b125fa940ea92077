//! Protocol classification for stream URLs.
//!
//! Decides which backend plays a URL from its path extension and what the
//! host environment supports. First match wins:
//!
//! 1. `.mpd` → DASH
//! 2. `.flv` / `.ts` → segmented TS/FLV, if the host supports it
//! 3. `.m3u8`, or an unrecognized extension on a host without native HLS
//!    → HLS, if an HLS engine is available
//! 4. everything else → native element playback

use url::Url;

use crate::models::{Capabilities, Container, Protocol};

/// Streaming extensions with an explicit rule
const STREAM_EXTENSIONS: [&str; 4] = ["mpd", "flv", "ts", "m3u8"];

/// Progressive formats the native element is expected to handle
const PROGRESSIVE_EXTENSIONS: [&str; 10] = [
    "mp4", "m4v", "webm", "mkv", "mov", "ogg", "ogv", "mp3", "aac", "m4a",
];

/// Lowercased extension of the URL's last path segment, ignoring query and fragment
pub fn path_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Relative or otherwise unparseable: strip query/fragment by hand
        Err(_) => url
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn is_recognized(ext: Option<&str>) -> bool {
    match ext {
        Some(ext) => STREAM_EXTENSIONS.contains(&ext) || PROGRESSIVE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Classify a stream URL. Deterministic and total.
pub fn classify(url: &str, caps: &Capabilities) -> Protocol {
    let ext = path_extension(url);
    let ext = ext.as_deref();

    match ext {
        Some("mpd") => return Protocol::Dash,
        Some("flv") | Some("ts") if caps.segmented_ts_flv => return Protocol::MpegTsFlv,
        _ => {}
    }

    let wants_hls = ext == Some("m3u8") || (!is_recognized(ext) && !caps.native_hls);
    if wants_hls && caps.hls_engine {
        return Protocol::Hls;
    }

    Protocol::Native
}

/// Container hint for the segmented TS/FLV engine
pub fn container_for(url: &str) -> Container {
    match path_extension(url).as_deref() {
        Some("flv") => Container::Flv,
        _ => Container::MpegTs,
    }
}
