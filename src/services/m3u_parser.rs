use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

use crate::error::ParseFailure;
use crate::models::{Category, Channel, DrmConfig, HttpHeaders, Playlist, DEFAULT_GROUP};

const EXTINF_PREFIX: &str = "#EXTINF:";

/// Line prefixes carrying `key=value` properties for the next URL
const PROPERTY_PREFIXES: [&str; 2] = ["#KODIPROP:", "#EXTVLCOPT:"];

const PROP_LICENSE_TYPE: &str = "inputstream.adaptive.license_type";
const PROP_LICENSE_KEY: &str = "inputstream.adaptive.license_key";
const PROP_USER_AGENT: &str = "http-user-agent";
const PROP_REFERRER: &str = "http-referrer";

lazy_static! {
    /// Regex to parse EXTINF attributes (tvg-id="...", group-title="...", etc)
    static ref ATTR_REGEX: Regex = Regex::new(r#"(\w+(?:-\w+)*)="([^"]*)""#).unwrap();
}

/// Parsed EXTINF line data
#[derive(Debug, Default)]
struct ExtinfData {
    attributes: HashMap<String, String>,
    title: String,
}

impl ExtinfData {
    fn attr(&self, key: &str) -> Option<String> {
        self.attributes
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Generate a channel ID from URL and position. Unique within one parse.
fn generate_channel_id(url: &str, index: usize) -> String {
    let hash: i32 = url.chars().fold(0, |acc, c| {
        ((acc << 5).wrapping_sub(acc)).wrapping_add(c as i32)
    });
    format!("ch_{}_{}", hash.unsigned_abs(), index)
}

/// Parse an EXTINF line
/// Format: #EXTINF:duration tvg-id="..." tvg-logo="..." group-title="...",Title
///
/// The title is whatever follows the final comma.
fn parse_extinf(line: &str) -> Option<ExtinfData> {
    let content = line.strip_prefix(EXTINF_PREFIX)?;

    let (header, title) = match content.rfind(',') {
        Some(pos) => (&content[..pos], content[pos + 1..].trim()),
        None => (content, ""),
    };

    let attributes = ATTR_REGEX
        .captures_iter(header)
        .map(|caps| (caps[1].to_lowercase(), caps[2].to_string()))
        .collect();

    Some(ExtinfData {
        attributes,
        title: title.to_string(),
    })
}

/// Parse a `#KODIPROP:key=value` / `#EXTVLCOPT:key=value` line
fn parse_property(line: &str) -> Option<(String, String)> {
    let body = PROPERTY_PREFIXES
        .iter()
        .find_map(|prefix| line.strip_prefix(prefix))?;
    let (key, value) = body.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

/// Split `Header=Val&Header2=Val2` into a header map with URL-decoded values
fn parse_license_headers(raw: &str) -> HashMap<String, String> {
    raw.split('&')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            Some((name.to_string(), value))
        })
        .collect()
}

/// Build the DRM configuration when both license properties are present.
/// License key format: `url[|Header=Val[&Header2=Val2...]]`
fn extract_drm(props: &HashMap<String, String>) -> Option<DrmConfig> {
    let key_system = props.get(PROP_LICENSE_TYPE)?;
    let license_key = props.get(PROP_LICENSE_KEY)?;

    let (license_url, headers) = match license_key.split_once('|') {
        Some((url, raw_headers)) => (url, parse_license_headers(raw_headers)),
        None => (license_key.as_str(), HashMap::new()),
    };

    Some(DrmConfig {
        key_system: key_system.clone(),
        license_url: license_url.trim().to_string(),
        headers,
    })
}

/// Sorted distinct groups, with "All Channels" prepended
fn build_categories(groups: BTreeSet<String>) -> Vec<Category> {
    std::iter::once(Category::all_channels())
        .chain(groups.into_iter().enumerate().map(|(i, name)| Category {
            id: format!("cat_{}", i + 1),
            name,
        }))
        .collect()
}

/// Parse M3U text into channels and categories.
///
/// Best effort: unknown lines are skipped, a missing name becomes
/// `Channel N` and a missing group becomes `Uncategorized`. Never fails.
pub fn parse(content: &str) -> Playlist {
    let mut channels: Vec<Channel> = Vec::new();
    let mut groups: BTreeSet<String> = BTreeSet::new();

    let mut pending_extinf: Option<ExtinfData> = None;
    let mut pending_props: HashMap<String, String> = HashMap::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(EXTINF_PREFIX) {
            pending_extinf = parse_extinf(line);
            continue;
        }

        if let Some((key, value)) = parse_property(line) {
            pending_props.insert(key, value);
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        // URL line terminates the pending channel
        let extinf = pending_extinf.take().unwrap_or_default();
        let index = channels.len();

        let name = if extinf.title.is_empty() {
            format!("Channel {}", index + 1)
        } else {
            extinf.title.clone()
        };
        let group = extinf
            .attr("group-title")
            .unwrap_or_else(|| DEFAULT_GROUP.to_string());

        let headers = HttpHeaders {
            user_agent: pending_props.get(PROP_USER_AGENT).cloned(),
            referrer: pending_props.get(PROP_REFERRER).cloned(),
        };

        groups.insert(group.clone());
        channels.push(Channel {
            id: generate_channel_id(line, index),
            tvg_id: extinf.attr("tvg-id"),
            name,
            logo: extinf.attr("tvg-logo"),
            group,
            url: line.to_string(),
            drm: extract_drm(&pending_props),
            headers,
        });

        pending_props.clear();
    }

    Playlist {
        channels,
        categories: build_categories(groups),
    }
}

/// Parse a playlist for playback. An empty result is a load failure:
/// the caller must not enter the browsing state.
pub fn load_playlist(content: &str) -> Result<Playlist, ParseFailure> {
    if content.trim().is_empty() {
        tracing::warn!("Playlist load failed: empty input");
        return Err(ParseFailure::EmptyInput);
    }

    let playlist = parse(content);
    if playlist.is_empty() {
        tracing::warn!("Playlist load failed: no channels found");
        return Err(ParseFailure::NoChannels);
    }

    let drm_count = playlist.channels.iter().filter(|c| c.drm.is_some()).count();
    tracing::info!(
        "Playlist parsed: {} channels, {} categories, {} with DRM",
        playlist.channels.len(),
        playlist.categories.len(),
        drm_count
    );

    Ok(playlist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ALL_CHANNELS_ID, ALL_CHANNELS_NAME};

    #[test]
    fn test_generate_channel_id() {
        let id1 = generate_channel_id("http://stream1.com", 0);
        let id2 = generate_channel_id("http://stream2.com", 0);
        assert_ne!(id1, id2);
        assert!(id1.starts_with("ch_"));

        // Same URL twice still gets distinct ids
        assert_ne!(
            generate_channel_id("http://stream1.com", 0),
            generate_channel_id("http://stream1.com", 1)
        );
    }

    #[test]
    fn test_parse_extinf() {
        let line = r#"#EXTINF:-1 tvg-id="globo" tvg-name="Globo HD" tvg-logo="http://logo.com/globo.png" group-title="TV",Globo HD"#;
        let extinf = parse_extinf(line).unwrap();

        assert_eq!(extinf.title, "Globo HD");
        assert_eq!(extinf.attr("tvg-id"), Some("globo".to_string()));
        assert_eq!(extinf.attr("group-title"), Some("TV".to_string()));
    }

    #[test]
    fn test_parse_extinf_takes_text_after_final_comma() {
        let line = r#"#EXTINF:-1 group-title="News, World",BBC, World"#;
        let extinf = parse_extinf(line).unwrap();
        assert_eq!(extinf.title, "World");
        assert_eq!(extinf.attr("group-title"), Some("News, World".to_string()));

        let extinf = parse_extinf("#EXTINF:-1,Canal Teste").unwrap();
        assert_eq!(extinf.title, "Canal Teste");
        assert!(extinf.attributes.is_empty());
    }

    #[test]
    fn test_parse_basic_playlist() {
        let content = r#"#EXTM3U
#EXTINF:-1 tvg-id="cnn" tvg-logo="http://logo/cnn.png" group-title="News",CNN
http://example.com/cnn.m3u8
#EXTINF:-1 tvg-id="espn" group-title="Sports",ESPN
http://example.com/espn.mpd
#EXTINF:-1 group-title="News",BBC
http://example.com/bbc.ts
"#;
        let playlist = parse(content);

        assert_eq!(playlist.channels.len(), 3);
        assert_eq!(playlist.channels[0].name, "CNN");
        assert_eq!(playlist.channels[0].tvg_id, Some("cnn".to_string()));
        assert_eq!(playlist.channels[0].logo, Some("http://logo/cnn.png".to_string()));
        assert_eq!(playlist.channels[1].group, "Sports");
        assert_eq!(playlist.channels[2].url, "http://example.com/bbc.ts");

        let ids: std::collections::HashSet<_> = playlist.channels.iter().map(|c| &c.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_categories_sorted_with_all_first() {
        let content = r#"#EXTINF:-1 group-title="Sports",A
http://a
#EXTINF:-1 group-title="Kids",B
http://b
#EXTINF:-1 group-title="Sports",C
http://c
#EXTINF:-1,D
http://d
"#;
        let playlist = parse(content);
        let names: Vec<_> = playlist.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![ALL_CHANNELS_NAME, "Kids", "Sports", "Uncategorized"]);

        assert_eq!(playlist.categories[0].id, ALL_CHANNELS_ID);
        assert_eq!(playlist.categories[1].id, "cat_1");
        assert_eq!(playlist.categories[3].id, "cat_3");
    }

    #[test]
    fn test_defaults_for_missing_metadata() {
        let content = "#EXTM3U\nhttp://example.com/one.m3u8\n#EXTINF:-1 group-title=\"\",\nhttp://example.com/two.m3u8\n";
        let playlist = parse(content);

        assert_eq!(playlist.channels.len(), 2);
        assert_eq!(playlist.channels[0].name, "Channel 1");
        assert_eq!(playlist.channels[0].group, "Uncategorized");
        assert_eq!(playlist.channels[1].name, "Channel 2");
        assert_eq!(playlist.channels[1].group, "Uncategorized");
        assert!(playlist.channels[0].tvg_id.is_none());
    }

    #[test]
    fn test_drm_from_kodiprop() {
        let content = r#"#EXTM3U
#KODIPROP:inputstream.adaptive.license_type=com.widevine.alpha
#KODIPROP:inputstream.adaptive.license_key=https://lic.example/x|Header1=aaa&Header2=b%20b
#EXTINF:-1 group-title="Premium",Secure
https://cdn.example/secure.mpd
"#;
        let playlist = parse(content);
        let drm = playlist.channels[0].drm.as_ref().expect("drm config");

        assert_eq!(drm.key_system, "com.widevine.alpha");
        assert_eq!(drm.license_url, "https://lic.example/x");
        assert_eq!(drm.headers.len(), 2);
        assert_eq!(drm.headers.get("Header1"), Some(&"aaa".to_string()));
        assert_eq!(drm.headers.get("Header2"), Some(&"b b".to_string()));
    }

    #[test]
    fn test_drm_requires_both_properties() {
        let content = r#"#KODIPROP:inputstream.adaptive.license_key=https://lic.example/x
#EXTINF:-1,Half Configured
https://cdn.example/a.mpd
"#;
        let playlist = parse(content);
        assert!(playlist.channels[0].drm.is_none());

        let content = r#"#KODIPROP:inputstream.adaptive.license_type=clearkey
#KODIPROP:inputstream.adaptive.license_key=https://lic.example/ck
#EXTINF:-1,No Headers
https://cdn.example/b.mpd
"#;
        let drm = parse(content).channels[0].drm.clone().unwrap();
        assert_eq!(drm.license_url, "https://lic.example/ck");
        assert!(drm.headers.is_empty());
    }

    #[test]
    fn test_properties_apply_only_to_next_url() {
        let content = r#"#KODIPROP:inputstream.adaptive.license_type=clearkey
#KODIPROP:inputstream.adaptive.license_key=https://lic.example/ck
#KODIPROP:http-user-agent=Kodi/20
#EXTINF:-1,First
https://cdn.example/1.mpd
#EXTINF:-1,Second
https://cdn.example/2.mpd
https://cdn.example/3.mpd
"#;
        let playlist = parse(content);
        assert_eq!(playlist.channels.len(), 3);
        assert!(playlist.channels[0].drm.is_some());
        assert_eq!(playlist.channels[0].headers.user_agent, Some("Kodi/20".to_string()));
        assert!(playlist.channels[1].drm.is_none());
        assert!(playlist.channels[1].headers.is_empty());
        assert!(playlist.channels[2].drm.is_none());
    }

    #[test]
    fn test_later_duplicate_property_wins() {
        let content = r#"#KODIPROP:http-referrer=https://old.example/
#EXTVLCOPT:http-referrer=https://new.example/
#EXTVLCOPT:http-user-agent=VLC/3.0
#EXTINF:-1,Referred
http://example.com/live.m3u8
"#;
        let channel = &parse(content).channels[0];
        assert_eq!(channel.headers.referrer, Some("https://new.example/".to_string()));
        assert_eq!(channel.headers.user_agent, Some("VLC/3.0".to_string()));
    }

    #[test]
    fn test_ignores_unknown_lines() {
        let content = "#EXTM3U\n#EXTGRP:Whatever\n\n#KODIPROP:malformed\n#EXTINF:-1,Only\n  http://example.com/only.m3u8  \n";
        let playlist = parse(content);
        assert_eq!(playlist.channels.len(), 1);
        assert_eq!(playlist.channels[0].url, "http://example.com/only.m3u8");
    }

    #[test]
    fn test_load_playlist_rejects_empty() {
        assert_eq!(load_playlist("").unwrap_err(), ParseFailure::EmptyInput);
        assert_eq!(load_playlist("  \n\n").unwrap_err(), ParseFailure::EmptyInput);
        assert_eq!(
            load_playlist("#EXTM3U\n#EXTINF:-1,Dangling\n").unwrap_err(),
            ParseFailure::NoChannels
        );

        let playlist = load_playlist("#EXTINF:-1,One\nhttp://example.com/1.ts\n").unwrap();
        assert_eq!(playlist.channels.len(), 1);
    }
}
