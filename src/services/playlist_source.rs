//! Playlist acquisition: local file or http(s) URL, then parse.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::Config;
use crate::models::Playlist;
use crate::services::m3u_parser::load_playlist;

const BACKOFF_BASE_MS: u64 = 500;
const BACKOFF_MAX_MS: u64 = 10_000;

/// Delay before retry number `attempt + 1`
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(factor.saturating_mul(BACKOFF_BASE_MS).min(BACKOFF_MAX_MS))
}

/// `true` when the source should be fetched over HTTP
pub fn is_remote(source: &str) -> bool {
    url::Url::parse(source)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub struct PlaylistSource {
    client: Client,
    max_retries: u32,
    max_m3u_size_mb: usize,
}

impl PlaylistSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .gzip(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            max_m3u_size_mb: config.max_m3u_size_mb,
        })
    }

    fn max_bytes(&self) -> u64 {
        (self.max_m3u_size_mb as u64) * 1024 * 1024
    }

    fn check_size(&self, len: u64) -> Result<()> {
        if len > self.max_bytes() {
            bail!(
                "Playlist too large: {:.1}MB (limit {}MB)",
                len as f64 / 1024f64 / 1024f64,
                self.max_m3u_size_mb
            );
        }
        Ok(())
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<Response> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    if resp.status().is_success() {
                        if let Some(len) = resp.content_length() {
                            self.check_size(len)?;
                        }
                        return Ok(resp);
                    }

                    let status = resp.status();
                    if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                        let backoff = backoff_delay(attempt);
                        tracing::warn!(
                            "fetch_retry" = attempt + 1,
                            "reason" = "429",
                            "backoff_ms" = backoff.as_millis() as u64
                        );
                        sleep(backoff).await;
                        continue;
                    }

                    let friendly = match status {
                        StatusCode::NOT_FOUND => "Playlist not found (404). Check the URL.".to_string(),
                        StatusCode::FORBIDDEN => {
                            "Access denied (403). The playlist may require authentication.".to_string()
                        }
                        StatusCode::TOO_MANY_REQUESTS => {
                            "Too many requests (429). The playlist server is rate limiting.".to_string()
                        }
                        _ => format!(
                            "HTTP {}: {}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or("Error")
                        ),
                    };
                    bail!("{}", friendly);
                }
                Err(err) => {
                    if attempt < self.max_retries {
                        let backoff = backoff_delay(attempt);
                        tracing::warn!(
                            "fetch_retry" = attempt + 1,
                            "reason" = "network",
                            "backoff_ms" = backoff.as_millis() as u64
                        );
                        last_err = Some(err);
                        sleep(backoff).await;
                        continue;
                    }
                    return Err(err.into());
                }
            }
        }

        match last_err {
            Some(e) => Err(e.into()),
            None => Err(anyhow!("Unknown fetch error")),
        }
    }

    /// Raw playlist text from a URL or a file path
    pub async fn fetch_text(&self, source: &str) -> Result<String> {
        if is_remote(source) {
            let response = self
                .fetch_with_retry(source)
                .await
                .context("Failed to fetch playlist")?;
            let body = response.bytes().await.context("Failed to read playlist body")?;
            self.check_size(body.len() as u64)?;
            tracing::info!("Playlist size: {:.2} MB", body.len() as f64 / 1024.0 / 1024.0);
            return Ok(String::from_utf8_lossy(&body).into_owned());
        }

        let path = Path::new(source);
        let meta = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Playlist file not found: {}", source))?;
        self.check_size(meta.len())?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read playlist file: {}", source))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn load(&self, source: &str) -> Result<Playlist> {
        tracing::info!("Loading playlist: {}", source);
        let text = self.fetch_text(source).await?;
        let playlist = load_playlist(&text).context("Failed to parse playlist")?;
        Ok(playlist)
    }
}

/// Fetch and parse a playlist with a one-off loader
pub async fn load(source: &str, config: &Config) -> Result<Playlist> {
    PlaylistSource::new(config)?.load(source).await
}
