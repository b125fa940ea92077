use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ativeplay_engine::config::Config;
use ativeplay_engine::models::{Category, Channel, Playlist, Protocol};
use ativeplay_engine::services::{playlist_source, protocol};

/// Load an M3U playlist and print its categories and channels as JSON,
/// with the playback protocol each channel would use.
#[derive(Parser)]
#[command(name = "ativeplay-engine", version, about)]
struct Args {
    /// Playlist file path or http(s) URL
    source: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelReport<'a> {
    #[serde(flatten)]
    channel: &'a Channel,
    protocol: Protocol,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistReport<'a> {
    categories: &'a [Category],
    channels: Vec<ChannelReport<'a>>,
}

fn report<'a>(playlist: &'a Playlist, config: &Config) -> PlaylistReport<'a> {
    PlaylistReport {
        categories: &playlist.categories,
        channels: playlist
            .channels
            .iter()
            .map(|channel| ChannelReport {
                channel,
                protocol: protocol::classify(&channel.url, &config.capabilities),
            })
            .collect(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ativeplay_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    tracing::info!("Starting AtivePlay engine v{}", env!("CARGO_PKG_VERSION"));

    let playlist = match playlist_source::load(&args.source, &config).await {
        Ok(playlist) => playlist,
        Err(e) => {
            tracing::error!("Failed to load playlist: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        "Loaded {} channels in {} categories",
        playlist.channels.len(),
        playlist.categories.len()
    );

    match serde_json::to_string_pretty(&report(&playlist, &config)) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to encode report: {}", e);
            ExitCode::FAILURE
        }
    }
}
