//! Buffer health monitor.
//!
//! Samples the media element on a fixed period and classifies how much
//! media is buffered ahead of the playback position. The reading is
//! advisory only; nothing in the engine acts on it.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::media::{MediaElement, SharedMedia, TimeRange};
use crate::models::{HealthSample, HealthStatus};

/// Below this lead the stream is `poor`
pub const POOR_LEAD_SECS: f64 = 2.0;
/// At or above this lead the stream is `good`
pub const GOOD_LEAD_SECS: f64 = 5.0;

/// Seconds buffered ahead of `position` in the range that contains it, else 0
pub fn buffer_lead(position: f64, ranges: &[TimeRange]) -> f64 {
    ranges
        .iter()
        .find(|range| range.contains(position))
        .map(|range| (range.end - position).max(0.0))
        .unwrap_or(0.0)
}

pub fn classify_lead(lead: f64) -> HealthStatus {
    if lead < POOR_LEAD_SECS {
        HealthStatus::Poor
    } else if lead < GOOD_LEAD_SECS {
        HealthStatus::Fair
    } else {
        HealthStatus::Good
    }
}

/// Take one health reading. A pending fatal verdict forces `offline`.
pub fn sample(media: &dyn MediaElement, pending_removal: bool) -> HealthSample {
    if pending_removal || media.has_error() {
        return HealthSample::new(HealthStatus::Offline, 0.0);
    }

    if !media.ready_state().can_advance() {
        return HealthSample::new(HealthStatus::Buffering, 0.0);
    }

    let lead = buffer_lead(media.current_time(), &media.buffered());
    HealthSample::new(classify_lead(lead), lead)
}

/// Background sampler. Sampling stops when the monitor is dropped.
pub struct HealthMonitor {
    latest: watch::Receiver<HealthSample>,
    cancel: CancellationToken,
}

impl HealthMonitor {
    /// Spawn the sampling task. Must be called from within a Tokio runtime.
    pub fn spawn(
        media: SharedMedia,
        pending_removal: watch::Receiver<bool>,
        period: Duration,
    ) -> Self {
        let (tx, latest) = watch::channel(HealthSample::default());
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let reading = sample(media.as_ref(), *pending_removal.borrow());
                        let changed = tx.send_if_modified(|current| {
                            if *current == reading {
                                return false;
                            }
                            *current = reading;
                            true
                        });
                        if changed {
                            tracing::debug!(
                                "health: {} (lead {:.1}s)",
                                reading.status,
                                reading.buffer_lead_secs
                            );
                        }
                    }
                }
            }
        });

        Self { latest, cancel }
    }

    pub fn latest(&self) -> HealthSample {
        *self.latest.borrow()
    }

    /// Receiver for observers that want to be woken on every new reading
    pub fn subscribe(&self) -> watch::Receiver<HealthSample> {
        self.latest.clone()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
