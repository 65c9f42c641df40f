//! Replay provider for recorded notification captures
//!
//! A capture file holds one notification per line as whitespace-separated
//! hex bytes. `#` starts a comment and blank lines are skipped:
//!
//! ```text
//! # start line, lane 2
//! 12 29 00 00 00 00 00 00 00 00 00 00 00 00 00 00 20 21 00
//! 10 27 0e 21 00 00 bc c1 2c 01 47 00 00 00 00 00 00
//! ```

use std::path::Path;
use std::sync::Arc;
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::provider::Provider;
use crate::types::Notification;
use crate::{Result, TrackError};

/// Replay provider that yields notifications from a capture
pub struct ReplayProvider {
    notifications: Vec<Arc<[u8]>>,

    /// Index of the next notification to yield
    position: usize,

    /// Pacing period, or None to yield as fast as the consumer reads
    period: Option<Duration>,

    /// Created on first use so the provider can be built outside a runtime
    interval: Option<Interval>,
}

impl ReplayProvider {
    /// Open a capture file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TrackError::file_error(path.to_path_buf(), e))?;
        let notifications = parse_capture(&text)?;

        info!(path = %path.display(), notifications = notifications.len(), "Opened capture file");
        Ok(Self::with_payloads(notifications))
    }

    /// Replay notifications held in memory
    pub fn from_notifications<I, B>(notifications: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Arc<[u8]>>,
    {
        Self::with_payloads(notifications.into_iter().map(Into::into).collect())
    }

    fn with_payloads(notifications: Vec<Arc<[u8]>>) -> Self {
        Self { notifications, position: 0, period: None, interval: None }
    }

    /// Pace delivery at `hz` notifications per second, clamped to 1..=1000.
    pub fn set_rate(&mut self, hz: u32) {
        let hz = hz.clamp(1, 1000);
        self.period = Some(Duration::from_secs_f64(1.0 / f64::from(hz)));
        self.interval = None;
        debug!(hz, "Replay rate set");
    }

    /// Builder form of [`set_rate`](Self::set_rate)
    pub fn with_rate(mut self, hz: u32) -> Self {
        self.set_rate(hz);
        self
    }

    /// Pacing period, if pacing is enabled
    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Total number of notifications in the capture
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Notifications not yet yielded
    pub fn remaining(&self) -> usize {
        self.notifications.len() - self.position
    }
}

#[async_trait::async_trait]
impl Provider for ReplayProvider {
    async fn next_notification(&mut self) -> Result<Option<Notification>> {
        let Some(data) = self.notifications.get(self.position).cloned() else {
            debug!("Reached end of replay");
            return Ok(None);
        };

        if let Some(period) = self.period {
            let ticker = self.interval.get_or_insert_with(|| {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });
            ticker.tick().await;
        }

        let sequence = self.position as u64;
        self.position += 1;
        trace!(sequence, len = data.len(), "Replaying notification");

        Ok(Some(Notification::new(data, sequence)))
    }

    fn source(&self) -> &'static str {
        "replay"
    }
}

/// Parse capture text into notification payloads.
pub fn parse_capture(text: &str) -> Result<Vec<Arc<[u8]>>> {
    let mut notifications = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let bytes = content
            .split_whitespace()
            .map(|token| {
                u8::from_str_radix(token, 16).map_err(|_| {
                    TrackError::parse_error(
                        "Capture file",
                        format!("line {}: '{}' is not a hex byte", index + 1, token),
                    )
                })
            })
            .collect::<Result<Vec<u8>>>()?;

        notifications.push(Arc::from(bytes));
    }

    Ok(notifications)
}
