//! Provider trait for notification sources

use crate::Result;
use crate::types::Notification;

/// Trait for vehicle notification sources
///
/// Providers abstract over where raw notifications come from (a Bluetooth
/// transport feeding a channel, a recorded capture file) and handle their
/// own timing internally.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Get the next raw notification
    ///
    /// Returns:
    /// - `Ok(Some(notification))` - New notification available
    /// - `Ok(None)` - Stream ended (normal termination)
    /// - `Err(e)` - Error occurred
    async fn next_notification(&mut self) -> Result<Option<Notification>>;

    /// Short name of the source for logging
    fn source(&self) -> &'static str;
}
