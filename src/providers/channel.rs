//! Channel provider fed by a live transport

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::provider::Provider;
use crate::types::Notification;
use crate::{Result, TrackError};

/// Sending half handed to the transport.
///
/// `try_send` never blocks or awaits, so it can be called straight from a
/// Bluetooth notification callback on any thread.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: mpsc::Sender<Notification>,
    sequence: Arc<AtomicU64>,
}

impl NotificationSender {
    /// Queue one raw notification.
    ///
    /// Fails with `ChannelClosed` once the provider is gone, and with
    /// `Connection` when the queue is full.
    pub fn try_send(&self, data: impl Into<Arc<[u8]>>) -> Result<()> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        match self.tx.try_send(Notification::new(data, sequence)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(TrackError::channel_closed("Notification")),
            Err(mpsc::error::TrySendError::Full(_)) => {
                Err(TrackError::connection_failed("Notification queue full, driver is not keeping up"))
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Provider that yields whatever the transport pushes into its sender.
/// Ends once every [`NotificationSender`] has been dropped.
pub struct ChannelProvider {
    rx: mpsc::Receiver<Notification>,
}

impl ChannelProvider {
    /// Create a provider and its sender with room for `capacity` queued
    /// notifications (at least 1).
    pub fn new(capacity: usize) -> (NotificationSender, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let sender = NotificationSender { tx, sequence: Arc::new(AtomicU64::new(0)) };
        (sender, Self { rx })
    }
}

#[async_trait::async_trait]
impl Provider for ChannelProvider {
    async fn next_notification(&mut self) -> Result<Option<Notification>> {
        match self.rx.recv().await {
            Some(notification) => {
                trace!(sequence = notification.sequence, len = notification.len(), "Received notification");
                Ok(Some(notification))
            }
            None => {
                debug!("All notification senders dropped");
                Ok(None)
            }
        }
    }

    fn source(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_order_with_sequence_numbers() {
        let (sender, mut provider) = ChannelProvider::new(8);
        sender.try_send(vec![0x01, 0x17]).expect("queued");
        sender.clone().try_send(vec![0x01, 0x2b]).expect("queued");

        let first = provider.next_notification().await.expect("ok").expect("first");
        let second = provider.next_notification().await.expect("ok").expect("second");
        assert_eq!((first.sequence, second.sequence), (0, 1));
        assert_eq!(&*second.data, &[0x01, 0x2b]);
    }

    #[tokio::test]
    async fn ends_when_senders_drop() {
        let (sender, mut provider) = ChannelProvider::new(1);
        sender.try_send(vec![0x01, 0x17]).expect("queued");
        drop(sender);

        assert!(provider.next_notification().await.expect("ok").is_some());
        assert!(provider.next_notification().await.expect("ok").is_none());
    }

    #[test]
    fn full_and_closed_queues_are_errors() {
        let (sender, provider) = ChannelProvider::new(1);
        sender.try_send(vec![0x01, 0x17]).expect("queued");
        assert!(matches!(sender.try_send(vec![0x01, 0x17]), Err(TrackError::Connection { .. })));

        drop(provider);
        assert!(sender.is_closed());
        assert!(matches!(sender.try_send(vec![0x01, 0x17]), Err(TrackError::ChannelClosed { .. })));
    }
}
