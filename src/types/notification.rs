//! Raw notification packets

use std::sync::Arc;

/// One raw notification as delivered by the vehicle's read characteristic.
///
/// This is the fundamental data unit that flows from providers to the
/// driver. Everything else (vehicle messages, map snapshots) is derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Notification bytes (zero-copy via Arc)
    pub data: Arc<[u8]>,

    /// Position in the source stream, starting at 0
    pub sequence: u64,
}

impl Notification {
    pub fn new(data: impl Into<Arc<[u8]>>, sequence: u64) -> Self {
        Self { data: data.into(), sequence }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
