//! Mapping session over a running driver

use futures::{Stream, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::VehicleConfig;
use crate::driver::{Driver, DriverCommand, VehicleStatus};
use crate::map::{TileGrid, TrackMapper, TrackSnapshot};
use crate::provider::Provider;
use crate::providers::{ChannelProvider, NotificationSender, ReplayProvider};
use crate::stream::ThrottleExt;
use crate::types::UpdateRate;
use crate::{Result, TrackError};

/// Handle to one vehicle's mapping run.
///
/// Dropping the session stops the driver task.
pub struct MappingSession {
    maps: watch::Receiver<Option<Arc<TrackSnapshot>>>,
    status: watch::Receiver<VehicleStatus>,
    commands: mpsc::Sender<DriverCommand>,
    cancel: CancellationToken,
    vehicle: String,
}

impl MappingSession {
    /// Start mapping from any provider. Must be called within a tokio runtime.
    pub fn spawn<P: Provider>(provider: P, config: &VehicleConfig) -> Self {
        let mapper = TrackMapper::with_policy(config.mapping.unknown_pieces);
        let status = VehicleStatus::with_lane_offset(config.initial_lane_offset());
        let channels = Driver::spawn_with_status(provider, mapper, status);

        info!(vehicle = config.display_name(), "Mapping session started");
        Self {
            maps: channels.maps,
            status: channels.status,
            commands: channels.commands,
            cancel: channels.cancel,
            vehicle: config.display_name().to_string(),
        }
    }

    /// Replay a capture file
    ///
    /// The returned future resolves as soon as the file is read and the driver
    /// is spawned; it never waits on the replay itself.
    pub async fn replay<P: AsRef<Path>>(path: P, config: &VehicleConfig) -> Result<Self> {
        let provider = ReplayProvider::open(path)?;
        Ok(Self::spawn(provider, config))
    }

    /// Map a live vehicle. Feed its notifications into the returned sender.
    ///
    /// Resolves immediately after validating `config`. Nothing is awaited; the
    /// future only needs a runtime to spawn the driver on.
    pub async fn attach(config: &VehicleConfig, capacity: usize) -> Result<(NotificationSender, Self)> {
        config.validate()?;
        let (sender, provider) = ChannelProvider::new(capacity);
        Ok((sender, Self::spawn(provider, config)))
    }

    /// Stream of map snapshots
    ///
    /// Yields the current map first if one exists. With `UpdateRate::Max`
    /// intermediate snapshots are skipped, the latest always wins.
    pub fn map_updates(&self, rate: UpdateRate) -> impl Stream<Item = Arc<TrackSnapshot>> + 'static {
        let maps = WatchStream::new(self.maps.clone()).filter_map(|map| async move { map });

        match rate.throttle_interval() {
            None => maps.boxed(),
            Some(interval) => maps.throttle(interval).boxed(),
        }
    }

    /// Stream of vehicle status changes, starting with the current status
    pub fn status_updates(&self) -> impl Stream<Item = VehicleStatus> + 'static {
        WatchStream::new(self.status.clone())
    }

    pub fn current_map(&self) -> Option<Arc<TrackSnapshot>> {
        self.maps.borrow().clone()
    }

    pub fn current_status(&self) -> VehicleStatus {
        self.status.borrow().clone()
    }

    /// Wait for the loop to close and return the finished map.
    ///
    /// Fails with `Timeout` if the map is not done within `timeout`, and with
    /// `ChannelClosed` if the driver stops first.
    pub async fn wait_until_done(&self, timeout: Duration) -> Result<Arc<TrackSnapshot>> {
        let mut maps = self.maps.clone();
        let done = async move {
            let map = maps
                .wait_for(|map| map.as_ref().is_some_and(|snapshot| snapshot.state.done))
                .await
                .map_err(|_| TrackError::channel_closed("Track map"))?;
            (*map).clone().ok_or_else(|| TrackError::channel_closed("Track map"))
        };

        tokio::time::timeout(timeout, done).await.map_err(|_| TrackError::Timeout { duration: timeout })?
    }

    /// Discard the current map and start over at the next start line.
    pub async fn reset_map(&self) -> Result<()> {
        self.send(DriverCommand::ResetMap).await
    }

    /// Load a previously saved map. It is published as complete and later
    /// pieces are ignored until [`reset_map`](Self::reset_map).
    pub async fn restore_map(&self, grid: TileGrid) -> Result<()> {
        self.send(DriverCommand::RestoreMap(grid)).await
    }

    /// Stop mapping and publish the map as it stands.
    pub async fn mark_done(&self) -> Result<()> {
        self.send(DriverCommand::MarkDone).await
    }

    async fn send(&self, command: DriverCommand) -> Result<()> {
        self.commands.send(command).await.map_err(|_| TrackError::channel_closed("Driver command"))
    }

    /// Display name of the mapped vehicle
    pub fn vehicle(&self) -> &str {
        &self.vehicle
    }
}

impl Drop for MappingSession {
    fn drop(&mut self) {
        debug!(vehicle = %self.vehicle, "Dropping mapping session");
        self.cancel.cancel();
    }
}
