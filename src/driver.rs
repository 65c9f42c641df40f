//! Driver spawns and manages the mapping task

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::map::{PieceOutcome, TileGrid, TrackMapper, TrackSnapshot};
use crate::protocol::{VehicleMessage, battery_percent, start_line_lane_offset};
use crate::provider::Provider;
use crate::types::{FINISH_PIECE_ID, Notification};

/// Consecutive provider errors tolerated before the driver gives up
const MAX_ERRORS: u32 = 10;

/// Queued commands before `send` waits
const COMMAND_CAPACITY: usize = 16;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Receiver for track map snapshots, None until the first piece is mapped
    pub maps: watch::Receiver<Option<Arc<TrackSnapshot>>>,
    /// Receiver for the latest vehicle status
    pub status: watch::Receiver<VehicleStatus>,
    /// Commands processed in order with incoming telemetry
    pub commands: mpsc::Sender<DriverCommand>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCommand {
    /// Discard the map built so far and wait for the start line again
    ResetMap,
    /// Replace the map with a saved one and treat it as complete
    RestoreMap(TileGrid),
    /// Stop mapping and publish the map as it stands
    MarkDone,
}

/// Latest known state of the vehicle.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VehicleStatus {
    /// Piece id from the last position update
    pub piece_id: Option<u8>,
    pub location: Option<u8>,
    /// Speed in mm/s
    pub speed: u16,
    pub clockwise: bool,
    /// Offset of the lane the vehicle was last seen in on the start line, in mm
    pub lane_offset: f32,
    /// Offset from road center as last reported, in mm
    pub road_offset: f32,
    pub battery_level: Option<u16>,
    pub firmware_version: Option<u16>,
    /// Vehicle reported it lost track of its position
    pub delocalized: bool,
    pub map_done: bool,
    /// The provider has no more notifications
    pub stream_ended: bool,
}

impl VehicleStatus {
    /// Status for a vehicle starting in a known lane
    pub fn with_lane_offset(lane_offset: f32) -> Self {
        Self { lane_offset, ..Self::default() }
    }

    pub fn battery_percent(&self) -> Option<u32> {
        self.battery_level.map(battery_percent)
    }
}

/// Driver spawns and manages the mapping task
///
/// One task owns the provider and the [`TrackMapper`]. Every notification is
/// decoded and fed to the mapper on that task, so map updates are strictly
/// ordered with the telemetry that caused them.
pub struct Driver;

impl Driver {
    /// Spawn the driver task with a default initial status
    pub fn spawn<P>(provider: P, mapper: TrackMapper) -> DriverChannels
    where
        P: Provider,
    {
        Self::spawn_with_status(provider, mapper, VehicleStatus::default())
    }

    /// Spawn the driver task, publishing `status` until the vehicle reports
    /// otherwise
    pub fn spawn_with_status<P>(provider: P, mapper: TrackMapper, status: VehicleStatus) -> DriverChannels
    where
        P: Provider,
    {
        let (map_tx, map_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(status.clone());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let cancel = CancellationToken::new();

        let task = MappingTask { mapper, status, map_tx, status_tx };
        let cancel_task = cancel.clone();
        tokio::spawn(async move {
            task.run(provider, command_rx, cancel_task).await;
        });

        DriverChannels { maps: map_rx, status: status_rx, commands: command_tx, cancel }
    }
}

struct MappingTask {
    mapper: TrackMapper,
    status: VehicleStatus,
    map_tx: watch::Sender<Option<Arc<TrackSnapshot>>>,
    status_tx: watch::Sender<VehicleStatus>,
}

impl MappingTask {
    async fn run<P>(mut self, mut provider: P, mut commands: mpsc::Receiver<DriverCommand>, cancel: CancellationToken)
    where
        P: Provider,
    {
        info!(source = provider.source(), "Mapping task started");
        let mut notification_count = 0u64;
        let mut error_count = 0u32;
        let mut commands_open = true;

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Mapping task cancelled");
                    break;
                }
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => commands_open = false,
                    }
                    continue;
                }
                result = provider.next_notification() => result,
            };

            match result {
                Ok(Some(notification)) => {
                    notification_count += 1;
                    error_count = 0;

                    if !self.handle_notification(&notification) {
                        debug!("Map receivers dropped, shutting down");
                        break;
                    }
                }
                Ok(None) => {
                    info!(notifications = notification_count, "Provider stream ended");
                    self.status.stream_ended = true;
                    self.publish_status();
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    error!("Provider error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS {
                        error!("Too many provider errors, shutting down");
                        self.status.stream_ended = true;
                        self.publish_status();
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ... capped at 1.6s
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("Mapping task cancelled during backoff");
                            break;
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        info!(notifications = notification_count, pieces = self.mapper.pieces_applied(), "Mapping task ended");
    }

    fn handle_command(&mut self, command: DriverCommand) {
        match command {
            DriverCommand::ResetMap => {
                info!("Resetting track map on request");
                self.mapper.reset();
                self.publish_map();
            }
            DriverCommand::RestoreMap(grid) => {
                self.mapper.restore(grid);
                self.publish_map();
            }
            DriverCommand::MarkDone => {
                self.mapper.mark_done();
                self.publish_map();
            }
        }
    }

    /// Decode and apply one notification. Returns false once nobody is
    /// listening for maps.
    fn handle_notification(&mut self, notification: &Notification) -> bool {
        trace!(sequence = notification.sequence, len = notification.len(), "Notification");

        let message = match VehicleMessage::decode(&notification.data) {
            Ok(message) => message,
            Err(e) => {
                warn!(sequence = notification.sequence, "Dropping notification: {}", e);
                return true;
            }
        };
        debug!(?message, "Vehicle message");

        match message {
            VehicleMessage::PositionUpdate { location, piece_id, offset, speed, clockwise } => {
                self.status.piece_id = Some(piece_id);
                self.status.location = Some(location);
                self.status.speed = speed;
                self.status.clockwise = clockwise;
                self.status.road_offset = offset;
                self.status.delocalized = false;

                if piece_id == FINISH_PIECE_ID {
                    if let Some(lane_offset) = start_line_lane_offset(location) {
                        self.status.lane_offset = lane_offset;
                    }
                }

                if let Some(event) = message.position_event() {
                    match self.mapper.on_position(&event) {
                        None | Some(PieceOutcome::BeforeStart | PieceOutcome::AfterDone) => {}
                        Some(_) => {
                            if !self.publish_map() {
                                return false;
                            }
                        }
                    }
                }
            }
            VehicleMessage::Transition(event) => {
                self.mapper.on_transition(&event);
            }
            VehicleMessage::Delocalized => {
                warn!("Vehicle delocalized");
                self.status.delocalized = true;
            }
            VehicleMessage::OffsetUpdate(offset) => self.status.road_offset = offset,
            VehicleMessage::BatteryLevel(level) => self.status.battery_level = Some(level),
            VehicleMessage::Version(version) => self.status.firmware_version = Some(version),
            VehicleMessage::PingResponse | VehicleMessage::Unrecognized { .. } => {}
        }

        self.publish_status();
        true
    }

    fn publish_map(&mut self) -> bool {
        self.status.map_done = self.mapper.is_done();
        self.publish_status();
        self.map_tx.send(Some(Arc::new(self.mapper.snapshot()))).is_ok()
    }

    fn publish_status(&self) {
        let status = &self.status;
        self.status_tx.send_if_modified(|current| {
            if current == status {
                false
            } else {
                current.clone_from(status);
                true
            }
        });
    }
}
