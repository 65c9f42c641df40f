//! Track topology reconstruction for Anki Overdrive vehicles.
//!
//! A vehicle driving around a modular track reports which piece it is on,
//! never where that piece sits. This crate decodes the vehicle's
//! notifications and rebuilds the track layout as a 2-D grid of tiles, one
//! cell per piece, ready to be rendered with a 25 entry tile palette.
//!
//! # Features
//!
//! - **Reconstruction**: cursor walk with curve turning, bridge stacking and
//!   loop closure at the second start line crossing
//! - **Decoding**: vehicle notifications into typed messages
//! - **Sources**: live notifications pushed from any Bluetooth transport, or
//!   recorded capture files replayed at any rate
//! - **Streams**: map and status snapshots over tokio watch channels
//!
//! ## Example (capture replay)
//!
//! ```rust,no_run
//! use overdrive::{Overdrive, UpdateRate};
//! use futures::StreamExt;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Overdrive::replay("/path/to/lap.capture").await?;
//!
//!     let mut maps = session.map_updates(UpdateRate::Max(2));
//!     if let Some(map) = maps.next().await {
//!         println!("{} pieces mapped", map.pieces_applied);
//!     }
//!
//!     let map = session.wait_until_done(Duration::from_secs(60)).await?;
//!     for row in map.render.rows() {
//!         println!("{row:?}");
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
pub mod map;
pub mod protocol;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Stream-based mapping architecture
pub mod driver;
pub mod provider;
pub mod providers;
pub mod session;
pub mod stream;

// Core exports
pub use config::{MappingConfig, VehicleConfig};
pub use error::*;
pub use map::{TrackMapper, TrackSnapshot, UnknownPiecePolicy};
pub use protocol::VehicleMessage;
pub use types::*;

// Main API exports
pub use driver::VehicleStatus;
pub use providers::NotificationSender;
pub use session::MappingSession;

/// Unified entry point for mapping sessions.
///
/// # Examples
///
/// ## Live vehicle
/// ```rust,no_run
/// use overdrive::{Overdrive, VehicleConfig};
///
/// #[tokio::main]
/// async fn main() -> overdrive::Result<()> {
///     let config = VehicleConfig::load("vehicle.yaml")?;
///     let (sender, session) = Overdrive::attach(&config, 256).await?;
///     // Call sender.try_send(bytes) from the transport's notification callback
///     Ok(())
/// }
/// ```
///
/// ## Capture replay
/// ```rust,no_run
/// use overdrive::Overdrive;
///
/// #[tokio::main]
/// async fn main() -> overdrive::Result<()> {
///     let session = Overdrive::replay("lap.capture").await?;
///     // Use session...
///     Ok(())
/// }
/// ```
pub struct Overdrive;

impl Overdrive {
    /// Start mapping a live vehicle.
    ///
    /// Returns the sender the transport pushes raw notifications into and the
    /// session observing the map. At most `capacity` notifications are queued
    /// before `try_send` starts failing.
    ///
    /// The future completes without waiting on the vehicle; it only needs a
    /// tokio runtime to spawn the driver task.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::Config` if the configuration is invalid.
    pub async fn attach(config: &VehicleConfig, capacity: usize) -> Result<(NotificationSender, MappingSession)> {
        MappingSession::attach(config, capacity).await
    }

    /// Replay a capture file with default vehicle settings.
    ///
    /// Completes once the capture is read. Await
    /// [`MappingSession::wait_until_done`] for the finished map.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File does not exist or is not readable
    /// - A line of the capture is not whitespace-separated hex bytes
    pub async fn replay<P: AsRef<std::path::Path>>(path: P) -> Result<MappingSession> {
        MappingSession::replay(path, &VehicleConfig::new("replay")).await
    }
}
