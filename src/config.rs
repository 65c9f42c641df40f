//! Vehicle configuration loaded from YAML
//!
//! ```yaml
//! car_id: "c4:3a:5b:7e:21:9f"
//! car_name: Skull
//! start_lane: 2
//! mapping:
//!   unknown_pieces: advance
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::map::UnknownPiecePolicy;
use crate::{Result, TrackError};

/// Lane offsets from road center in mm for lanes 1 to 4, left to right.
const START_LANE_OFFSETS: [f32; 4] = [68.0, 23.0, -23.0, -68.0];

/// Per-vehicle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Bluetooth address or other transport identifier of the vehicle.
    pub car_id: String,

    #[serde(default)]
    pub car_name: Option<String>,

    /// Lane the vehicle starts in, 1 to 4.
    #[serde(default)]
    pub start_lane: Option<u8>,

    #[serde(default)]
    pub mapping: MappingConfig,
}

/// Settings for the track mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub unknown_pieces: UnknownPiecePolicy,
}

impl VehicleConfig {
    /// Config for a vehicle with every optional setting at its default.
    pub fn new(car_id: impl Into<String>) -> Self {
        Self { car_id: car_id.into(), car_name: None, start_lane: None, mapping: MappingConfig::default() }
    }

    /// Read and validate a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TrackError::file_error(path.to_path_buf(), e))?;
        let config = Self::from_yaml_str(&text)?;
        debug!(path = %path.display(), car_id = %config.car_id, "Loaded vehicle config");
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: VehicleConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| TrackError::parse_error("Vehicle config YAML", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.car_id.trim().is_empty() {
            return Err(TrackError::config_error("car_id must not be empty"));
        }
        match self.start_lane {
            Some(lane) if !(1..=4).contains(&lane) => {
                Err(TrackError::config_error(format!("start_lane must be 1 to 4, got {lane}")))
            }
            _ => Ok(()),
        }
    }

    /// Offset from road center of the configured start lane in mm, or 0.0
    /// when no lane is set.
    pub fn initial_lane_offset(&self) -> f32 {
        self.start_lane
            .and_then(|lane| START_LANE_OFFSETS.get(usize::from(lane).checked_sub(1)?).copied())
            .unwrap_or(0.0)
    }

    pub fn display_name(&self) -> &str {
        self.car_name.as_deref().unwrap_or(&self.car_id)
    }
}
