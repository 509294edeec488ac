use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fixed point on the route where passengers board and alight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Typical number of passengers waiting at this stop before the
    /// time-of-day multiplier is applied.
    pub avg_passengers: u32,
}

impl Stop {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, avg_passengers: u32) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            avg_passengers,
        }
    }
}

/// Direction of travel along the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// First stop of the stop table to last.
    Forward,
    /// Last stop of the stop table back to the first.
    Backward,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "Forward"),
            Direction::Backward => write!(f, "Backward"),
        }
    }
}

/// Occupancy band derived from the validated passenger count.
///
/// The four bands partition `[0, ∞)` percent of capacity and never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OccupancyStatus {
    Undercrowded,
    Normal,
    NearlyFull,
    Overcrowded,
}

impl std::fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OccupancyStatus::Undercrowded => write!(f, "UNDERCROWDED"),
            OccupancyStatus::Normal => write!(f, "NORMAL"),
            OccupancyStatus::NearlyFull => write!(f, "NEARLY_FULL"),
            OccupancyStatus::Overcrowded => write!(f, "OVERCROWDED"),
        }
    }
}

/// One record per stop visit: passenger flow, both raw sensor readings, the
/// fused estimate and its classification.
///
/// Created once when the vehicle leaves a stop and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopEvent {
    pub timestamp: NaiveDateTime,
    pub trip_number: u32,
    pub direction: Direction,
    /// e.g. "BUS-138-CMB"
    pub vehicle_id: String,
    pub stop_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub boarding: u32,
    pub alighting: u32,
    pub ir_count: u32,
    pub camera_count: u32,
    pub validated_count: u32,
    /// Ground-truth onboard count after the stop, as produced by the simulator.
    pub true_count: u32,
    /// `validated_count / capacity × 100`, stored unrounded; round when
    /// presenting.
    pub occupancy_percent: f64,
    pub status: OccupancyStatus,
    pub alert: bool,
    /// `|camera_count − ir_count|`; diagnostic only.
    pub sensor_mismatch: u32,
}

/// Error type shared by every busflow crate.
///
/// The simulator itself cannot fail; errors come from configuration
/// validation at startup, from reading and writing configuration files, and
/// from the recorder that consumes the event stream.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum BusflowError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Recorder Error: {0}")]
    Recorder(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("I/O Error: {0}")]
    Io(String),
}
