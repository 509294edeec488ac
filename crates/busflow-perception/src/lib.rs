//! `busflow-perception` – onboard passenger sensing.
//!
//! Turns the simulator's ground-truth occupancy into what the vehicle would
//! actually observe, and into the status shown to operators.
//!
//! # Modules
//!
//! - [`fusion`] – [`SensorFusionEngine`][fusion::SensorFusionEngine]:
//!   synthesises noisy infrared and camera passenger counts and fuses them
//!   into a validated count with a fixed tie-break order.
//! - [`classifier`] – [`OccupancyClassifier`][classifier::OccupancyClassifier]:
//!   maps a validated count to one of four occupancy bands and an
//!   overcrowding alert flag.

pub mod classifier;
pub mod fusion;

pub use classifier::{Classification, OccupancyClassifier, Thresholds};
pub use fusion::{SensorFusionEngine, SensorReadings};
