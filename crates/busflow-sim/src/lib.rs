//! `busflow-sim` – synthetic passenger flow for a transit vehicle.
//!
//! Generates a full service day of stop events whose passenger counts are
//! physically consistent (never negative, never above capacity) and
//! reproducible from a single seed.
//!
//! # Modules
//!
//! - [`demand`] – [`DemandProfile`][demand::DemandProfile]: hour of day →
//!   demand multiplier applied to each stop's baseline passenger count.
//! - [`trip`] – [`TripSimulator`][trip::TripSimulator]: steps a
//!   [`VehicleState`][trip::VehicleState] through one
//!   [`TripLeg`][trip::TripLeg], producing bounded boarding and alighting
//!   counts per stop.
//! - [`day`] – [`ServiceDay`][day::ServiceDay]: runs forward/backward round
//!   trips from the start hour to the end hour, fuses and classifies each
//!   stop through `busflow-perception`, and emits
//!   [`StopEvent`][busflow_types::StopEvent]s.
//! - [`recorder`] – [`EventRecorder`][recorder::EventRecorder]: the seam
//!   through which events leave the simulator.
//! - [`config`] – [`SimulationConfig`][config::SimulationConfig]: every
//!   tunable of a run, validated before anything is simulated.
//! - [`rng`] – [`SimRng`][rng::SimRng]: the seedable generator passed to
//!   every randomised step.

pub mod config;
pub mod day;
pub mod demand;
pub mod recorder;
pub mod rng;
pub mod trip;

pub use config::{SimulationConfig, UniformRange};
pub use day::{DaySummary, ServiceDay};
pub use demand::{DemandBand, DemandProfile};
pub use recorder::{EventRecorder, JsonLinesRecorder, MemoryRecorder};
pub use rng::SimRng;
pub use trip::{PassengerFlow, StopKind, StopTransition, TripLeg, TripSimulator, VehicleState};
