//! [`SimulationConfig`] – everything a service-day run needs, validated once
//! before any simulation starts.
//!
//! Every field has a serde default, so a partial configuration file (or an
//! empty one) yields the six-stop Colombo route 138 defaults.

use busflow_perception::Thresholds;
use busflow_types::{BusflowError, Stop};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::demand::DemandProfile;
use crate::rng::DEFAULT_SEED;

/// Inclusive `[min, max]` range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformRange {
    pub min: u32,
    pub max: u32,
}

impl UniformRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Uniform draw from `[min, max]`. Callers must have validated the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max)
    }

    fn validate(&self, what: &str) -> Result<(), BusflowError> {
        if self.min <= self.max {
            Ok(())
        } else {
            Err(BusflowError::InvalidConfig(format!(
                "{what} range is empty (min={} > max={})",
                self.min, self.max
            )))
        }
    }
}

/// Configuration for one simulated service day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Identifier stamped on every stop event.
    #[serde(default = "default_vehicle_id")]
    pub vehicle_id: String,

    /// Maximum passengers aboard.
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Seed for the run's random generator.
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_service_date")]
    pub service_date: NaiveDate,

    /// Hour of `service_date` at which the first trip departs.
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    /// No trip departs at or after this hour (24 = midnight).
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    /// Passengers already aboard when a forward leg departs.
    #[serde(default = "default_initial_onboard")]
    pub initial_onboard: UniformRange,

    /// Minutes between consecutive stops.
    #[serde(default = "default_travel_minutes")]
    pub travel_minutes: UniformRange,

    /// Minutes of layover after each leg.
    #[serde(default = "default_layover_minutes")]
    pub layover_minutes: UniformRange,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub demand: DemandProfile,

    #[serde(default = "default_stops")]
    pub stops: Vec<Stop>,
}

fn default_vehicle_id() -> String {
    "BUS-138-CMB".to_string()
}
fn default_capacity() -> u32 {
    50
}
fn default_seed() -> u64 {
    DEFAULT_SEED
}
fn default_service_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default()
}
fn default_start_hour() -> u32 {
    5
}
fn default_end_hour() -> u32 {
    23
}
fn default_initial_onboard() -> UniformRange {
    UniformRange::new(5, 15)
}
fn default_travel_minutes() -> UniformRange {
    UniformRange::new(3, 5)
}
fn default_layover_minutes() -> UniformRange {
    UniformRange::new(5, 10)
}
fn default_stops() -> Vec<Stop> {
    vec![
        Stop::new("Colombo Fort", 6.9271, 79.8612, 35),
        Stop::new("Pettah", 6.9356, 79.8487, 42),
        Stop::new("Maradana", 6.9287, 79.8631, 38),
        Stop::new("Borella", 6.9146, 79.8779, 30),
        Stop::new("Narahenpita", 6.9015, 79.8772, 25),
        Stop::new("Nugegoda", 6.8649, 79.8997, 15),
    ]
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            vehicle_id: default_vehicle_id(),
            capacity: default_capacity(),
            seed: default_seed(),
            service_date: default_service_date(),
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            initial_onboard: default_initial_onboard(),
            travel_minutes: default_travel_minutes(),
            layover_minutes: default_layover_minutes(),
            thresholds: Thresholds::default(),
            demand: DemandProfile::default(),
            stops: default_stops(),
        }
    }
}

impl SimulationConfig {
    /// Fail fast on any setting the simulator cannot honour.
    pub fn validate(&self) -> Result<(), BusflowError> {
        if self.capacity == 0 {
            return Err(BusflowError::InvalidConfig(
                "capacity must be positive".to_string(),
            ));
        }
        self.thresholds.validate()?;
        self.demand.validate()?;

        if self.stops.len() < 2 {
            return Err(BusflowError::InvalidConfig(format!(
                "route needs at least two stops (got {})",
                self.stops.len()
            )));
        }
        if let Some(stop) = self
            .stops
            .iter()
            .find(|s| !s.latitude.is_finite() || !s.longitude.is_finite())
        {
            return Err(BusflowError::InvalidConfig(format!(
                "stop {:?} has non-finite coordinates",
                stop.name
            )));
        }

        if self.start_hour >= self.end_hour || self.end_hour > 24 {
            return Err(BusflowError::InvalidConfig(format!(
                "service hours must satisfy start_hour < end_hour <= 24 (got {}..{})",
                self.start_hour, self.end_hour
            )));
        }

        self.initial_onboard.validate("initial_onboard")?;
        self.travel_minutes.validate("travel_minutes")?;
        self.layover_minutes.validate("layover_minutes")?;
        if self.initial_onboard.min > self.capacity {
            return Err(BusflowError::InvalidConfig(format!(
                "initial_onboard.min ({}) exceeds capacity ({})",
                self.initial_onboard.min, self.capacity
            )));
        }
        if self.travel_minutes.min == 0 && self.layover_minutes.min == 0 {
            return Err(BusflowError::InvalidConfig(
                "travel_minutes.min and layover_minutes.min cannot both be 0; \
                 the service clock must advance on every trip"
                    .to_string(),
            ));
        }

        // The last admitted trip may run past the end hour by one full round
        // trip; every instant it can reach must be representable.
        let trip_minutes = (self.stops.len() as u64)
            .saturating_mul(u64::from(self.travel_minutes.max))
            .saturating_add(u64::from(self.layover_minutes.max))
            .saturating_mul(2);
        let latest = i64::try_from(trip_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .zip(self.at_hour(self.end_hour))
            .and_then(|(trip, end)| end.checked_add_signed(trip));
        if latest.is_none() {
            return Err(BusflowError::InvalidConfig(format!(
                "service_date {} is out of range for a day ending at hour {}",
                self.service_date, self.end_hour
            )));
        }
        Ok(())
    }

    /// Departure time of the first trip.
    ///
    /// Saturates at [`NaiveDateTime::MAX`] for a date that [`validate`]
    /// would reject.
    ///
    /// [`validate`]: Self::validate
    pub fn service_start(&self) -> NaiveDateTime {
        self.at_hour(self.start_hour).unwrap_or(NaiveDateTime::MAX)
    }

    /// Trips are only admitted while the clock is before this instant.
    pub fn service_end(&self) -> NaiveDateTime {
        self.at_hour(self.end_hour).unwrap_or(NaiveDateTime::MAX)
    }

    fn at_hour(&self, hour: u32) -> Option<NaiveDateTime> {
        self.service_date
            .and_time(NaiveTime::MIN)
            .checked_add_signed(Duration::hours(i64::from(hour)))
    }
}
