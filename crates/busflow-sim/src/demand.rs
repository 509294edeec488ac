//! Time-of-day passenger demand.
//!
//! A [`DemandProfile`] maps the hour of day to a multiplier applied to each
//! stop's baseline passenger count. Bands are checked in table order and the
//! first match wins, so overlapping bands resolve to the earlier entry (hour
//! 7 belongs to the morning rush, not the early-morning band).

use busflow_types::{BusflowError, Stop};
use serde::{Deserialize, Serialize};

/// An inclusive hour range `[start_hour, end_hour]` and its multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandBand {
    pub start_hour: u32,
    pub end_hour: u32,
    pub multiplier: f64,
}

impl DemandBand {
    pub const fn new(start_hour: u32, end_hour: u32, multiplier: f64) -> Self {
        Self {
            start_hour,
            end_hour,
            multiplier,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        (self.start_hour..=self.end_hour).contains(&hour)
    }
}

/// Hour → demand multiplier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandProfile {
    /// Multiplier for hours not covered by any band.
    #[serde(default = "default_multiplier")]
    pub default_multiplier: f64,
    #[serde(default = "default_bands")]
    pub bands: Vec<DemandBand>,
}

fn default_multiplier() -> f64 {
    0.3
}

fn default_bands() -> Vec<DemandBand> {
    vec![
        // morning rush
        DemandBand::new(7, 9, 1.5),
        // evening rush
        DemandBand::new(17, 19, 1.4),
        // midday
        DemandBand::new(11, 14, 0.8),
        // early morning
        DemandBand::new(5, 7, 0.6),
        // late evening
        DemandBand::new(20, 22, 0.4),
    ]
}

impl Default for DemandProfile {
    fn default() -> Self {
        Self {
            default_multiplier: default_multiplier(),
            bands: default_bands(),
        }
    }
}

impl DemandProfile {
    /// Demand multiplier for `hour`. Total over every hour value.
    pub fn multiplier(&self, hour: u32) -> f64 {
        self.bands
            .iter()
            .find(|band| band.contains(hour))
            .map_or(self.default_multiplier, |band| band.multiplier)
    }

    /// `max(1, floor(stop.avg_passengers × multiplier(hour)))`.
    pub fn base_passengers(&self, stop: &Stop, hour: u32) -> u32 {
        let scaled = (f64::from(stop.avg_passengers) * self.multiplier(hour)).floor();
        (scaled as u32).max(1)
    }

    pub fn validate(&self) -> Result<(), BusflowError> {
        check_multiplier("default_multiplier", self.default_multiplier)?;
        for (i, band) in self.bands.iter().enumerate() {
            if band.start_hour > band.end_hour || band.end_hour > 23 {
                return Err(BusflowError::InvalidConfig(format!(
                    "demand band {i} covers hours {}..={}, expected start <= end <= 23",
                    band.start_hour, band.end_hour
                )));
            }
            check_multiplier(&format!("demand band {i} multiplier"), band.multiplier)?;
        }
        Ok(())
    }
}

fn check_multiplier(what: &str, value: f64) -> Result<(), BusflowError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(BusflowError::InvalidConfig(format!(
            "{what} must be a finite non-negative number (got {value})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_hour() {
        let profile = DemandProfile::default();
        let expected = [
            0.3, 0.3, 0.3, 0.3, 0.3, // 00–04
            0.6, 0.6, // 05–06
            1.5, 1.5, 1.5, // 07–09
            0.3, // 10
            0.8, 0.8, 0.8, 0.8, // 11–14
            0.3, 0.3, // 15–16
            1.4, 1.4, 1.4, // 17–19
            0.4, 0.4, 0.4, // 20–22
            0.3, // 23
        ];
        for (hour, want) in expected.iter().enumerate() {
            assert_eq!(profile.multiplier(hour as u32), *want, "hour {hour}");
        }
    }

    #[test]
    fn overlapping_hour_resolves_to_first_band() {
        assert_eq!(DemandProfile::default().multiplier(7), 1.5);
    }

    #[test]
    fn out_of_range_hour_falls_back_to_default() {
        assert_eq!(DemandProfile::default().multiplier(99), 0.3);
    }

    #[test]
    fn base_passengers_floors_and_never_drops_below_one() {
        let profile = DemandProfile::default();
        let pettah = Stop::new("Pettah", 6.9356, 79.8487, 42);
        // 42 * 1.5 = 63
        assert_eq!(profile.base_passengers(&pettah, 8), 63);
        // 42 * 0.3 = 12.6 → 12
        assert_eq!(profile.base_passengers(&pettah, 2), 12);

        let quiet = Stop::new("Depot", 0.0, 0.0, 2);
        // 2 * 0.3 = 0.6 → 0 → 1
        assert_eq!(profile.base_passengers(&quiet, 23), 1);
    }

    #[test]
    fn default_profile_is_valid() {
        assert!(DemandProfile::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_bands() {
        let mut profile = DemandProfile::default();
        profile.bands.push(DemandBand::new(22, 24, 1.0));
        assert!(profile.validate().is_err());

        let mut profile = DemandProfile::default();
        profile.bands.push(DemandBand::new(9, 8, 1.0));
        assert!(profile.validate().is_err());

        let mut profile = DemandProfile::default();
        profile.bands[0].multiplier = -0.5;
        assert!(profile.validate().is_err());

        let profile = DemandProfile {
            default_multiplier: f64::INFINITY,
            bands: vec![],
        };
        assert!(profile.validate().is_err());
    }
}
