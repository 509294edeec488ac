//! [`OccupancyClassifier`] – maps a validated passenger count to an
//! [`OccupancyStatus`] band and an overcrowding alert flag.
//!
//! The band boundaries are fractions of capacity owned by each classifier
//! instance, so a deployment can tune them without touching code.
//!
//! | Occupancy | Status |
//! |---|---|
//! | `< normal` | `UNDERCROWDED` |
//! | `[normal, nearly_full)` | `NORMAL` |
//! | `[nearly_full, overcrowded)` | `NEARLY_FULL` |
//! | `≥ overcrowded` | `OVERCROWDED` |

use busflow_types::{BusflowError, OccupancyStatus};
use serde::{Deserialize, Serialize};

/// Band boundaries as fractions of vehicle capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_normal")]
    pub normal: f64,
    #[serde(default = "default_nearly_full")]
    pub nearly_full: f64,
    #[serde(default = "default_overcrowded")]
    pub overcrowded: f64,
}

fn default_normal() -> f64 {
    0.4
}
fn default_nearly_full() -> f64 {
    0.6
}
fn default_overcrowded() -> f64 {
    0.8
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            normal: default_normal(),
            nearly_full: default_nearly_full(),
            overcrowded: default_overcrowded(),
        }
    }
}

impl Thresholds {
    /// Check `0 < normal < nearly_full < overcrowded ≤ 1`.
    pub fn validate(&self) -> Result<(), BusflowError> {
        let ordered = 0.0 < self.normal
            && self.normal < self.nearly_full
            && self.nearly_full < self.overcrowded
            && self.overcrowded <= 1.0;
        if ordered {
            Ok(())
        } else {
            Err(BusflowError::InvalidConfig(format!(
                "thresholds must satisfy 0 < normal < nearly_full < overcrowded <= 1 \
                 (got normal={}, nearly_full={}, overcrowded={})",
                self.normal, self.nearly_full, self.overcrowded
            )))
        }
    }
}

/// Result of classifying one validated count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub occupancy_percent: f64,
    pub status: OccupancyStatus,
    pub alert: bool,
}

/// Pure, stateless classifier over a fixed set of [`Thresholds`].
///
/// # Example
///
/// ```
/// use busflow_perception::classifier::{OccupancyClassifier, Thresholds};
/// use busflow_types::OccupancyStatus;
///
/// let classifier = OccupancyClassifier::new(Thresholds::default()).unwrap();
/// let c = classifier.classify(42, 50);
/// assert_eq!(c.status, OccupancyStatus::Overcrowded);
/// assert!(c.alert);
/// ```
#[derive(Debug, Clone)]
pub struct OccupancyClassifier {
    thresholds: Thresholds,
}

impl OccupancyClassifier {
    /// Create a classifier, rejecting thresholds that do not form four
    /// ordered bands.
    pub fn new(thresholds: Thresholds) -> Result<Self, BusflowError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// `validated / capacity × 100`. A zero capacity yields `0.0`.
    pub fn occupancy_percent(validated: u32, capacity: u32) -> f64 {
        if capacity == 0 {
            return 0.0;
        }
        f64::from(validated) / f64::from(capacity) * 100.0
    }

    /// Band for an occupancy percentage.
    ///
    /// Total over every `f64`: anything not below the overcrowded boundary
    /// (NaN included) is `OVERCROWDED`.
    pub fn status_for_percent(&self, occupancy_percent: f64) -> OccupancyStatus {
        // Compare as fractions so integer percentages hit the boundaries exactly.
        let fraction = occupancy_percent / 100.0;
        if fraction < self.thresholds.normal {
            OccupancyStatus::Undercrowded
        } else if fraction < self.thresholds.nearly_full {
            OccupancyStatus::Normal
        } else if fraction < self.thresholds.overcrowded {
            OccupancyStatus::NearlyFull
        } else {
            OccupancyStatus::Overcrowded
        }
    }

    /// Classify a validated count for a vehicle of `capacity`.
    pub fn classify(&self, validated: u32, capacity: u32) -> Classification {
        let occupancy_percent = Self::occupancy_percent(validated, capacity);
        let status = self.status_for_percent(occupancy_percent);
        Classification {
            occupancy_percent,
            status,
            alert: status == OccupancyStatus::Overcrowded,
        }
    }
}
