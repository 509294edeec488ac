//! Sensor Fusion Engine.
//!
//! Synthesises the two passenger counters fitted to the vehicle from the
//! simulator's ground-truth onboard count, then fuses them into a single
//! validated count.
//!
//! - **IR** – infrared beam-break counter at the doors. Accurate to ±1 at low
//!   load but starts missing passengers as the aisle crowds.
//! - **Camera** – vision-based head counter. Its accuracy degrades with
//!   crowding and it tends to over-count, so its reading may exceed capacity
//!   by a small headroom.
//!
//! The fusion rule is evaluated in a fixed order:
//! ```text
//! |camera − ir| ≤ 2      → round(0.7 · camera + 0.3 · ir)
//! else true_count > 30   → camera
//! else                   → ir
//! ```
//! and the result is clamped to `[0, capacity]`.
//!
//! # Example
//!
//! ```rust
//! use busflow_perception::fusion::SensorFusionEngine;
//!
//! let engine = SensorFusionEngine::new(50);
//!
//! // Sensors agree: blend favouring the camera.
//! assert_eq!(engine.fuse(30, 30, 31), 31);
//! // Crowded and disagreeing: trust the camera.
//! assert_eq!(engine.fuse(45, 35, 44), 44);
//! // Quiet and disagreeing: trust the IR counter.
//! assert_eq!(engine.fuse(10, 11, 20), 11);
//! ```

use rand::Rng;
use tracing::trace;

/// Above this ground-truth count the IR counter may under-count by two and
/// the camera runs in its low-accuracy regime.
pub const CROWDING_THRESHOLD: u32 = 40;

/// Above this ground-truth count a disagreement is resolved in favour of the
/// camera, since the IR counter saturates.
pub const CAMERA_TRUST_THRESHOLD: u32 = 30;

/// Maximum `|camera − ir|` at which the two sensors are considered to agree.
pub const AGREEMENT_TOLERANCE: u32 = 2;

/// Weight of the camera reading in the agreement blend.
const CAMERA_WEIGHT: f64 = 0.7;

/// How far above capacity the camera is allowed to over-count.
const CAMERA_HEADROOM: u32 = 3;

// ────────────────────────────────────────────────────────────────────────────
// Output type
// ────────────────────────────────────────────────────────────────────────────

/// Both raw readings for one stop together with the fused estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReadings {
    pub ir_count: u32,
    pub camera_count: u32,
    pub validated_count: u32,
}

impl SensorReadings {
    /// Absolute difference between the two raw readings.
    pub fn mismatch(&self) -> u32 {
        self.ir_count.abs_diff(self.camera_count)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SensorFusionEngine
// ────────────────────────────────────────────────────────────────────────────

/// Produces noisy IR and camera readings for a vehicle of fixed capacity and
/// fuses them into a validated count.
///
/// Randomness is never drawn internally: every method that needs it takes the
/// caller's generator, so a seeded generator yields a repeatable sequence.
#[derive(Debug, Clone)]
pub struct SensorFusionEngine {
    capacity: u32,
}

impl SensorFusionEngine {
    /// Create an engine for a vehicle with the given passenger `capacity`.
    pub fn new(capacity: u32) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Simulate the IR counter.
    ///
    /// Adds integer noise from `{-2, -1, 0, 1}` when crowded, `{-1, 0, 1}`
    /// otherwise, clamped to `[0, capacity]`.
    pub fn ir_reading<R: Rng + ?Sized>(&self, true_count: u32, rng: &mut R) -> u32 {
        let noise: i64 = if true_count > CROWDING_THRESHOLD {
            rng.gen_range(-2..=1)
        } else {
            rng.gen_range(-1..=1)
        };
        (i64::from(true_count) + noise).clamp(0, i64::from(self.capacity)) as u32
    }

    /// Simulate the camera counter.
    ///
    /// An accuracy factor is drawn from `[0.85, 0.95]` when crowded, else
    /// `[0.90, 0.98]`. The noise magnitude is `round(true_count · (1 − accuracy))`
    /// and the reading is offset by a uniform draw from
    /// `[−magnitude, magnitude + 2]`, clamped to `[0, capacity + 3]`.
    pub fn camera_reading<R: Rng + ?Sized>(&self, true_count: u32, rng: &mut R) -> u32 {
        let accuracy: f64 = if true_count > CROWDING_THRESHOLD {
            rng.gen_range(0.85..=0.95)
        } else {
            rng.gen_range(0.90..=0.98)
        };
        let magnitude = (f64::from(true_count) * (1.0 - accuracy)).round() as i64;
        let noise = rng.gen_range(-magnitude..=magnitude + 2);
        let ceiling = i64::from(self.capacity.saturating_add(CAMERA_HEADROOM));
        (i64::from(true_count) + noise).clamp(0, ceiling) as u32
    }

    /// Fuse two readings into the validated count.
    ///
    /// Deterministic: the same `(true_count, ir, camera)` always yields the
    /// same result. See the module docs for the branch order.
    pub fn fuse(&self, true_count: u32, ir: u32, camera: u32) -> u32 {
        let fused = if ir.abs_diff(camera) <= AGREEMENT_TOLERANCE {
            (CAMERA_WEIGHT * f64::from(camera) + (1.0 - CAMERA_WEIGHT) * f64::from(ir)).round()
                as u32
        } else if true_count > CAMERA_TRUST_THRESHOLD {
            camera
        } else {
            ir
        };
        fused.min(self.capacity)
    }

    /// Synthesise both readings for `true_count` and fuse them.
    ///
    /// The IR reading is drawn before the camera reading.
    pub fn read<R: Rng + ?Sized>(&self, true_count: u32, rng: &mut R) -> SensorReadings {
        let ir_count = self.ir_reading(true_count, rng);
        let camera_count = self.camera_reading(true_count, rng);
        let validated_count = self.fuse(true_count, ir_count, camera_count);
        trace!(true_count, ir_count, camera_count, validated_count, "fused sensor readings");
        SensorReadings {
            ir_count,
            camera_count,
            validated_count,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
