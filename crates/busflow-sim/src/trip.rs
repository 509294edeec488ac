//! [`TripSimulator`] – stop-by-stop passenger flow for one leg.
//!
//! A leg visits its stops in order and, at each one, decides how many
//! passengers alight and board. Every random draw is taken from a range that
//! has already been bounded by the vehicle's free space, so the onboard count
//! can never leave `[0, capacity]`.
//!
//! | Stop | Alighting | Boarding |
//! |---|---|---|
//! | first | 0 | draw in `[base − 5, base + 5]`, clamped to `[1, capacity − onboard]` |
//! | interior | draw in `[2, min(10, onboard)]` (or `[0, onboard]` when `onboard ≤ 2`) | draw in `[max(0, base − 8), min(base + 8, available)]` |
//! | last | everyone | 0 |
//!
//! `base` is the stop's demand-scaled passenger count for the current hour,
//! see [`DemandProfile::base_passengers`].
//!
//! # Example
//!
//! ```rust
//! use busflow_sim::demand::DemandProfile;
//! use busflow_sim::rng::SimRng;
//! use busflow_sim::trip::{TripLeg, TripSimulator, VehicleState};
//! use busflow_types::{Direction, Stop};
//!
//! let route = vec![
//!     Stop::new("Colombo Fort", 6.9271, 79.8612, 35),
//!     Stop::new("Borella", 6.9146, 79.8779, 30),
//!     Stop::new("Nugegoda", 6.8649, 79.8997, 15),
//! ];
//! let demand = DemandProfile::default();
//! let mut rng = SimRng::from_seed_u64(7);
//!
//! let leg = TripLeg::new(Direction::Forward, &route);
//! let mut sim = TripSimulator::new(leg, VehicleState::new(10, 50), &demand);
//! while let Some(transition) = sim.step(8, &mut rng) {
//!     assert!(transition.onboard_after <= 50);
//! }
//! assert_eq!(sim.vehicle().onboard(), 0);
//! ```

use busflow_types::{Direction, Stop};
use rand::Rng;

use crate::demand::DemandProfile;

/// Half-width of the first-stop boarding window around `base`.
const FIRST_STOP_SPREAD: i64 = 5;
/// Half-width of the interior-stop boarding window around `base`.
const INTERIOR_STOP_SPREAD: u32 = 8;
/// Alighting draw bounds at interior stops once more than two are aboard.
const MIN_INTERIOR_ALIGHTING: u32 = 2;
const MAX_INTERIOR_ALIGHTING: u32 = 10;

// ────────────────────────────────────────────────────────────────────────────
// VehicleState
// ────────────────────────────────────────────────────────────────────────────

/// Onboard passenger count of a vehicle with fixed capacity.
///
/// Invariant: `onboard ≤ capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleState {
    onboard: u32,
    capacity: u32,
}

impl VehicleState {
    /// Create a vehicle state; `onboard` is capped at `capacity`.
    pub fn new(onboard: u32, capacity: u32) -> Self {
        Self {
            onboard: onboard.min(capacity),
            capacity,
        }
    }

    pub fn onboard(&self) -> u32 {
        self.onboard
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Seats and standing room still available.
    pub fn free_space(&self) -> u32 {
        self.capacity - self.onboard
    }

    /// `onboard ← clamp(onboard − alighting + boarding, 0, capacity)`.
    ///
    /// Returns the new onboard count.
    pub fn apply(&mut self, alighting: u32, boarding: u32) -> u32 {
        let next = i64::from(self.onboard) - i64::from(alighting) + i64::from(boarding);
        self.onboard = next.clamp(0, i64::from(self.capacity)) as u32;
        self.onboard
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TripLeg
// ────────────────────────────────────────────────────────────────────────────

/// One directional pass over the route.
#[derive(Debug, Clone)]
pub struct TripLeg<'r> {
    direction: Direction,
    stops: Vec<&'r Stop>,
}

impl<'r> TripLeg<'r> {
    /// Build a leg over `route`: in table order when travelling forward,
    /// reversed when travelling backward.
    pub fn new(direction: Direction, route: &'r [Stop]) -> Self {
        let stops = match direction {
            Direction::Forward => route.iter().collect(),
            Direction::Backward => route.iter().rev().collect(),
        };
        Self { direction, stops }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn stops(&self) -> &[&'r Stop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Passenger flow rules
// ────────────────────────────────────────────────────────────────────────────

/// Position of a stop within its leg; selects the flow rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    First,
    Interior,
    Last,
}

impl StopKind {
    /// Kind of the stop at `index` in a leg of `len` stops.
    ///
    /// A single-stop leg is treated as its first stop.
    pub fn at(index: usize, len: usize) -> Self {
        if index == 0 {
            StopKind::First
        } else if index + 1 >= len {
            StopKind::Last
        } else {
            StopKind::Interior
        }
    }
}

/// Passengers leaving and entering at one stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassengerFlow {
    pub boarding: u32,
    pub alighting: u32,
}

/// Decide alighting and boarding at a stop of `kind` given the demand-scaled
/// `base` count and the vehicle's state on arrival.
pub fn passenger_flow<R: Rng + ?Sized>(
    kind: StopKind,
    base: u32,
    vehicle: &VehicleState,
    rng: &mut R,
) -> PassengerFlow {
    match kind {
        StopKind::First => {
            let base = i64::from(base);
            let draw = rng.gen_range(base - FIRST_STOP_SPREAD..=base + FIRST_STOP_SPREAD);
            // Lower bound wins over free space; the apply() clamp absorbs it.
            let boarding = draw.min(i64::from(vehicle.free_space())).max(1) as u32;
            PassengerFlow {
                boarding,
                alighting: 0,
            }
        }
        StopKind::Last => PassengerFlow {
            boarding: 0,
            alighting: vehicle.onboard(),
        },
        StopKind::Interior => {
            let onboard = vehicle.onboard();
            let alighting = if onboard > MIN_INTERIOR_ALIGHTING {
                rng.gen_range(MIN_INTERIOR_ALIGHTING..=onboard.min(MAX_INTERIOR_ALIGHTING))
            } else if onboard > 0 {
                rng.gen_range(0..=onboard)
            } else {
                0
            };
            let available = vehicle.free_space() + alighting;
            let low = base.saturating_sub(INTERIOR_STOP_SPREAD);
            let high = base.saturating_add(INTERIOR_STOP_SPREAD).min(available);
            let boarding = if low > high {
                // Degenerate window: fill what fits, no re-draw.
                available.min(base)
            } else {
                rng.gen_range(low..=high)
            };
            PassengerFlow {
                boarding,
                alighting,
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TripSimulator
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of visiting one stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopTransition<'r> {
    pub stop: &'r Stop,
    /// Position of the stop within the leg.
    pub index: usize,
    pub kind: StopKind,
    pub flow: PassengerFlow,
    pub onboard_before: u32,
    pub onboard_after: u32,
}

/// Steps a vehicle through the stops of one [`TripLeg`].
///
/// The simulator owns the leg's [`VehicleState`] until the leg ends; call
/// [`TripSimulator::into_vehicle`] to hand the final state to the next leg.
#[derive(Debug)]
pub struct TripSimulator<'r> {
    leg: TripLeg<'r>,
    vehicle: VehicleState,
    demand: &'r DemandProfile,
    next_index: usize,
}

impl<'r> TripSimulator<'r> {
    pub fn new(leg: TripLeg<'r>, vehicle: VehicleState, demand: &'r DemandProfile) -> Self {
        Self {
            leg,
            vehicle,
            demand,
            next_index: 0,
        }
    }

    pub fn direction(&self) -> Direction {
        self.leg.direction()
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    /// `true` once every stop of the leg has been visited.
    pub fn is_finished(&self) -> bool {
        self.next_index >= self.leg.len()
    }

    /// Visit the next stop at the given `hour` of day.
    ///
    /// Returns `None` once the leg is finished.
    pub fn step<R: Rng + ?Sized>(&mut self, hour: u32, rng: &mut R) -> Option<StopTransition<'r>> {
        let index = self.next_index;
        let stop = *self.leg.stops().get(index)?;
        let kind = StopKind::at(index, self.leg.len());
        let base = self.demand.base_passengers(stop, hour);

        let onboard_before = self.vehicle.onboard();
        let flow = passenger_flow(kind, base, &self.vehicle, rng);
        let onboard_after = self.vehicle.apply(flow.alighting, flow.boarding);
        self.next_index += 1;

        Some(StopTransition {
            stop,
            index,
            kind,
            flow,
            onboard_before,
            onboard_after,
        })
    }

    /// End the leg and release the vehicle state.
    pub fn into_vehicle(self) -> VehicleState {
        self.vehicle
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
