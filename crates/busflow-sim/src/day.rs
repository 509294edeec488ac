//! [`ServiceDay`] – the day-long orchestration loop.
//!
//! From the configured start hour the vehicle runs round trips: a forward leg
//! over the stop table followed by a backward leg over the reversed table,
//! both carrying the same trip number. Each stop visit advances the clock by
//! a travel-time draw, each leg end by a layover draw. A new trip is admitted
//! only while the clock is before the configured end hour; a trip already
//! under way always completes.
//!
//! Forward legs start with a small random passenger load. A backward leg
//! starts from whatever the forward leg left aboard; this is the only state
//! carried between legs.
//!
//! Per stop the pipeline is:
//!
//! ```text
//! TripSimulator ──true count──▶ SensorFusionEngine ──validated──▶ OccupancyClassifier
//!                                                                        │
//!                                              StopEvent ──▶ EventRecorder
//! ```

use busflow_perception::{OccupancyClassifier, SensorFusionEngine};
use busflow_types::{BusflowError, Direction, OccupancyStatus, StopEvent};
use chrono::{Duration, NaiveDateTime, Timelike};
use rand::Rng;
use tracing::{debug, info, info_span, warn};

use crate::config::SimulationConfig;
use crate::recorder::EventRecorder;
use crate::trip::{StopTransition, TripLeg, TripSimulator, VehicleState};

/// Totals for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaySummary {
    pub trips: u32,
    pub events: usize,
    /// Events whose alert flag was raised.
    pub alerts: usize,
    pub peak_validated: u32,
}

impl DaySummary {
    fn absorb(&mut self, event: &StopEvent) {
        self.events += 1;
        if event.alert {
            self.alerts += 1;
        }
        self.peak_validated = self.peak_validated.max(event.validated_count);
    }
}

/// A validated configuration together with the perception components built
/// from it.
///
/// # Example
///
/// ```rust
/// use busflow_sim::{MemoryRecorder, ServiceDay, SimRng, SimulationConfig};
///
/// let config = SimulationConfig { start_hour: 7, end_hour: 8, ..Default::default() };
/// let day = ServiceDay::new(config).unwrap();
///
/// let mut rng = SimRng::from_seed_u64(day.config().seed);
/// let mut recorder = MemoryRecorder::new();
/// let summary = day.run(&mut rng, &mut recorder).unwrap();
///
/// assert_eq!(summary.events, recorder.events().len());
/// assert!(recorder.events().iter().all(|e| e.validated_count <= 50));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDay {
    config: SimulationConfig,
    fusion: SensorFusionEngine,
    classifier: OccupancyClassifier,
}

impl ServiceDay {
    /// Validate `config` and build the per-run components.
    ///
    /// Returns [`BusflowError::InvalidConfig`] before anything is simulated
    /// when the configuration is unusable.
    pub fn new(config: SimulationConfig) -> Result<Self, BusflowError> {
        config.validate()?;
        let fusion = SensorFusionEngine::new(config.capacity);
        let classifier = OccupancyClassifier::new(config.thresholds)?;
        Ok(Self {
            config,
            fusion,
            classifier,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate the whole day, handing each stop event to `recorder` as soon
    /// as it is produced.
    ///
    /// Only recorder failures can end the run early.
    pub fn run<R, E>(&self, rng: &mut R, recorder: &mut E) -> Result<DaySummary, BusflowError>
    where
        R: Rng + ?Sized,
        E: EventRecorder + ?Sized,
    {
        let cfg = &self.config;
        let end = cfg.service_end();
        let mut clock = cfg.service_start();
        let mut summary = DaySummary::default();
        let mut previous_status: Option<OccupancyStatus> = None;

        info!(
            vehicle_id = %cfg.vehicle_id,
            start = %clock,
            end = %end,
            stops = cfg.stops.len(),
            "starting service day"
        );

        while clock < end {
            let trip_number = summary.trips + 1;
            let _span = info_span!("trip", trip_number).entered();
            info!(departure = %clock, "trip departing");

            let seed_load = cfg.initial_onboard.sample(rng);
            let mut vehicle = VehicleState::new(seed_load, cfg.capacity);

            for direction in [Direction::Forward, Direction::Backward] {
                let leg = TripLeg::new(direction, &cfg.stops);
                let mut sim = TripSimulator::new(leg, vehicle, &cfg.demand);

                while let Some(transition) = sim.step(clock.hour(), rng) {
                    let event = self.observe(clock, trip_number, direction, &transition, rng);

                    match status_change(previous_status, event.status) {
                        StatusChange::Unchanged => {}
                        StatusChange::EnteredOvercrowding => warn!(
                            stop = %event.stop_name,
                            occupancy_percent = event.occupancy_percent,
                            "overcrowding alert"
                        ),
                        StatusChange::Changed => info!(
                            stop = %event.stop_name,
                            status = %event.status,
                            "occupancy status changed"
                        ),
                    }
                    previous_status = Some(event.status);
                    debug!(
                        stop = %event.stop_name,
                        %direction,
                        boarding = event.boarding,
                        alighting = event.alighting,
                        true_count = event.true_count,
                        validated = event.validated_count,
                        "stop event"
                    );

                    recorder.record(&event)?;
                    summary.absorb(&event);
                    clock += minutes(cfg.travel_minutes.sample(rng));
                }

                vehicle = sim.into_vehicle();
                clock += minutes(cfg.layover_minutes.sample(rng));
            }

            summary.trips = trip_number;
        }

        recorder.flush()?;
        info!(
            trips = summary.trips,
            events = summary.events,
            alerts = summary.alerts,
            "service day complete"
        );
        Ok(summary)
    }

    /// Sense, fuse and classify the vehicle state after one stop visit.
    fn observe<R: Rng + ?Sized>(
        &self,
        timestamp: NaiveDateTime,
        trip_number: u32,
        direction: Direction,
        transition: &StopTransition<'_>,
        rng: &mut R,
    ) -> StopEvent {
        let true_count = transition.onboard_after;
        let readings = self.fusion.read(true_count, rng);
        let class = self
            .classifier
            .classify(readings.validated_count, self.config.capacity);

        StopEvent {
            timestamp,
            trip_number,
            direction,
            vehicle_id: self.config.vehicle_id.clone(),
            stop_name: transition.stop.name.clone(),
            latitude: transition.stop.latitude,
            longitude: transition.stop.longitude,
            boarding: transition.flow.boarding,
            alighting: transition.flow.alighting,
            ir_count: readings.ir_count,
            camera_count: readings.camera_count,
            validated_count: readings.validated_count,
            true_count,
            occupancy_percent: class.occupancy_percent,
            status: class.status,
            alert: class.alert,
            sensor_mismatch: readings.mismatch(),
        }
    }
}

fn minutes(m: u32) -> Duration {
    Duration::minutes(i64::from(m))
}

/// What the status log should report for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusChange {
    Unchanged,
    Changed,
    /// Logged at `warn`; raised once per entry into the band, while every
    /// overcrowded event still carries its own alert flag.
    EnteredOvercrowding,
}

fn status_change(previous: Option<OccupancyStatus>, next: OccupancyStatus) -> StatusChange {
    if previous == Some(next) {
        StatusChange::Unchanged
    } else if next == OccupancyStatus::Overcrowded {
        StatusChange::EnteredOvercrowding
    } else {
        StatusChange::Changed
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UniformRange;
    use crate::recorder::{JsonLinesRecorder, MemoryRecorder};
    use crate::rng::SimRng;

    fn run_day(config: SimulationConfig, seed: u64) -> (DaySummary, Vec<StopEvent>) {
        let day = ServiceDay::new(config).unwrap();
        let mut rng = SimRng::from_seed_u64(seed);
        let mut rec = MemoryRecorder::new();
        let summary = day.run(&mut rng, &mut rec).unwrap();
        (summary, rec.into_events())
    }

    #[test]
    fn every_event_respects_invariants() {
        let classifier = OccupancyClassifier::new(Default::default()).unwrap();
        for seed in 0..20 {
            let (_, events) = run_day(SimulationConfig::default(), seed);
            assert!(!events.is_empty());
            for e in &events {
                assert!(e.true_count <= 50);
                assert!(e.validated_count <= 50);
                assert!(e.ir_count <= 50);
                assert!(e.camera_count <= 53);
                assert_eq!(e.sensor_mismatch, e.ir_count.abs_diff(e.camera_count));
                assert_eq!(e.status, classifier.classify(e.validated_count, 50).status);
                assert_eq!(e.alert, e.status == OccupancyStatus::Overcrowded);
            }
        }
    }

    #[test]
    fn onboard_follows_flow_within_each_leg() {
        let cfg = SimulationConfig::default();
        let stops = cfg.stops.len();
        let (_, events) = run_day(cfg, 4);
        for leg in events.chunks(stops) {
            for pair in leg.windows(2) {
                let expected = (i64::from(pair[0].true_count) - i64::from(pair[1].alighting)
                    + i64::from(pair[1].boarding))
                .clamp(0, 50) as u32;
                assert_eq!(pair[1].true_count, expected);
            }
            let last = leg.last().unwrap();
            assert_eq!(last.boarding, 0);
            assert_eq!(last.true_count, 0);
        }
    }

    #[test]
    fn trips_run_forward_then_backward() {
        let cfg = SimulationConfig::default();
        let stops = cfg.stops.clone();
        let (summary, events) = run_day(cfg, 8);
        assert_eq!(events.len(), summary.trips as usize * stops.len() * 2);

        for (i, leg) in events.chunks(stops.len()).enumerate() {
            let trip_number = (i / 2) as u32 + 1;
            let direction = if i % 2 == 0 { Direction::Forward } else { Direction::Backward };
            assert!(leg.iter().all(|e| e.trip_number == trip_number));
            assert!(leg.iter().all(|e| e.direction == direction));
            let names: Vec<&str> = leg.iter().map(|e| e.stop_name.as_str()).collect();
            let mut expected: Vec<&str> = stops.iter().map(|s| s.name.as_str()).collect();
            if direction == Direction::Backward {
                expected.reverse();
            }
            assert_eq!(names, expected);
        }
    }

    #[test]
    fn backward_leg_starts_from_forward_end() {
        // The forward leg always ends empty, so the backward leg's first
        // stop carries exactly the passengers who boarded there.
        let cfg = SimulationConfig::default();
        let stops = cfg.stops.len();
        let (_, events) = run_day(cfg, 15);
        for leg in events.chunks(stops).skip(1).step_by(2) {
            let first = &leg[0];
            assert_eq!(first.direction, Direction::Backward);
            assert_eq!(first.alighting, 0);
            assert_eq!(first.true_count, first.boarding);
        }
    }

    #[test]
    fn clock_advances_and_stops_admitting_trips_at_end_hour() {
        let cfg = SimulationConfig::default();
        let start = cfg.service_start();
        let end = cfg.service_end();
        let stops = cfg.stops.len();
        let (_, events) = run_day(cfg, 2);

        assert_eq!(events[0].timestamp, start);
        for pair in events.windows(2) {
            let gap = pair[1].timestamp - pair[0].timestamp;
            assert!(gap >= Duration::minutes(3) && gap <= Duration::minutes(15));
        }
        for trip in events.chunks(stops * 2) {
            assert!(trip[0].timestamp < end);
        }
    }

    #[test]
    fn short_window_still_completes_a_whole_trip() {
        let cfg = SimulationConfig {
            start_hour: 22,
            end_hour: 23,
            ..Default::default()
        };
        let (summary, events) = run_day(cfg, 6);
        assert!(summary.trips >= 1);
        assert_eq!(events.len() % 12, 0);
    }

    #[test]
    fn same_seed_reproduces_the_day() {
        let (a_summary, a) = run_day(SimulationConfig::default(), 42);
        let (b_summary, b) = run_day(SimulationConfig::default(), 42);
        assert_eq!(a_summary, b_summary);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_produce_different_days() {
        let (_, a) = run_day(SimulationConfig::default(), 1);
        let (_, b) = run_day(SimulationConfig::default(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn summary_matches_events() {
        let (summary, events) = run_day(SimulationConfig::default(), 77);
        assert_eq!(summary.events, events.len());
        assert_eq!(summary.alerts, events.iter().filter(|e| e.alert).count());
        assert_eq!(
            summary.peak_validated,
            events.iter().map(|e| e.validated_count).max().unwrap()
        );
    }

    #[test]
    fn small_vehicle_never_exceeds_capacity() {
        let cfg = SimulationConfig {
            capacity: 8,
            initial_onboard: UniformRange::new(2, 6),
            ..Default::default()
        };
        for seed in 0..10 {
            let (_, events) = run_day(cfg.clone(), seed);
            assert!(events.iter().all(|e| e.true_count <= 8 && e.validated_count <= 8));
        }
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let cfg = SimulationConfig {
            capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            ServiceDay::new(cfg),
            Err(BusflowError::InvalidConfig(_))
        ));
    }

    #[test]
    fn json_recorder_receives_every_event() {
        let day = ServiceDay::new(SimulationConfig::default()).unwrap();
        let mut rng = SimRng::from_seed_u64(3);
        let mut rec = JsonLinesRecorder::new(Vec::new());
        let summary = day.run(&mut rng, &mut rec).unwrap();
        assert_eq!(rec.written(), summary.events);
        let out = String::from_utf8(rec.into_inner()).unwrap();
        assert_eq!(out.lines().count(), summary.events);
    }

    #[test]
    fn overcrowding_alert_logged_once_per_entry() {
        use OccupancyStatus::*;
        let statuses = [
            Normal,
            NearlyFull,
            Overcrowded,
            Overcrowded,
            Overcrowded,
            NearlyFull,
            Overcrowded,
        ];

        let mut previous = None;
        let changes: Vec<StatusChange> = statuses
            .iter()
            .map(|&status| {
                let change = status_change(previous, status);
                previous = Some(status);
                change
            })
            .collect();

        assert_eq!(
            changes,
            vec![
                StatusChange::Changed,
                StatusChange::Changed,
                StatusChange::EnteredOvercrowding,
                StatusChange::Unchanged,
                StatusChange::Unchanged,
                StatusChange::Changed,
                StatusChange::EnteredOvercrowding,
            ]
        );
    }

    #[test]
    fn first_event_always_reports_its_status() {
        assert_eq!(status_change(None, OccupancyStatus::Undercrowded), StatusChange::Changed);
        assert_eq!(
            status_change(None, OccupancyStatus::Overcrowded),
            StatusChange::EnteredOvercrowding
        );
    }

    #[test]
    fn alert_flags_outnumber_alert_logs_during_a_crowded_run() {
        // A tiny bus stays overcrowded across consecutive stops: each event is
        // flagged, but the warning only fires on entry into the band.
        let cfg = SimulationConfig {
            capacity: 4,
            initial_onboard: UniformRange::new(4, 4),
            ..Default::default()
        };
        let (summary, events) = run_day(cfg, 12);

        let mut previous = None;
        let mut entries = 0;
        for e in &events {
            if status_change(previous, e.status) == StatusChange::EnteredOvercrowding {
                entries += 1;
            }
            previous = Some(e.status);
        }
        assert!(entries > 0);
        assert!(entries < summary.alerts);
    }

    #[test]
    fn stalled_clock_config_fails_before_running() {
        let cfg = SimulationConfig {
            travel_minutes: UniformRange::new(0, 0),
            layover_minutes: UniformRange::new(0, 0),
            ..Default::default()
        };
        assert!(matches!(
            ServiceDay::new(cfg),
            Err(BusflowError::InvalidConfig(_))
        ));
    }

    struct FailAfter(usize);

    impl EventRecorder for FailAfter {
        fn record(&mut self, _event: &StopEvent) -> Result<(), BusflowError> {
            if self.0 == 0 {
                return Err(BusflowError::Recorder("sink closed".to_string()));
            }
            self.0 -= 1;
            Ok(())
        }
    }

    #[test]
    fn recorder_failure_aborts_run() {
        let day = ServiceDay::new(SimulationConfig::default()).unwrap();
        let mut rng = SimRng::from_seed_u64(3);
        let mut rec = FailAfter(5);
        let err = day.run(&mut rng, &mut rec).unwrap_err();
        assert!(err.to_string().contains("sink closed"));
    }
}
