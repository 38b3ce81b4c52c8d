//! Trajectory synthesis and time-based lookup.
//!
//! A trajectory is built phase by phase (taxi, takeoff, hover, auto) from a
//! waypoint list and a [`FlightProfile`]. The result is fully materialized;
//! lookups interpolate linearly between consecutive samples.

use crate::geo::GeoProjector;
use crate::models::{FlightPhase, Position3, TrajectorySample, Waypoint};
use crate::rules::FlightProfile;
use serde::{Deserialize, Serialize};

/// Delay between the taxi sample and the start of the climb.
pub const TAKEOFF_START_S: f64 = 2.0;
/// Number of samples emitted for the climb.
pub const TAKEOFF_SAMPLES: usize = 20;
/// Segments longer than this are subdivided.
pub const INTERPOLATION_SPACING_M: f64 = 10.0;

/// Time-ordered samples for one agent.
///
/// Sample times must be non-decreasing. This is guaranteed for anything
/// produced by [`TrajectorySynthesizer`] and is assumed, not checked, by
/// the lookup methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
}

impl Trajectory {
    pub fn new(samples: Vec<TrajectorySample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&TrajectorySample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }

    /// Mission time of the final sample.
    pub fn end_time(&self) -> Option<f64> {
        self.samples.last().map(|sample| sample.time)
    }

    /// Sample at time `t`, clamped to the first/last sample outside the
    /// covered range and linearly interpolated inside it.
    ///
    /// Interpolated samples take their phase from the earlier bracket and
    /// carry no waypoint index. A NaN time has no position.
    pub fn position_at(&self, t: f64) -> Option<TrajectorySample> {
        if t.is_nan() {
            return None;
        }
        let first = self.samples.first()?;
        let last = self.samples.last()?;

        if t >= last.time {
            return Some(*last);
        }
        if t <= first.time {
            return Some(*first);
        }

        // first.time < t < last.time, so 1 <= upper < len
        let upper = self.samples.partition_point(|sample| sample.time <= t);
        let current = &self.samples[upper - 1];
        let next = &self.samples[upper];

        if current.time == t {
            return Some(*current);
        }

        let span = next.time - current.time;
        if span <= 0.0 {
            return Some(*current);
        }

        let ratio = (t - current.time) / span;
        Some(TrajectorySample {
            position: current.position.lerp(&next.position, ratio),
            time: t,
            phase: current.phase,
            waypoint_index: None,
        })
    }

    /// Waypoint index of the indexed sample closest in time to `t`.
    ///
    /// Interpolation samples are ignored; the first sample wins ties.
    pub fn nearest_waypoint_index(&self, t: f64) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for sample in &self.samples {
            let Some(index) = sample.waypoint_index else {
                continue;
            };
            let diff = (sample.time - t).abs();
            let replace = best.map(|(best_diff, _)| diff < best_diff).unwrap_or(true);
            if replace {
                best = Some((diff, index));
            }
        }
        best.map(|(_, index)| index)
    }
}

/// Builds dense trajectories from waypoint lists.
pub struct TrajectorySynthesizer<'a> {
    projector: &'a GeoProjector,
    profile: &'a FlightProfile,
}

impl<'a> TrajectorySynthesizer<'a> {
    pub fn new(projector: &'a GeoProjector, profile: &'a FlightProfile) -> Self {
        Self { projector, profile }
    }

    /// Synthesize the full trajectory for one agent.
    ///
    /// Returns an empty trajectory for fewer than two waypoints or a
    /// non-positive cruise speed.
    pub fn synthesize(&self, waypoints: &[Waypoint]) -> Trajectory {
        if waypoints.len() < 2 {
            tracing::debug!(
                "Skipping trajectory synthesis for {} waypoint(s)",
                waypoints.len()
            );
            return Trajectory::default();
        }
        if !(self.profile.cruise_speed_mps > 0.0) {
            tracing::warn!(
                "Cruise speed {} m/s is not positive, no trajectory generated",
                self.profile.cruise_speed_mps
            );
            return Trajectory::default();
        }

        let home = &waypoints[0];
        let (home_x, home_y) = self.projector.to_local(home.lat, home.lon);

        let taxi = self.taxi(home_x, home_y);
        let takeoff = self.takeoff(home_x, home_y);
        let takeoff_end = TAKEOFF_START_S + self.profile.climb_duration_s;
        let hover = self.hover(home_x, home_y, takeoff_end);
        let hover_end = takeoff_end + self.profile.hover_time_s;
        let start = Position3::new(home_x, home_y, self.profile.takeoff_altitude_m);
        let auto = self.auto(waypoints, start, hover_end);

        let mut samples =
            Vec::with_capacity(taxi.len() + takeoff.len() + hover.len() + auto.len());
        samples.extend(taxi);
        samples.extend(takeoff);
        samples.extend(hover);
        samples.extend(auto);

        let trajectory = Trajectory::new(samples);
        tracing::debug!(
            "Synthesized trajectory: {} samples, {:.1}s",
            trajectory.len(),
            trajectory.end_time().unwrap_or(0.0)
        );
        trajectory
    }

    fn taxi(&self, x: f64, y: f64) -> Vec<TrajectorySample> {
        vec![TrajectorySample::new(
            Position3::new(x, y, 0.0),
            0.0,
            FlightPhase::Taxi,
            Some(0),
        )]
    }

    fn takeoff(&self, x: f64, y: f64) -> Vec<TrajectorySample> {
        let climb = self.profile.climb_duration_s;
        let altitude = self.profile.takeoff_altitude_m;
        let last = (TAKEOFF_SAMPLES - 1) as f64;

        (0..TAKEOFF_SAMPLES)
            .map(|i| {
                let progress = i as f64 / last;
                let time = TAKEOFF_START_S + climb * progress;
                let index = if i < TAKEOFF_SAMPLES / 2 { 0 } else { 1 };
                TrajectorySample::new(
                    Position3::new(x, y, progress * altitude),
                    time,
                    FlightPhase::Takeoff,
                    Some(index),
                )
            })
            .collect()
    }

    fn hover(&self, x: f64, y: f64, takeoff_end: f64) -> Vec<TrajectorySample> {
        vec![TrajectorySample::new(
            Position3::new(x, y, self.profile.takeoff_altitude_m),
            takeoff_end + self.profile.hover_time_s,
            FlightPhase::Hover,
            Some(1),
        )]
    }

    fn auto(
        &self,
        waypoints: &[Waypoint],
        start: Position3,
        start_time: f64,
    ) -> Vec<TrajectorySample> {
        let speed = self.profile.cruise_speed_mps;
        let mut samples = Vec::new();
        let mut prev = start;
        let mut total_time = start_time;

        for (index, wp) in waypoints.iter().enumerate().skip(1) {
            let (x, y) = self.projector.to_local(wp.lat, wp.lon);
            let target = Position3::new(x, y, wp.altitude_m);

            let distance = prev.distance_to(&target);
            let flight_time = distance / speed;
            let segment_start = total_time;
            total_time += flight_time;

            if distance > INTERPOLATION_SPACING_M {
                let segments = ((distance / INTERPOLATION_SPACING_M).floor() as usize).max(2);
                for seg in 1..segments {
                    let ratio = seg as f64 / segments as f64;
                    samples.push(TrajectorySample::new(
                        prev.lerp(&target, ratio),
                        segment_start + flight_time * ratio,
                        FlightPhase::Auto,
                        None,
                    ));
                }
            }

            samples.push(TrajectorySample::new(
                target,
                total_time,
                FlightPhase::Auto,
                Some(index),
            ));
            prev = target;
        }

        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projector() -> GeoProjector {
        GeoProjector::with_origin(24.0, 121.0)
    }

    fn mission(projector: &GeoProjector) -> Vec<Waypoint> {
        let (lat1, lon1) = projector.to_geodetic(0.0, 45.0);
        let (lat2, lon2) = projector.to_geodetic(0.0, 50.0);
        vec![
            Waypoint::home(24.0, 121.0),
            Waypoint::navigate(lat1, lon1, 10.0),
            Waypoint::navigate(lat2, lon2, 10.0),
        ]
    }

    fn sample(t: f64, x: f64, index: Option<usize>) -> TrajectorySample {
        TrajectorySample::new(Position3::new(x, 0.0, 0.0), t, FlightPhase::Auto, index)
    }

    #[test]
    fn test_phase_sequence_and_sample_count() {
        let projector = projector();
        let profile = FlightProfile::default();
        let trajectory = TrajectorySynthesizer::new(&projector, &profile).synthesize(&mission(&projector));

        // taxi + takeoff + hover + (3 interpolated + wp1) + wp2
        assert_eq!(trajectory.len(), 1 + TAKEOFF_SAMPLES + 1 + 4 + 1);

        let samples = trajectory.samples();
        assert_eq!(samples[0].phase, FlightPhase::Taxi);
        assert_eq!(samples[0].time, 0.0);
        assert_eq!(samples[0].position.z, 0.0);
        assert!(samples[1..=TAKEOFF_SAMPLES]
            .iter()
            .all(|s| s.phase == FlightPhase::Takeoff));
        assert_eq!(samples[TAKEOFF_SAMPLES + 1].phase, FlightPhase::Hover);
        assert!(samples[TAKEOFF_SAMPLES + 2..]
            .iter()
            .all(|s| s.phase == FlightPhase::Auto));
    }

    #[test]
    fn test_takeoff_ramp_and_index_split() {
        let projector = projector();
        let profile = FlightProfile::default();
        let trajectory = TrajectorySynthesizer::new(&projector, &profile).synthesize(&mission(&projector));
        let takeoff = &trajectory.samples()[1..=TAKEOFF_SAMPLES];

        assert_eq!(takeoff[0].time, 2.0);
        assert_eq!(takeoff[0].position.z, 0.0);
        assert!((takeoff[TAKEOFF_SAMPLES - 1].time - 7.0).abs() < 1e-12);
        assert!((takeoff[TAKEOFF_SAMPLES - 1].position.z - 10.0).abs() < 1e-12);
        assert!(takeoff[..10].iter().all(|s| s.waypoint_index == Some(0)));
        assert!(takeoff[10..].iter().all(|s| s.waypoint_index == Some(1)));
    }

    #[test]
    fn test_hover_and_auto_timing() {
        let projector = projector();
        let profile = FlightProfile::default();
        let trajectory = TrajectorySynthesizer::new(&projector, &profile).synthesize(&mission(&projector));
        let samples = trajectory.samples();

        let hover = &samples[TAKEOFF_SAMPLES + 1];
        assert!((hover.time - 9.0).abs() < 1e-12);
        assert_eq!(hover.position.z, 10.0);
        assert_eq!(hover.waypoint_index, Some(1));

        let auto = &samples[TAKEOFF_SAMPLES + 2..];
        assert!(auto[..3].iter().all(|s| s.waypoint_index.is_none()));
        assert_eq!(auto[3].waypoint_index, Some(1));
        assert!((auto[3].time - (9.0 + 45.0 / 8.0)).abs() < 1e-6);
        assert!((auto[0].time - (9.0 + 45.0 / 8.0 / 4.0)).abs() < 1e-6);
        assert_eq!(auto[4].waypoint_index, Some(2));
        assert!((auto[4].time - (9.0 + 50.0 / 8.0)).abs() < 1e-6);
    }

    #[test]
    fn test_times_are_non_decreasing_and_deterministic() {
        let projector = projector();
        let profile = FlightProfile::default();
        let synthesizer = TrajectorySynthesizer::new(&projector, &profile);
        let first = synthesizer.synthesize(&mission(&projector));
        let second = synthesizer.synthesize(&mission(&projector));

        assert_eq!(first, second);
        assert!(first
            .samples()
            .windows(2)
            .all(|pair| pair[0].time <= pair[1].time));
    }

    #[test]
    fn test_short_missions_produce_empty_trajectory() {
        let projector = projector();
        let profile = FlightProfile::default();
        let synthesizer = TrajectorySynthesizer::new(&projector, &profile);

        assert!(synthesizer.synthesize(&[]).is_empty());
        assert!(synthesizer
            .synthesize(&[Waypoint::home(24.0, 121.0)])
            .is_empty());
    }

    #[test]
    fn test_zero_length_segment_keeps_time() {
        let projector = projector();
        let profile = FlightProfile::default();
        let waypoints = vec![
            Waypoint::home(24.0, 121.0),
            Waypoint::navigate(24.0, 121.0, 10.0),
        ];
        let trajectory = TrajectorySynthesizer::new(&projector, &profile).synthesize(&waypoints);
        let last = trajectory.last().unwrap();

        assert!((last.time - 9.0).abs() < 1e-12);
        assert!(last.time.is_finite());
        assert_eq!(last.waypoint_index, Some(1));
    }

    #[test]
    fn test_position_at_clamps_and_hits_boundaries() {
        let trajectory = Trajectory::new(vec![
            sample(0.0, 0.0, Some(0)),
            sample(10.0, 100.0, Some(1)),
        ]);

        assert_eq!(trajectory.position_at(0.0), Some(trajectory.samples()[0]));
        assert_eq!(trajectory.position_at(10.0), Some(trajectory.samples()[1]));
        assert_eq!(trajectory.position_at(-5.0), Some(trajectory.samples()[0]));
        assert_eq!(trajectory.position_at(50.0), Some(trajectory.samples()[1]));

        let mid = trajectory.position_at(2.5).unwrap();
        assert!((mid.position.x - 25.0).abs() < 1e-12);
        assert_eq!(mid.time, 2.5);
        assert_eq!(mid.waypoint_index, None);
    }

    #[test]
    fn test_position_at_empty_and_duplicate_times() {
        assert!(Trajectory::default().position_at(1.0).is_none());

        let trajectory = Trajectory::new(vec![
            sample(0.0, 0.0, None),
            sample(5.0, 10.0, None),
            sample(5.0, 10.0, Some(1)),
            sample(10.0, 20.0, None),
        ]);
        let at = trajectory.position_at(5.0).unwrap();
        assert_eq!(at.position.x, 10.0);
        let after = trajectory.position_at(7.5).unwrap();
        assert!((after.position.x - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_position_at_nan_time_has_no_position() {
        let trajectory =
            Trajectory::new(vec![sample(0.0, 0.0, Some(0)), sample(10.0, 20.0, Some(1))]);
        assert!(trajectory.position_at(f64::NAN).is_none());
        assert!(Trajectory::default().position_at(f64::NAN).is_none());
    }

    #[test]
    fn test_nearest_waypoint_ignores_interpolated_samples() {
        let trajectory = Trajectory::new(vec![
            sample(0.0, 0.0, Some(0)),
            sample(4.0, 40.0, None),
            sample(5.0, 50.0, None),
            sample(10.0, 100.0, Some(3)),
        ]);

        assert_eq!(trajectory.nearest_waypoint_index(4.9), Some(0));
        assert_eq!(trajectory.nearest_waypoint_index(5.1), Some(3));
        // equidistant: first indexed sample wins
        assert_eq!(trajectory.nearest_waypoint_index(5.0), Some(0));
        assert_eq!(Trajectory::default().nearest_waypoint_index(1.0), None);
    }
}
