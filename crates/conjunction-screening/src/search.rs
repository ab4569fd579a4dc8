//! Adaptive closest-approach search between two propagated trajectories.
//!
//! A coarse scan over the whole window bounds the propagation cost to
//! O(duration / coarse_step); a fine re-scan runs only around coarse samples
//! that are both under the screening threshold and better than the running
//! minimum. The result is a bounded-cost approximation, not a guaranteed
//! global minimum.

use chrono::{DateTime, Duration, Utc};
use std::time::Instant;

use orbital_mechanics::StateProvider;

use crate::{Result, ScreeningError};

/// Parameters for one pair's search window.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub start: DateTime<Utc>,
    pub duration: Duration,
    pub coarse_step: Duration,
    pub fine_step: Duration,
    pub threshold_km: f64,
    /// Wall-clock budget for a single pair; exceeding it aborts the search
    /// with [`ScreeningError::PairTimeout`] so one degenerate element set
    /// cannot stall a batch.
    pub pair_deadline: Option<std::time::Duration>,
}

impl Default for SearchParams {
    fn default() -> Self {
        // Two-day window, hourly coarse scan, one-minute refinement.
        Self {
            start: Utc::now(),
            duration: Duration::seconds(172_800),
            coarse_step: Duration::seconds(3_600),
            fine_step: Duration::seconds(60),
            threshold_km: 10.0,
            pair_deadline: Some(std::time::Duration::from_secs(30)),
        }
    }
}

/// Outcome of a closest-approach search.
#[derive(Debug, Clone, Copy)]
pub struct ClosestApproach {
    pub min_distance_km: f64,
    pub tca: Option<DateTime<Utc>>,
    pub relative_velocity_km_s: Option<f64>,
}

impl ClosestApproach {
    /// "No conjunction": nothing under the threshold anywhere in the window.
    pub fn none() -> Self {
        Self {
            min_distance_km: f64::INFINITY,
            tca: None,
            relative_velocity_km_s: None,
        }
    }

    pub fn found(&self) -> bool {
        self.min_distance_km.is_finite()
    }
}

/// Scan `[start, start + duration)` at `coarse_step`; refine the half-open
/// window `[-coarse_step/2, +coarse_step/2)` around any coarse sample that is
/// under `threshold_km` and improves the running minimum. Returns
/// [`ClosestApproach::none`] when no coarse sample qualifies — that is a
/// result, not an error. Ties keep the earliest-found time.
pub fn find_closest_approach(
    provider1: &dyn StateProvider,
    provider2: &dyn StateProvider,
    params: &SearchParams,
) -> Result<ClosestApproach> {
    let duration_s = params.duration.num_seconds().max(0);
    let coarse_s = params.coarse_step.num_seconds().max(1);
    let fine_s = params.fine_step.num_seconds().max(1);

    let started = Instant::now();
    let mut best = ClosestApproach::none();

    let mut t = 0;
    while t < duration_s {
        if let Some(deadline) = params.pair_deadline {
            if started.elapsed() >= deadline {
                return Err(ScreeningError::PairTimeout(deadline));
            }
        }

        let sample_time = params.start + Duration::seconds(t);
        let s1 = provider1.state_at(sample_time)?;
        let s2 = provider2.state_at(sample_time)?;
        let distance = s1.separation_km(&s2);

        if distance < params.threshold_km && distance < best.min_distance_km {
            let mut dt = -coarse_s / 2;
            while dt < coarse_s / 2 {
                let fine_time = sample_time + Duration::seconds(dt);
                let f1 = provider1.state_at(fine_time)?;
                let f2 = provider2.state_at(fine_time)?;
                let fine_distance = f1.separation_km(&f2);

                if fine_distance < best.min_distance_km {
                    best.min_distance_km = fine_distance;
                    best.tca = Some(fine_time);
                    best.relative_velocity_km_s = Some(f1.relative_speed_km_s(&f2));
                }

                dt += fine_s;
            }
        }

        t += coarse_s;
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use orbital_mechanics::{Result as OrbitalResult, StateVector};

    /// Straight-line trajectory: position = base + velocity * (t - t0).
    struct LinearProvider {
        t0: DateTime<Utc>,
        base: [f64; 3],
        velocity: [f64; 3],
    }

    impl StateProvider for LinearProvider {
        fn state_at(&self, time: DateTime<Utc>) -> OrbitalResult<StateVector> {
            let dt = (time - self.t0).num_seconds() as f64;
            Ok(StateVector {
                position_km: [
                    self.base[0] + self.velocity[0] * dt,
                    self.base[1] + self.velocity[1] * dt,
                    self.base[2] + self.velocity[2] * dt,
                ],
                velocity_km_s: self.velocity,
                epoch: time,
            })
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 25, 12, 0, 0).unwrap()
    }

    fn head_on_pair() -> (LinearProvider, LinearProvider) {
        // Closing at 2 km/s along x, exact crossing at t0 + 100 s.
        let a = LinearProvider {
            t0: t0(),
            base: [-100.0, 0.0, 0.0],
            velocity: [1.0, 0.0, 0.0],
        };
        let b = LinearProvider {
            t0: t0(),
            base: [100.0, 0.0, 0.0],
            velocity: [-1.0, 0.0, 0.0],
        };
        (a, b)
    }

    fn params(threshold_km: f64) -> SearchParams {
        SearchParams {
            start: t0(),
            duration: Duration::seconds(400),
            coarse_step: Duration::seconds(60),
            fine_step: Duration::seconds(1),
            threshold_km,
            pair_deadline: None,
        }
    }

    #[test]
    fn finds_crossing_time_and_distance() {
        let (a, b) = head_on_pair();
        let result = find_closest_approach(&a, &b, &params(50.0)).unwrap();

        assert!(result.found());
        assert!(result.min_distance_km < 1.0, "dist: {}", result.min_distance_km);
        assert_eq!(result.tca.unwrap(), t0() + Duration::seconds(100));
        assert!((result.relative_velocity_km_s.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn no_sample_under_threshold_reports_none() {
        let (a, b) = head_on_pair();
        // Tightest coarse sample is 40 km apart; a 5 km threshold never trips.
        let result = find_closest_approach(&a, &b, &params(5.0)).unwrap();

        assert!(!result.found());
        assert!(result.min_distance_km.is_infinite());
        assert!(result.tca.is_none());
        assert!(result.relative_velocity_km_s.is_none());
    }

    #[test]
    fn distance_is_never_negative() {
        let (a, b) = head_on_pair();
        let result = find_closest_approach(&a, &b, &params(50.0)).unwrap();
        assert!(result.min_distance_km >= 0.0);
    }

    #[test]
    fn search_is_symmetric_in_pair_order() {
        let (a, b) = head_on_pair();
        let ab = find_closest_approach(&a, &b, &params(50.0)).unwrap();
        let ba = find_closest_approach(&b, &a, &params(50.0)).unwrap();

        assert!((ab.min_distance_km - ba.min_distance_km).abs() < 1e-9);
        assert_eq!(ab.tca, ba.tca);
    }

    #[test]
    fn refinement_only_improves_on_the_triggering_sample() {
        let (a, b) = head_on_pair();
        // The triggering coarse sample at t=120 sits at 40 km; the refined
        // minimum must not exceed it.
        let result = find_closest_approach(&a, &b, &params(50.0)).unwrap();
        assert!(result.min_distance_km <= 40.0);
    }

    #[test]
    fn equal_distances_keep_the_earliest_time() {
        // Constant 5 km separation: every fine sample ties, so only the
        // first-found time may be kept.
        let a = LinearProvider {
            t0: t0(),
            base: [0.0, 0.0, 0.0],
            velocity: [1.0, 0.0, 0.0],
        };
        let b = LinearProvider {
            t0: t0(),
            base: [0.0, 5.0, 0.0],
            velocity: [1.0, 0.0, 0.0],
        };

        let p = params(10.0);
        let result = find_closest_approach(&a, &b, &p).unwrap();

        assert!((result.min_distance_km - 5.0).abs() < 1e-9);
        // First coarse trigger is t=0; its refinement window opens at -30 s.
        assert_eq!(result.tca.unwrap(), t0() - Duration::seconds(30));
    }

    #[test]
    fn partial_trailing_interval_is_still_sampled() {
        // 90 s window with 60 s steps: samples at t=0 and t=60. The crossing
        // pair is 80 km apart at t=60, under a 90 km threshold.
        let (a, b) = head_on_pair();
        let p = SearchParams {
            start: t0(),
            duration: Duration::seconds(90),
            coarse_step: Duration::seconds(60),
            fine_step: Duration::seconds(1),
            threshold_km: 90.0,
            pair_deadline: None,
        };

        let result = find_closest_approach(&a, &b, &p).unwrap();
        assert!(result.found());
        // The refinement window [30, 90) around t=60 reaches t=89, where the
        // pair is 22 km apart.
        assert!((result.min_distance_km - 22.0).abs() < 1e-9);
        assert_eq!(result.tca.unwrap(), t0() + Duration::seconds(89));
    }

    #[test]
    fn exhausted_deadline_times_out() {
        let (a, b) = head_on_pair();
        let mut p = params(50.0);
        p.pair_deadline = Some(std::time::Duration::ZERO);

        assert!(matches!(
            find_closest_approach(&a, &b, &p),
            Err(ScreeningError::PairTimeout(_))
        ));
    }
}
