//! Pre-filter chain: cheap rejection tests applied before any
//! propagation-heavy work. Filters short-circuit in order; a rejected pair
//! never reaches the closest-approach search and is counted as filtered,
//! not processed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::SatellitePair;

/// Thresholds for the three rejection tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefilterConfig {
    /// Maximum element-set age in days for both objects.
    pub max_age_days: i64,
    /// Margin added to each object's [perigee, apogee] altitude band before
    /// the overlap test.
    pub dth_km: f64,
    /// Maximum semi-major-axis difference for the similarity test.
    pub sma_tolerance_km: f64,
    /// Maximum inclination difference for the similarity test.
    pub inc_tolerance_deg: f64,
}

impl Default for PrefilterConfig {
    fn default() -> Self {
        Self {
            max_age_days: 20,
            dth_km: 100.0,
            sma_tolerance_km: 100.0,
            inc_tolerance_deg: 5.0,
        }
    }
}

/// Why a pair was excluded, for per-reason counting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilterRejection {
    StaleElements,
    AltitudeBandsDisjoint,
    DissimilarOrbits,
}

/// Evaluate the chain against a pair at `reference_time`. `None` means the
/// pair survives every filter.
pub fn evaluate(
    pair: &SatellitePair,
    reference_time: DateTime<Utc>,
    config: &PrefilterConfig,
) -> Option<FilterRejection> {
    let max_age = Duration::days(config.max_age_days);
    let fresh = |age: Duration| age.abs() <= max_age;

    if !fresh(pair.primary.epoch_age(reference_time))
        || !fresh(pair.secondary.epoch_age(reference_time))
    {
        return Some(FilterRejection::StaleElements);
    }

    let band1 = (
        pair.primary.perigee_height_km() - config.dth_km,
        pair.primary.apogee_height_km() + config.dth_km,
    );
    let band2 = (
        pair.secondary.perigee_height_km() - config.dth_km,
        pair.secondary.apogee_height_km() + config.dth_km,
    );
    if band1.0.max(band2.0) > band1.1.min(band2.1) {
        return Some(FilterRejection::AltitudeBandsDisjoint);
    }

    let d_sma =
        (pair.primary.semi_major_axis_km() - pair.secondary.semi_major_axis_km()).abs();
    let d_inc = (pair.primary.inclination_deg - pair.secondary.inclination_deg).abs();
    if d_sma > config.sma_tolerance_km || d_inc > config.inc_tolerance_deg {
        return Some(FilterRejection::DissimilarOrbits);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use orbital_mechanics::ElementSet;

    fn reference_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 25, 0, 0, 0).unwrap()
    }

    /// Hand-built element set; the TLE lines are never touched by the
    /// filters, so they stay empty.
    fn element_set(name: &str, mean_motion: f64, inclination_deg: f64, age_days: i64) -> ElementSet {
        ElementSet {
            name: name.to_string(),
            norad_id: 1,
            epoch: reference_time() - Duration::days(age_days),
            mean_motion,
            eccentricity: 0.001,
            inclination_deg,
            raan_deg: 0.0,
            arg_perigee_deg: 0.0,
            mean_anomaly_deg: 0.0,
            tle_line1: String::new(),
            tle_line2: String::new(),
        }
    }

    fn leo(name: &str) -> ElementSet {
        element_set(name, 15.5, 51.6, 1)
    }

    fn geo(name: &str) -> ElementSet {
        element_set(name, 1.0027, 0.1, 1)
    }

    #[test]
    fn similar_fresh_leo_pair_survives() {
        let pair = SatellitePair::new(leo("A"), leo("B"));
        assert_eq!(evaluate(&pair, reference_time(), &PrefilterConfig::default()), None);
    }

    #[test]
    fn stale_elements_are_rejected_first() {
        // Stale AND band-disjoint: recency must win the short-circuit.
        let pair = SatellitePair::new(element_set("A", 15.5, 51.6, 30), geo("B"));
        assert_eq!(
            evaluate(&pair, reference_time(), &PrefilterConfig::default()),
            Some(FilterRejection::StaleElements)
        );
    }

    #[test]
    fn leo_geo_pair_is_band_disjoint() {
        let pair = SatellitePair::new(leo("A"), geo("B"));
        assert_eq!(
            evaluate(&pair, reference_time(), &PrefilterConfig::default()),
            Some(FilterRejection::AltitudeBandsDisjoint)
        );
    }

    #[test]
    fn band_margin_rescues_nearby_bands() {
        // ~420 km vs ~480 km circular: disjoint bands, but within the
        // 100 km expansion on each side.
        let a = element_set("A", 15.5, 51.6, 1);
        let b = element_set("B", 15.4, 51.6, 1);
        let pair = SatellitePair::new(a, b);
        let rejection = evaluate(&pair, reference_time(), &PrefilterConfig::default());
        assert_ne!(rejection, Some(FilterRejection::AltitudeBandsDisjoint));
    }

    #[test]
    fn inclination_gap_is_dissimilar() {
        let a = element_set("A", 15.5, 51.6, 1);
        let b = element_set("B", 15.5, 97.5, 1);
        let pair = SatellitePair::new(a, b);
        assert_eq!(
            evaluate(&pair, reference_time(), &PrefilterConfig::default()),
            Some(FilterRejection::DissimilarOrbits)
        );
    }

    #[test]
    fn future_dated_epoch_within_window_is_fresh() {
        // Epoch slightly ahead of the reference clock still counts as
        // recent; the age test is symmetric.
        let pair = SatellitePair::new(element_set("A", 15.5, 51.6, -2), leo("B"));
        assert_eq!(evaluate(&pair, reference_time(), &PrefilterConfig::default()), None);
    }
}
