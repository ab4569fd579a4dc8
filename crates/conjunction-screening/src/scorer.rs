//! Risk scoring: blend the distance signal with the trained model's
//! regression output into a calibrated collision probability.

use serde::{Deserialize, Serialize};

use crate::RiskLevel;

/// Scored outcome for one pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 1 iff the minimum distance is below the screening threshold.
    pub prediction: u8,
    pub collision_probability: f64,
    pub risk_level: RiskLevel,
}

/// Combine minimum distance and model risk value into a collision
/// probability and a discrete level.
///
/// The distance signal decays exponentially relative to the threshold; the
/// model signal is a logistic transform of the regression output (lower risk
/// values map to higher probability — kept for compatibility with existing
/// trained artifacts). Outside the danger zone the blend leans on the
/// distance signal (0.8); near or inside it the two signals are balanced
/// (0.5).
pub fn score(
    min_distance_km: f64,
    _relative_velocity_km_s: Option<f64>,
    threshold_km: f64,
    model_risk_value: f64,
) -> RiskAssessment {
    let distance_probability = (-min_distance_km / threshold_km).exp();
    let risk_probability = 1.0 / (1.0 + model_risk_value.exp());

    let weight = if min_distance_km > threshold_km {
        0.8
    } else {
        0.5
    };

    let collision_probability =
        (weight * distance_probability + (1.0 - weight) * risk_probability).clamp(0.0, 1.0);

    RiskAssessment {
        prediction: u8::from(min_distance_km < threshold_km),
        collision_probability,
        risk_level: RiskLevel::from_probability(collision_probability),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_distance_with_neutral_model_is_high_risk() {
        // dp = 1, rp = 0.5, balanced blend: 0.75.
        let assessment = score(0.0, Some(10.0), 10.0, 0.0);
        assert_eq!(assessment.prediction, 1);
        assert!((assessment.collision_probability - 0.75).abs() < 1e-12);
        assert_eq!(assessment.risk_level, RiskLevel::High);
    }

    #[test]
    fn distant_pair_scores_low() {
        let assessment = score(500.0, Some(10.0), 10.0, 0.0);
        assert_eq!(assessment.prediction, 0);
        assert!(assessment.collision_probability < 0.3);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
    }

    #[test]
    fn prediction_flips_exactly_at_threshold() {
        assert_eq!(score(9.999, None, 10.0, 0.0).prediction, 1);
        assert_eq!(score(10.0, None, 10.0, 0.0).prediction, 0);
        assert_eq!(score(10.001, None, 10.0, 0.0).prediction, 0);
    }

    #[test]
    fn weight_favors_distance_outside_the_danger_zone() {
        // Far outside the threshold a pessimistic model barely moves the
        // blend; inside it pulls with weight 0.5.
        let outside = score(50.0, None, 10.0, -10.0);
        let inside = score(5.0, None, 10.0, -10.0);
        assert!(outside.collision_probability < inside.collision_probability);
    }

    #[test]
    fn lower_model_risk_value_raises_probability() {
        // Preserved polarity of the logistic transform.
        let pessimistic = score(5.0, None, 10.0, -3.0);
        let optimistic = score(5.0, None, 10.0, 3.0);
        assert!(pessimistic.collision_probability > optimistic.collision_probability);
    }

    #[test]
    fn infinite_distance_degrades_to_distance_only_zero() {
        let assessment = score(f64::INFINITY, None, 10.0, 0.0);
        assert_eq!(assessment.prediction, 0);
        assert!(assessment.collision_probability <= 0.2 + 1e-12);
    }

    proptest! {
        #[test]
        fn probability_is_always_in_unit_interval(
            distance in proptest::num::f64::NORMAL,
            velocity in proptest::num::f64::NORMAL,
            risk in proptest::num::f64::NORMAL,
        ) {
            let assessment = score(distance.abs(), Some(velocity), 10.0, risk);
            prop_assert!(assessment.collision_probability >= 0.0);
            prop_assert!(assessment.collision_probability <= 1.0);
        }
    }
}
