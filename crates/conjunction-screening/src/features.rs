//! Feature extraction for the risk model.
//!
//! Produces the fixed 18-feature vector whose ordering and units are the
//! external contract carried by `risk_model::FEATURE_NAMES`. Element
//! differences come straight from the pair's element sets; the state-derived
//! features are evaluated at the caller-supplied reference time, usually the
//! time of closest approach.

use chrono::{DateTime, Utc};

use orbital_mechanics::{frames::RtnFrame, StateProvider};
use risk_model::FeatureVector;

use crate::{Result, SatellitePair};

/// Extract the feature vector for a pair at `reference_time`.
///
/// The relative velocity is decomposed in the RTN frame anchored on the
/// primary object's state at that instant.
pub fn extract(
    pair: &SatellitePair,
    reference_time: DateTime<Utc>,
    provider1: &dyn StateProvider,
    provider2: &dyn StateProvider,
) -> Result<FeatureVector> {
    let e1 = &pair.primary;
    let e2 = &pair.secondary;

    let s1 = provider1.state_at(reference_time)?;
    let s2 = provider2.state_at(reference_time)?;

    let r_rel = s2.position() - s1.position();
    let v_rel = s2.velocity() - s1.velocity();

    let frame = RtnFrame::from_state(&s1)?;
    let [v_radial, v_transverse, v_normal] = frame.project(&v_rel);

    Ok(FeatureVector::new([
        (e1.mean_motion - e2.mean_motion).abs(),
        (e1.eccentricity - e2.eccentricity).abs(),
        (e1.inclination_deg - e2.inclination_deg).abs(),
        (e1.raan_deg - e2.raan_deg).abs(),
        (e1.arg_perigee_deg - e2.arg_perigee_deg).abs(),
        (e1.mean_anomaly_deg - e2.mean_anomaly_deg).abs(),
        r_rel.x,
        r_rel.y,
        r_rel.z,
        v_radial,
        v_transverse,
        v_normal,
        r_rel.norm(),
        v_rel.norm(),
        e1.apogee_height_km(),
        e1.perigee_height_km(),
        e2.apogee_height_km(),
        e2.perigee_height_km(),
    ]))
}
