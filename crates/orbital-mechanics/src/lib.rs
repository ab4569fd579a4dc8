//! Orbital Mechanics Library
//!
//! Two-line element sets, SGP4 propagation and the orbit geometry used by
//! conjunction screening: separation distances, RTN decomposition, and
//! apogee/perigee heights recovered from mean motion.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod frames;

/// Earth equatorial radius, WGS-72 (km)
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Earth gravitational parameter (km^3/s^2)
pub const MU_EARTH_KM3_S2: f64 = 398_600.4418;

#[derive(Error, Debug)]
pub enum OrbitalError {
    #[error("Invalid TLE format: {0}")]
    InvalidTle(String),
    #[error("Propagation failed: {0}")]
    PropagationFailed(String),
    #[error("Degenerate state vector: {0}")]
    DegenerateState(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// A catalog object's orbital element set at a reference epoch.
///
/// The six classical elements are kept alongside the raw TLE lines so that
/// cheap filtering can look at the elements while the propagator consumes the
/// lines verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSet {
    pub name: String,
    pub norad_id: u64,
    pub epoch: DateTime<Utc>,
    /// Mean motion (rev/day)
    pub mean_motion: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    pub tle_line1: String,
    pub tle_line2: String,
}

impl ElementSet {
    /// Parse a two-line element set, validating both lines.
    pub fn from_tle(name: &str, line1: &str, line2: &str) -> Result<Self> {
        let elements =
            sgp4::Elements::from_tle(Some(name.to_string()), line1.as_bytes(), line2.as_bytes())
                .map_err(|e| OrbitalError::InvalidTle(format!("{name}: {e:?}")))?;

        let epoch = DateTime::<Utc>::from_naive_utc_and_offset(elements.datetime, Utc);

        Ok(Self {
            name: name.to_string(),
            norad_id: elements.norad_id,
            epoch,
            mean_motion: elements.mean_motion,
            eccentricity: elements.eccentricity,
            inclination_deg: elements.inclination,
            raan_deg: elements.right_ascension,
            arg_perigee_deg: elements.argument_of_perigee,
            mean_anomaly_deg: elements.mean_anomaly,
            tle_line1: line1.to_string(),
            tle_line2: line2.to_string(),
        })
    }

    /// Build an SGP4 propagator for this element set.
    pub fn propagator(&self) -> Result<Propagator> {
        Propagator::from_tle(&self.name, &self.tle_line1, &self.tle_line2)
    }

    /// Semi-major axis recovered from mean motion: a = (mu / n^2)^(1/3).
    pub fn semi_major_axis_km(&self) -> f64 {
        let n_rad_s = self.mean_motion * 2.0 * std::f64::consts::PI / 86_400.0;
        (MU_EARTH_KM3_S2 / (n_rad_s * n_rad_s)).cbrt()
    }

    /// Apogee height above the Earth's surface (km).
    pub fn apogee_height_km(&self) -> f64 {
        self.semi_major_axis_km() * (1.0 + self.eccentricity) - EARTH_RADIUS_KM
    }

    /// Perigee height above the Earth's surface (km).
    pub fn perigee_height_km(&self) -> f64 {
        self.semi_major_axis_km() * (1.0 - self.eccentricity) - EARTH_RADIUS_KM
    }

    /// Age of the element set relative to `now`.
    pub fn epoch_age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.epoch)
    }
}

/// Inertial-frame (TEME) state at a given time. Ephemeral, produced on
/// demand, never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StateVector {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub epoch: DateTime<Utc>,
}

impl StateVector {
    pub fn position(&self) -> Vector3<f64> {
        Vector3::from(self.position_km)
    }

    pub fn velocity(&self) -> Vector3<f64> {
        Vector3::from(self.velocity_km_s)
    }

    /// Separation distance between two states (km).
    pub fn separation_km(&self, other: &StateVector) -> f64 {
        (self.position() - other.position()).norm()
    }

    /// Magnitude of the relative velocity between two states (km/s).
    pub fn relative_speed_km_s(&self, other: &StateVector) -> f64 {
        (self.velocity() - other.velocity()).norm()
    }
}

/// Anything that can produce an inertial state at a requested time.
///
/// The SGP4-backed [`Propagator`] is the production implementation; tests
/// substitute synthetic analytic orbits.
pub trait StateProvider {
    fn state_at(&self, time: DateTime<Utc>) -> Result<StateVector>;
}

/// SGP4 propagator for a single element set.
pub struct Propagator {
    elements: sgp4::Elements,
    constants: sgp4::Constants,
}

impl Propagator {
    pub fn from_tle(name: &str, line1: &str, line2: &str) -> Result<Self> {
        let elements =
            sgp4::Elements::from_tle(Some(name.to_string()), line1.as_bytes(), line2.as_bytes())
                .map_err(|e| OrbitalError::InvalidTle(format!("{name}: {e:?}")))?;

        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| OrbitalError::PropagationFailed(format!("{name}: {e:?}")))?;

        Ok(Self { elements, constants })
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_naive_utc_and_offset(self.elements.datetime, Utc)
    }
}

impl StateProvider for Propagator {
    fn state_at(&self, time: DateTime<Utc>) -> Result<StateVector> {
        let minutes = time.signed_duration_since(self.epoch()).num_seconds() as f64 / 60.0;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| OrbitalError::PropagationFailed(format!("{e:?}")))?;

        Ok(StateVector {
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
            epoch: time,
        })
    }
}
