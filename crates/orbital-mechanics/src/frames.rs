//! Radial-Transverse-Normal frame anchored on a reference object's
//! instantaneous orbit, used to decompose relative vectors.

use nalgebra::Vector3;

use crate::{OrbitalError, Result, StateVector};

/// Orthonormal RTN basis built from a reference state.
///
/// Radial points along the position vector, normal along the orbital angular
/// momentum, transverse completes the right-handed triad.
#[derive(Debug, Clone, Copy)]
pub struct RtnFrame {
    radial: Vector3<f64>,
    transverse: Vector3<f64>,
    normal: Vector3<f64>,
}

impl RtnFrame {
    pub fn from_state(anchor: &StateVector) -> Result<Self> {
        let r = anchor.position();
        let v = anchor.velocity();

        let r_norm = r.norm();
        if r_norm < f64::EPSILON {
            return Err(OrbitalError::DegenerateState(
                "zero position vector".to_string(),
            ));
        }

        let h = r.cross(&v);
        let h_norm = h.norm();
        if h_norm < f64::EPSILON {
            return Err(OrbitalError::DegenerateState(
                "position and velocity are colinear".to_string(),
            ));
        }

        let radial = r / r_norm;
        let normal = h / h_norm;
        let transverse = normal.cross(&radial);

        Ok(Self {
            radial,
            transverse,
            normal,
        })
    }

    /// Project an inertial-frame vector onto (radial, transverse, normal).
    pub fn project(&self, vector: &Vector3<f64>) -> [f64; 3] {
        [
            self.radial.dot(vector),
            self.transverse.dot(vector),
            self.normal.dot(vector),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn circular_state() -> StateVector {
        StateVector {
            position_km: [7000.0, 0.0, 0.0],
            velocity_km_s: [0.0, 7.5, 0.0],
            epoch: Utc::now(),
        }
    }

    #[test]
    fn basis_is_orthonormal() {
        let frame = RtnFrame::from_state(&circular_state()).unwrap();

        assert!((frame.radial.norm() - 1.0).abs() < 1e-12);
        assert!((frame.transverse.norm() - 1.0).abs() < 1e-12);
        assert!((frame.normal.norm() - 1.0).abs() < 1e-12);
        assert!(frame.radial.dot(&frame.transverse).abs() < 1e-12);
        assert!(frame.radial.dot(&frame.normal).abs() < 1e-12);
        assert!(frame.transverse.dot(&frame.normal).abs() < 1e-12);
    }

    #[test]
    fn projection_recovers_components() {
        let frame = RtnFrame::from_state(&circular_state()).unwrap();

        // For this geometry: radial = +x, transverse = +y, normal = +z.
        let [r, t, n] = frame.project(&Vector3::new(1.0, 2.0, 3.0));
        assert!((r - 1.0).abs() < 1e-12);
        assert!((t - 2.0).abs() < 1e-12);
        assert!((n - 3.0).abs() < 1e-12);
    }

    #[test]
    fn colinear_state_is_rejected() {
        let state = StateVector {
            position_km: [7000.0, 0.0, 0.0],
            velocity_km_s: [1.0, 0.0, 0.0],
            epoch: Utc::now(),
        };
        assert!(matches!(
            RtnFrame::from_state(&state),
            Err(OrbitalError::DegenerateState(_))
        ));
    }
}
