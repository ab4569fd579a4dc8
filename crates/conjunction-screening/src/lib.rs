//! Conjunction Screening Library
//!
//! Screens pairs of orbiting objects for close approaches and scores the
//! collision risk of each encounter. The pipeline per pair is: cheap
//! pre-filters, adaptive closest-approach search, feature extraction, risk
//! scoring. The batch orchestrator drives that pipeline across a candidate
//! set under a cooperative cancellation token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use orbital_mechanics::{ElementSet, OrbitalError};
use risk_model::ModelError;

pub mod features;
pub mod filters;
pub mod orchestrator;
pub mod scorer;
pub mod search;

pub use orchestrator::{run_screening, ScreeningConfig, ScreeningReport, ScreeningStats};
pub use scorer::RiskAssessment;
pub use search::{find_closest_approach, ClosestApproach, SearchParams};

#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error("Propagation failed: {0}")]
    Propagation(#[from] OrbitalError),
    #[error("Pair exceeded its processing deadline of {0:?}")]
    PairTimeout(std::time::Duration),
    #[error("Scoring failed: {0}")]
    Scoring(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, ScreeningError>;

/// Discrete risk classification derived from collision probability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// High above 0.7, Medium above 0.3, Low otherwise. Both bounds are
    /// strict: a probability of exactly 0.7 is Medium, exactly 0.3 is Low.
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.7 {
            RiskLevel::High
        } else if probability > 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// The unit of screening work: an unordered pair of element sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatellitePair {
    pub primary: ElementSet,
    pub secondary: ElementSet,
}

impl SatellitePair {
    pub fn new(primary: ElementSet, secondary: ElementSet) -> Self {
        Self { primary, secondary }
    }
}

/// Output record for one screened pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConjunctionEvent {
    pub satellite1: String,
    pub satellite2: String,
    /// 1 iff the minimum distance fell below the screening threshold.
    pub prediction: u8,
    /// Minimum separation over the search window. `f64::INFINITY` when no
    /// coarse sample dropped below the threshold (serializes to JSON null).
    pub distance_km: f64,
    pub risk_value: f64,
    pub collision_probability: f64,
    pub risk_level: RiskLevel,
    pub conjunction_time: Option<DateTime<Utc>>,
    pub relative_velocity_km_s: Option<f64>,
}

/// Cooperative cancellation flag shared between a supervisor and the
/// orchestrator, polled at pair boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Rearm the token for a fresh run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}
