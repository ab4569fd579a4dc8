//! Risk Model Library
//!
//! Consumes the conjunction risk model trained out-of-band: a linear
//! regression over standard-scaled features, persisted as a JSON artifact.
//! The feature schema defined here is an external contract — the extractor
//! and the trained model must agree on ordering, units and count at all
//! times, and a mismatch is a configuration error, not a runtime
//! approximation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Bumped whenever the feature layout changes; persisted in the artifact.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

pub const FEATURE_COUNT: usize = 18;

/// Canonical feature ordering. Index positions are load-bearing.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "d_mean_motion",
    "d_eccentricity",
    "d_inclination",
    "d_raan",
    "d_arg_perigee",
    "d_mean_anomaly",
    "r_rel_x_km",
    "r_rel_y_km",
    "r_rel_z_km",
    "v_rel_radial_km_s",
    "v_rel_transverse_km_s",
    "v_rel_normal_km_s",
    "range_km",
    "closing_speed_km_s",
    "apogee1_km",
    "perigee1_km",
    "apogee2_km",
    "perigee2_km",
];

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    ArtifactMissing(PathBuf),
    #[error("Model artifact unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("Model artifact malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(
        "Feature schema mismatch: expected {expected} features at schema v{version}, artifact `{field}` has {actual}"
    )]
    SchemaMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
        version: u32,
    },
    #[error("Non-finite value for feature `{0}`")]
    NonFiniteFeature(&'static str),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// A fixed-schema numeric feature vector, ordered per [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }
}

/// A trained regression consumed by the screening pipeline.
pub trait RiskModel: Send + Sync {
    /// Raw regression output; lower values map to higher collision
    /// probability downstream.
    fn risk_value(&self, features: &FeatureVector) -> Result<f64>;
}

/// On-disk representation of the trained model: feature scaling parameters
/// plus regression coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl ModelArtifact {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }
}

/// Linear regression over standard-scaled features.
pub struct LinearRiskModel {
    artifact: ModelArtifact,
}

impl LinearRiskModel {
    /// Validate an artifact against the compiled-in schema.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        let check = |field: &'static str, actual: usize| {
            if actual == FEATURE_COUNT {
                Ok(())
            } else {
                Err(ModelError::SchemaMismatch {
                    field,
                    expected: FEATURE_COUNT,
                    actual,
                    version: FEATURE_SCHEMA_VERSION,
                })
            }
        };

        check("feature_names", artifact.feature_names.len())?;
        check("scaler_mean", artifact.scaler_mean.len())?;
        check("scaler_scale", artifact.scaler_scale.len())?;
        check("weights", artifact.weights.len())?;

        Ok(Self { artifact })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ModelError::ArtifactMissing(path.to_path_buf()));
        }

        let file = std::fs::File::open(path)?;
        let artifact: ModelArtifact = serde_json::from_reader(std::io::BufReader::new(file))?;
        let model = Self::from_artifact(artifact)?;
        info!("Loaded risk model from {}", path.display());
        Ok(model)
    }
}

impl RiskModel for LinearRiskModel {
    fn risk_value(&self, features: &FeatureVector) -> Result<f64> {
        let mut acc = self.artifact.intercept;

        for (i, &x) in features.values.iter().enumerate() {
            if !x.is_finite() {
                return Err(ModelError::NonFiniteFeature(FEATURE_NAMES[i]));
            }

            // Zero-variance columns scale by 1.0, matching the scaler the
            // training side persists.
            let scale = self.artifact.scaler_scale[i];
            let scale = if scale.abs() < f64::EPSILON { 1.0 } else { scale };

            acc += self.artifact.weights[i] * (x - self.artifact.scaler_mean[i]) / scale;
        }

        Ok(acc)
    }
}
