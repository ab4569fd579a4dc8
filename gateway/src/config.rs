//! Environment-driven gateway configuration.

use chrono::Duration;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use conjunction_screening::filters::PrefilterConfig;
use satellite_catalog::FreshnessPolicy;

/// Everything the gateway and its screening pipeline need, resolved once at
/// startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub model_path: PathBuf,
    /// Conjunction distance threshold (km)
    pub threshold_km: f64,
    /// Search window length (hours)
    pub window_hours: i64,
    pub coarse_step_secs: i64,
    pub fine_step_secs: i64,
    /// Wall-clock budget per pair
    pub pair_deadline: std::time::Duration,
    /// Grace period before a stopped worker is aborted
    pub stop_grace: std::time::Duration,
    pub freshness: FreshnessPolicy,
    pub prefilter: PrefilterConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 18650,
            data_dir: PathBuf::from("data"),
            model_path: PathBuf::from("models/risk_model.json"),
            threshold_km: 10.0,
            window_hours: 48,
            coarse_step_secs: 3600,
            fine_step_secs: 60,
            pair_deadline: std::time::Duration::from_secs(30),
            stop_grace: std::time::Duration::from_secs(5),
            freshness: FreshnessPolicy::default(),
            prefilter: PrefilterConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: env_parse("SCREENING_GATEWAY_PORT", defaults.port),
            data_dir: std::env::var("SCREENING_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            model_path: std::env::var("SCREENING_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            threshold_km: env_parse("SCREENING_THRESHOLD_KM", defaults.threshold_km),
            window_hours: env_parse("SCREENING_WINDOW_HOURS", defaults.window_hours),
            coarse_step_secs: env_parse("SCREENING_COARSE_STEP_SECS", defaults.coarse_step_secs),
            fine_step_secs: env_parse("SCREENING_FINE_STEP_SECS", defaults.fine_step_secs),
            pair_deadline: std::time::Duration::from_secs(env_parse(
                "SCREENING_PAIR_DEADLINE_SECS",
                defaults.pair_deadline.as_secs(),
            )),
            stop_grace: std::time::Duration::from_secs(env_parse(
                "SCREENING_STOP_GRACE_SECS",
                defaults.stop_grace.as_secs(),
            )),
            freshness: FreshnessPolicy {
                data_max_age: Duration::hours(env_parse("SCREENING_DATA_MAX_AGE_HOURS", 12)),
                model_max_age: Duration::days(env_parse("SCREENING_MODEL_MAX_AGE_DAYS", 30)),
                weather_max_age: Duration::days(env_parse("SCREENING_WEATHER_MAX_AGE_DAYS", 3)),
            },
            prefilter: PrefilterConfig {
                max_age_days: env_parse("SCREENING_ELEMENT_MAX_AGE_DAYS", 20),
                ..defaults.prefilter
            },
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }

    pub fn user_path(&self) -> PathBuf {
        self.data_dir.join("user_satellites.json")
    }

    pub fn weather_path(&self) -> PathBuf {
        self.data_dir.join("space_weather.json")
    }

    pub fn report_path(&self) -> PathBuf {
        self.data_dir.join("screening_report.json")
    }
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
