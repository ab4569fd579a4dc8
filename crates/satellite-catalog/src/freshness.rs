//! Freshness gate: decides from file mtimes whether upstream artifacts need
//! a refresh before a run. Freshness is derived on demand, never stored.

use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// Max-age policy per artifact class: hours for catalog data, days for the
/// model artifact and space-weather indices.
#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    pub data_max_age: Duration,
    pub model_max_age: Duration,
    pub weather_max_age: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            data_max_age: Duration::hours(12),
            model_max_age: Duration::days(30),
            weather_max_age: Duration::days(3),
        }
    }
}

/// Last-modified time of a file, if it exists.
pub fn last_modified(path: &Path) -> Option<DateTime<Utc>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

/// `true` iff the artifact exists and its age is within `max_age`.
pub fn is_fresh(path: &Path, max_age: Duration) -> bool {
    match last_modified(path) {
        Some(mtime) => Utc::now().signed_duration_since(mtime) <= max_age,
        None => false,
    }
}
