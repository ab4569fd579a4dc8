//! Batch orchestrator: drives pre-filtering, search, feature extraction and
//! scoring across all candidate pairs. Per-pair failures are counted and
//! skipped — no pair aborts the batch. Cancellation is polled between pairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use risk_model::RiskModel;

use crate::{
    features,
    filters::{self, FilterRejection, PrefilterConfig},
    scorer,
    search::{self, SearchParams},
    CancelToken, ConjunctionEvent, Result, RiskLevel, SatellitePair,
};

/// Everything one batch run needs besides the pairs themselves.
#[derive(Debug, Clone)]
pub struct ScreeningConfig {
    pub search: SearchParams,
    pub prefilter: PrefilterConfig,
    /// "Now" for recency filtering; pinned per run so a long batch applies a
    /// consistent policy.
    pub reference_time: DateTime<Utc>,
    /// Wall-clock budget for the whole batch; remaining pairs are skipped
    /// once it is exhausted and the report is tagged incomplete.
    pub batch_deadline: Option<std::time::Duration>,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        let search = SearchParams::default();
        Self {
            reference_time: search.start,
            search,
            prefilter: PrefilterConfig::default(),
            batch_deadline: None,
        }
    }
}

/// Aggregate statistics over one batch run.
///
/// Distance aggregates cover events with a finite distance; velocity
/// aggregates cover events with a defined relative velocity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreeningStats {
    pub total_pairs: usize,
    pub filtered: usize,
    pub filtered_stale: usize,
    pub filtered_bands: usize,
    pub filtered_dissimilar: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub conjunctions: usize,
    pub min_distance_km: Option<f64>,
    pub avg_distance_km: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub avg_relative_velocity_km_s: Option<f64>,
    pub max_relative_velocity_km_s: Option<f64>,
    pub avg_risk_value: Option<f64>,
    pub avg_collision_probability: Option<f64>,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
}

/// Result of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub stats: ScreeningStats,
    pub events: Vec<ConjunctionEvent>,
    /// True when the run was cancelled or hit the batch deadline before
    /// covering every pair.
    pub incomplete: bool,
    pub generated_at: DateTime<Utc>,
}

/// Screen all pairs. `on_progress(done, total)` fires after every pair so a
/// supervisor can surface progress.
pub fn run_screening(
    pairs: &[SatellitePair],
    model: &dyn RiskModel,
    config: &ScreeningConfig,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(usize, usize),
) -> ScreeningReport {
    let total = pairs.len();
    let started = Instant::now();

    let mut stats = ScreeningStats {
        total_pairs: total,
        ..Default::default()
    };
    let mut events = Vec::new();
    let mut incomplete = false;

    info!("Screening {} candidate pairs", total);

    for (index, pair) in pairs.iter().enumerate() {
        if cancel.is_cancelled() {
            info!("Cancellation observed after {} of {} pairs", index, total);
            incomplete = true;
            break;
        }

        if let Some(deadline) = config.batch_deadline {
            if started.elapsed() >= deadline {
                warn!(
                    "Batch deadline {:?} exhausted after {} of {} pairs",
                    deadline, index, total
                );
                incomplete = true;
                break;
            }
        }

        match filters::evaluate(pair, config.reference_time, &config.prefilter) {
            Some(rejection) => {
                debug!(
                    "Filtered {} / {}: {:?}",
                    pair.primary.name, pair.secondary.name, rejection
                );
                stats.filtered += 1;
                match rejection {
                    FilterRejection::StaleElements => stats.filtered_stale += 1,
                    FilterRejection::AltitudeBandsDisjoint => stats.filtered_bands += 1,
                    FilterRejection::DissimilarOrbits => stats.filtered_dissimilar += 1,
                }
            }
            None => {
                stats.processed += 1;
                match process_pair(pair, model, config) {
                    Ok(event) => {
                        stats.succeeded += 1;
                        if event.prediction == 1 {
                            stats.conjunctions += 1;
                        }
                        events.push(event);
                    }
                    Err(e) => {
                        warn!(
                            "Skipping pair {} / {}: {}",
                            pair.primary.name, pair.secondary.name, e
                        );
                        stats.failed += 1;
                    }
                }
            }
        }

        on_progress(index + 1, total);
    }

    finalize_stats(&mut stats, &events);

    info!(
        "Screening finished: {} events, {} conjunctions, {} filtered, {} failed{}",
        events.len(),
        stats.conjunctions,
        stats.filtered,
        stats.failed,
        if incomplete { " (incomplete)" } else { "" }
    );

    ScreeningReport {
        stats,
        events,
        incomplete,
        generated_at: Utc::now(),
    }
}

/// Search, extract and score one pair that survived the pre-filters.
fn process_pair(
    pair: &SatellitePair,
    model: &dyn RiskModel,
    config: &ScreeningConfig,
) -> Result<ConjunctionEvent> {
    let provider1 = pair.primary.propagator()?;
    let provider2 = pair.secondary.propagator()?;

    let approach = search::find_closest_approach(&provider1, &provider2, &config.search)?;

    if !approach.found() {
        // No coarse sample under the threshold: a result, not an error.
        return Ok(ConjunctionEvent {
            satellite1: pair.primary.name.clone(),
            satellite2: pair.secondary.name.clone(),
            prediction: 0,
            distance_km: f64::INFINITY,
            risk_value: 0.0,
            collision_probability: 0.0,
            risk_level: RiskLevel::Low,
            conjunction_time: None,
            relative_velocity_km_s: None,
        });
    }

    let reference_time = approach.tca.unwrap_or(config.search.start);
    let features = features::extract(pair, reference_time, &provider1, &provider2)?;
    let risk_value = model.risk_value(&features)?;

    let assessment = scorer::score(
        approach.min_distance_km,
        approach.relative_velocity_km_s,
        config.search.threshold_km,
        risk_value,
    );

    Ok(ConjunctionEvent {
        satellite1: pair.primary.name.clone(),
        satellite2: pair.secondary.name.clone(),
        prediction: assessment.prediction,
        distance_km: approach.min_distance_km,
        risk_value,
        collision_probability: assessment.collision_probability,
        risk_level: assessment.risk_level,
        conjunction_time: approach.tca,
        relative_velocity_km_s: approach.relative_velocity_km_s,
    })
}

fn finalize_stats(stats: &mut ScreeningStats, events: &[ConjunctionEvent]) {
    let distances: Vec<f64> = events
        .iter()
        .map(|e| e.distance_km)
        .filter(|d| d.is_finite())
        .collect();
    if !distances.is_empty() {
        let sum: f64 = distances.iter().sum();
        stats.min_distance_km = distances.iter().cloned().reduce(f64::min);
        stats.max_distance_km = distances.iter().cloned().reduce(f64::max);
        stats.avg_distance_km = Some(sum / distances.len() as f64);
    }

    let velocities: Vec<f64> = events
        .iter()
        .filter_map(|e| e.relative_velocity_km_s)
        .collect();
    if !velocities.is_empty() {
        let sum: f64 = velocities.iter().sum();
        stats.avg_relative_velocity_km_s = Some(sum / velocities.len() as f64);
        stats.max_relative_velocity_km_s = velocities.iter().cloned().reduce(f64::max);
    }

    if !events.is_empty() {
        let n = events.len() as f64;
        stats.avg_risk_value = Some(events.iter().map(|e| e.risk_value).sum::<f64>() / n);
        stats.avg_collision_probability =
            Some(events.iter().map(|e| e.collision_probability).sum::<f64>() / n);
    }

    for event in events {
        match event.risk_level {
            RiskLevel::High => stats.high_risk += 1,
            RiskLevel::Medium => stats.medium_risk += 1,
            RiskLevel::Low => stats.low_risk += 1,
        }
    }
}
