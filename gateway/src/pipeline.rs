//! The screening pipeline the job controller supervises: freshness gating,
//! artifact refresh, pair construction and the blocking batch run.

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::info;

use conjunction_screening::{
    run_screening, CancelToken, SatellitePair, ScreeningConfig, ScreeningReport, SearchParams,
};
use risk_model::{LinearRiskModel, ModelError};
use satellite_catalog::{
    fetch::{refresh_catalog, CatalogGroup},
    freshness::is_fresh,
    space_weather::refresh_space_weather,
    CatalogError, CatalogStore,
};

use crate::config::GatewayConfig;
use crate::job::{JobState, StatusPublisher};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Data refresh failed: {0}")]
    DataStale(#[from] CatalogError),
    #[error("Worker execution failed: {0}")]
    Internal(String),
}

impl From<ModelError> for PipelineError {
    fn from(e: ModelError) -> Self {
        PipelineError::Configuration(e.to_string())
    }
}

/// How a pipeline run ended, cancellation kept distinct from completion.
pub enum PipelineOutcome {
    Finished(ScreeningReport),
    /// Stopped by the cancellation token; carries whatever partial report
    /// had accumulated (none when cancelled before screening began).
    Cancelled(Option<ScreeningReport>),
}

/// Run the full pipeline. Cancellation is polled at every stage boundary;
/// within the batch it is the orchestrator's per-pair concern.
pub async fn run(
    config: &GatewayConfig,
    publisher: &StatusPublisher,
    cancel: &CancelToken,
) -> Result<PipelineOutcome, PipelineError> {
    publisher.publish(JobState::Running, 2, "Checking catalog freshness");
    let store = CatalogStore::new(config.catalog_path());
    if !is_fresh(&config.catalog_path(), config.freshness.data_max_age) {
        info!("Catalog is stale; refreshing from CelesTrak");
        refresh_catalog(&store, &[CatalogGroup::Active]).await?;
    }
    if cancel.is_cancelled() {
        return Ok(PipelineOutcome::Cancelled(None));
    }

    publisher.publish(JobState::Running, 5, "Checking risk model freshness");
    let model = LinearRiskModel::load(&config.model_path)?;
    if !is_fresh(&config.model_path, config.freshness.model_max_age) {
        return Err(PipelineError::Configuration(format!(
            "risk model artifact at {} is stale; retrain it out of band",
            config.model_path.display()
        )));
    }
    if cancel.is_cancelled() {
        return Ok(PipelineOutcome::Cancelled(None));
    }

    publisher.publish(JobState::Running, 8, "Refreshing space weather data");
    if !is_fresh(&config.weather_path(), config.freshness.weather_max_age) {
        refresh_space_weather(&config.weather_path()).await?;
    }
    if cancel.is_cancelled() {
        return Ok(PipelineOutcome::Cancelled(None));
    }

    let user_sets = CatalogStore::new(config.user_path())
        .element_sets()
        .map_err(|e| PipelineError::Configuration(format!("loading user satellites: {e}")))?;
    if user_sets.is_empty() {
        return Err(PipelineError::Configuration(
            "no user satellites uploaded; POST /api/v1/satellites first".to_string(),
        ));
    }

    let catalog_sets = store
        .element_sets()
        .map_err(|e| PipelineError::Configuration(format!("loading catalog: {e}")))?;
    if catalog_sets.is_empty() {
        return Err(PipelineError::Configuration(
            "catalog is empty after refresh".to_string(),
        ));
    }

    let pairs: Vec<SatellitePair> = user_sets
        .iter()
        .flat_map(|user| {
            catalog_sets
                .iter()
                .map(move |other| SatellitePair::new(user.clone(), other.clone()))
        })
        .collect();

    let total = pairs.len();
    publisher.publish(JobState::Running, 10, format!("Screening {total} pairs"));

    let now = Utc::now();
    let screening_config = ScreeningConfig {
        search: SearchParams {
            start: now,
            duration: Duration::hours(config.window_hours),
            coarse_step: Duration::seconds(config.coarse_step_secs),
            fine_step: Duration::seconds(config.fine_step_secs),
            threshold_km: config.threshold_km,
            pair_deadline: Some(config.pair_deadline),
        },
        prefilter: config.prefilter.clone(),
        reference_time: now,
        batch_deadline: None,
    };

    // The numeric loop cannot be interrupted mid-pair, so it runs on the
    // blocking pool while this task stays responsive to cancellation.
    let progress_publisher = publisher.clone();
    let worker_cancel = cancel.clone();
    let report = tokio::task::spawn_blocking(move || {
        run_screening(
            &pairs,
            &model,
            &screening_config,
            &worker_cancel,
            move |done, total| {
                let progress = 10 + (done * 90 / total.max(1)) as u8;
                progress_publisher.publish(
                    JobState::Running,
                    progress,
                    format!("Screened {done}/{total} pairs"),
                );
            },
        )
    })
    .await
    .map_err(|e| PipelineError::Internal(format!("screening worker panicked: {e}")))?;

    persist_report(config, &report)?;

    if report.incomplete && cancel.is_cancelled() {
        return Ok(PipelineOutcome::Cancelled(Some(report)));
    }
    Ok(PipelineOutcome::Finished(report))
}

fn persist_report(config: &GatewayConfig, report: &ScreeningReport) -> Result<(), PipelineError> {
    let path = config.report_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| PipelineError::Internal(format!("creating {}: {e}", parent.display())))?;
    }

    let file = std::fs::File::create(&path)
        .map_err(|e| PipelineError::Internal(format!("writing {}: {e}", path.display())))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), report)
        .map_err(|e| PipelineError::Internal(format!("serializing report: {e}")))?;

    info!("Screening report persisted to {}", path.display());
    Ok(())
}
