//! Offline Screening CLI
//!
//! Screens user satellites against the stored catalog and writes the
//! report as JSON.
//!
//! Usage:
//!   screen-pairs --catalog data/catalog.json \
//!                --user data/user_satellites.json \
//!                --model models/risk_model.json \
//!                --output data/screening_report.json

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use conjunction_screening::{
    filters::PrefilterConfig, run_screening, CancelToken, SatellitePair, ScreeningConfig,
    SearchParams,
};
use risk_model::LinearRiskModel;
use satellite_catalog::CatalogStore;

#[derive(Parser, Debug)]
#[command(
    name = "screen-pairs",
    about = "Screen satellite pairs for close approaches and score collision risk"
)]
struct Args {
    /// Path to the catalog JSON file
    #[arg(short = 'c', long, default_value = "data/catalog.json")]
    catalog: PathBuf,

    /// Path to the user satellites JSON file
    #[arg(short = 'u', long, default_value = "data/user_satellites.json")]
    user: PathBuf,

    /// Path to the risk model artifact
    #[arg(short = 'm', long, default_value = "models/risk_model.json")]
    model: PathBuf,

    /// Output report JSON file
    #[arg(short, long, default_value = "data/screening_report.json")]
    output: PathBuf,

    /// Conjunction distance threshold in km
    #[arg(long, default_value_t = 10.0)]
    threshold_km: f64,

    /// Search window length in hours
    #[arg(long, default_value_t = 48)]
    duration_hours: i64,

    /// Coarse scan step in seconds
    #[arg(long, default_value_t = 3600)]
    coarse_step_secs: i64,

    /// Fine scan step in seconds
    #[arg(long, default_value_t = 60)]
    fine_step_secs: i64,

    /// Maximum element-set age in days
    #[arg(long, default_value_t = 20)]
    max_age_days: i64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let user_sets = CatalogStore::new(&args.user)
        .element_sets()
        .with_context(|| format!("loading user satellites from {:?}", args.user))?;
    let catalog_sets = CatalogStore::new(&args.catalog)
        .element_sets()
        .with_context(|| format!("loading catalog from {:?}", args.catalog))?;

    anyhow::ensure!(!user_sets.is_empty(), "no user satellites in {:?}", args.user);
    anyhow::ensure!(!catalog_sets.is_empty(), "no catalog objects in {:?}", args.catalog);

    let model = LinearRiskModel::load(&args.model)
        .with_context(|| format!("loading risk model from {:?}", args.model))?;

    let pairs: Vec<SatellitePair> = user_sets
        .iter()
        .flat_map(|user| {
            catalog_sets
                .iter()
                .map(move |other| SatellitePair::new(user.clone(), other.clone()))
        })
        .collect();

    info!(
        "Screening {} pairs ({} user x {} catalog)",
        pairs.len(),
        user_sets.len(),
        catalog_sets.len()
    );

    let now = Utc::now();
    let config = ScreeningConfig {
        search: SearchParams {
            start: now,
            duration: Duration::hours(args.duration_hours),
            coarse_step: Duration::seconds(args.coarse_step_secs),
            fine_step: Duration::seconds(args.fine_step_secs),
            threshold_km: args.threshold_km,
            pair_deadline: Some(std::time::Duration::from_secs(30)),
        },
        prefilter: PrefilterConfig {
            max_age_days: args.max_age_days,
            ..PrefilterConfig::default()
        },
        reference_time: now,
        batch_deadline: None,
    };

    let report = run_screening(&pairs, &model, &config, &CancelToken::new(), |done, total| {
        if done % 100 == 0 || done == total {
            info!("Progress: {}/{} pairs", done, total);
        }
    });

    let mut conjunctions: Vec<_> = report
        .events
        .iter()
        .filter(|e| e.prediction == 1)
        .collect();
    conjunctions.sort_by(|a, b| {
        b.collision_probability
            .partial_cmp(&a.collision_probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    info!("\nTop conjunctions by probability:");
    for event in conjunctions.iter().take(10) {
        info!(
            "  {:.3} | {:.2} km | {} / {}",
            event.collision_probability, event.distance_km, event.satellite1, event.satellite2
        );
    }

    info!("\nWriting report to {:?}", args.output);
    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(&args.output)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), &report)?;

    let stats = &report.stats;
    info!("Total pairs: {}", stats.total_pairs);
    info!("Filtered: {} | processed: {} | failed: {}", stats.filtered, stats.processed, stats.failed);
    info!(
        "Conjunctions: {} (high {} / medium {} / low {})",
        stats.conjunctions, stats.high_risk, stats.medium_risk, stats.low_risk
    );

    Ok(())
}
