//! CelesTrak TLE fetch routine with retry, feeding the catalog store.

use tracing::{info, warn};

use crate::store::{merge_keep_latest, CatalogEntry, CatalogStore};
use crate::{CatalogError, Result};

const CELESTRAK_BASE: &str = "https://celestrak.org/NORAD/elements/gp.php";

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(5);

/// Supported CelesTrak satellite groups.
#[derive(Debug, Clone, Copy)]
pub enum CatalogGroup {
    /// Active satellites (~14k)
    Active,
    /// Tracked debris
    Debris,
    /// Space stations (ISS, Tiangong)
    Stations,
    /// Last 30 days launches
    LastThirtyDays,
}

impl CatalogGroup {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Debris => "debris",
            Self::Stations => "stations",
            Self::LastThirtyDays => "last-30-days",
        }
    }
}

/// Parse CelesTrak's three-line TLE text (name, line 1, line 2 repeating).
pub fn parse_tle_text(text: &str) -> Vec<CatalogEntry> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    lines
        .chunks_exact(3)
        .map(|chunk| CatalogEntry {
            name: chunk[0].to_string(),
            tle_line1: chunk[1].to_string(),
            tle_line2: chunk[2].to_string(),
        })
        .collect()
}

/// Fetch one group, retrying transient failures.
pub async fn fetch_group(group: CatalogGroup) -> Result<Vec<CatalogEntry>> {
    let url = format!("{}?GROUP={}&FORMAT=tle", CELESTRAK_BASE, group.as_str());

    let mut last_error = None;
    for attempt in 1..=MAX_RETRIES {
        info!(
            "Fetching TLEs from CelesTrak: {} (attempt {}/{})",
            group.as_str(),
            attempt,
            MAX_RETRIES
        );

        match try_fetch(&url).await {
            Ok(entries) => {
                info!("Fetched {} TLEs from group {}", entries.len(), group.as_str());
                return Ok(entries);
            }
            Err(e) => {
                warn!("Fetch attempt {} for {} failed: {}", attempt, group.as_str(), e);
                last_error = Some(e);
                if attempt < MAX_RETRIES {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        CatalogError::Fetch(format!("group {} unreachable", group.as_str()))
    }))
}

async fn try_fetch(url: &str) -> Result<Vec<CatalogEntry>> {
    let response = reqwest::get(url).await?;

    if !response.status().is_success() {
        return Err(CatalogError::Fetch(format!(
            "CelesTrak returned status {}",
            response.status()
        )));
    }

    let text = response.text().await?;
    let entries = parse_tle_text(&text);
    if entries.is_empty() {
        return Err(CatalogError::Fetch("response contained no TLEs".to_string()));
    }

    Ok(entries)
}

/// Fetch all requested groups and merge them over the stored catalog,
/// keeping the freshest entry per object name. Returns the merged size.
pub async fn refresh_catalog(store: &CatalogStore, groups: &[CatalogGroup]) -> Result<usize> {
    let mut incoming = Vec::new();
    for group in groups {
        incoming.extend(fetch_group(*group).await?);
    }

    let merged = merge_keep_latest(store.load()?, incoming);
    if merged.is_empty() {
        return Err(CatalogError::Empty);
    }

    store.save(&merged)?;
    info!(
        "Catalog refreshed: {} objects at {}",
        merged.len(),
        store.path().display()
    );
    Ok(merged.len())
}
