//! Space-weather auxiliary data: daily Kp/Ap/F10.7 indices from GFZ
//! Potsdam, persisted as JSON next to the catalog.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::{CatalogError, Result};

const GFZ_KP_URL: &str =
    "https://www-app3.gfz-potsdam.de/kp_index/Kp_ap_Ap_SN_F107_since_1932.txt";

/// One day of geomagnetic and solar-flux indices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpaceWeatherRecord {
    /// ISO date (YYYY-MM-DD)
    pub date: String,
    /// Eight three-hourly Kp values
    pub kp: [f64; 8],
    pub ap: i64,
    pub sunspot_number: i64,
    pub f107_observed: f64,
    pub f107_adjusted: f64,
}

/// Parse the GFZ fixed-column Kp table, skipping comments and short rows.
pub fn parse_kp_table(text: &str) -> Vec<SpaceWeatherRecord> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 28 {
                return None;
            }

            let mut kp = [0.0; 8];
            for (i, slot) in kp.iter_mut().enumerate() {
                *slot = parts[6 + i].parse().ok()?;
            }

            Some(SpaceWeatherRecord {
                date: format!("{}-{:0>2}-{:0>2}", parts[0], parts[1], parts[2]),
                kp,
                ap: parts[22].parse().ok()?,
                sunspot_number: parts[23].parse().ok()?,
                f107_observed: parts[24].parse().ok()?,
                f107_adjusted: parts[25].parse().ok()?,
            })
        })
        .collect()
}

/// Fetch the full index table and persist it. Returns the record count.
pub async fn refresh_space_weather(path: &Path) -> Result<usize> {
    info!("Fetching space-weather indices from GFZ Potsdam");

    let response = reqwest::get(GFZ_KP_URL).await?;
    if !response.status().is_success() {
        return Err(CatalogError::Fetch(format!(
            "GFZ returned status {}",
            response.status()
        )));
    }

    let text = response.text().await?;
    let records = parse_kp_table(&text);
    if records.is_empty() {
        return Err(CatalogError::Fetch(
            "space-weather response contained no records".to_string(),
        ));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    serde_json::to_writer(std::io::BufWriter::new(file), &records)?;

    info!("Space weather refreshed: {} records", records.len());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Shape of the GFZ daily rows: Y M D days days_m bsr kp1..kp8 ap1..ap8
    // Ap SN F10.7obs F10.7adj D
    const SAMPLE_ROW: &str = "2024 03 25 45376 45376.5 2603 2.667 3.000 2.333 1.667 2.000 2.667 3.333 3.667 12 15 9 6 7 12 18 22 13 45 150.1 148.9 0 0";

    #[test]
    fn parses_a_daily_row() {
        let records = parse_kp_table(SAMPLE_ROW);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.date, "2024-03-25");
        assert!((record.kp[0] - 2.667).abs() < 1e-9);
        assert!((record.kp[7] - 3.667).abs() < 1e-9);
        assert_eq!(record.ap, 13);
        assert_eq!(record.sunspot_number, 45);
        assert!((record.f107_observed - 150.1).abs() < 1e-9);
    }

    #[test]
    fn comments_and_short_rows_are_skipped() {
        let text = format!("# header\n# more\n1932 01 01 too short\n{SAMPLE_ROW}\n");
        assert_eq!(parse_kp_table(&text).len(), 1);
    }
}
