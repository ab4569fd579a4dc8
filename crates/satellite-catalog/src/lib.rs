//! Satellite Catalog Library
//!
//! Persistence and refresh for the upstream artifacts the screening pipeline
//! consumes: the element-set catalog (CelesTrak), space-weather indices
//! (GFZ Potsdam) and the freshness gate that decides when either needs a
//! refresh before a run.

use thiserror::Error;

pub mod fetch;
pub mod freshness;
pub mod space_weather;
pub mod store;

pub use fetch::{fetch_group, refresh_catalog, CatalogGroup};
pub use freshness::{is_fresh, FreshnessPolicy};
pub use store::{CatalogEntry, CatalogStore};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Fetch failed: {0}")]
    Fetch(String),
    #[error("Catalog is empty")]
    Empty,
}

pub type Result<T> = std::result::Result<T, CatalogError>;
