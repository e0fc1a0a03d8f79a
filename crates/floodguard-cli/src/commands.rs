//! Pieces of the subcommands that do not need the network.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use floodguard_core::{AlertBatch, Coordinate, FloodIndex, IngestReport};
use serde::Serialize;

/// Load the flood dataset at `path`. A dataset that cannot be read or parsed
/// leaves the index empty; lookups then report an unknown BFE.
pub fn load_floods(path: &Path) -> FloodIndex {
    let index = FloodIndex::new();
    match index.load_geojson_file(path) {
        Ok(report) => tracing::info!(
            path = %path.display(),
            features = index.len(),
            %report,
            "flood dataset loaded"
        ),
        Err(err) => tracing::warn!(
            path = %path.display(),
            error = %err,
            "flood dataset unusable, continuing without flood data"
        ),
    }
    index
}

#[derive(Debug, Serialize)]
pub struct BfeAnswer {
    pub location: Coordinate,
    pub bfe_m: Option<f64>,
    pub flood_data_loaded: bool,
}

impl BfeAnswer {
    pub fn lookup(floods: &FloodIndex, at: Coordinate, nearest_fallback: bool) -> Self {
        Self {
            location: at,
            bfe_m: floods.query_with(at, nearest_fallback),
            flood_data_loaded: !floods.is_empty(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshSummary {
    pub path: String,
    pub stored: usize,
    /// Most recent `sent` time among the stored alerts
    pub newest_sent: Option<DateTime<FixedOffset>>,
    pub report: IngestReport,
}

impl RefreshSummary {
    pub fn new(path: &Path, batch: AlertBatch) -> Self {
        Self {
            path: path.display().to_string(),
            stored: batch.alerts.len(),
            newest_sent: batch.alerts.iter().filter_map(|a| a.sent_at()).max(),
            report: batch.report,
        }
    }
}
