//! Error types shared across the engine and its collaborators.

use thiserror::Error;

/// Failure of an external collaborator (elevation, POI, routing, weather, feed).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{service} unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} returned a malformed response: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    #[error("{service} is not configured: {message}")]
    NotConfigured {
        service: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn unavailable(service: &'static str, message: impl ToString) -> Self {
        Self::Unavailable {
            service,
            message: message.to_string(),
        }
    }

    pub fn malformed(service: &'static str, message: impl ToString) -> Self {
        Self::Malformed {
            service,
            message: message.to_string(),
        }
    }
}

/// Failure while reading or parsing the flood-polygon dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataset is not a GeoJSON FeatureCollection")]
    NotFeatureCollection,
}

/// An invalid coordinate at a boundary.
#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("coordinate out of range: lat={lat}, lon={lon}")]
    OutOfRange { lat: f64, lon: f64 },
}
