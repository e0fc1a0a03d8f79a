//! JSON file holding the most recent alert refresh.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use floodguard_core::AlertRecord;
use thiserror::Error;

pub const DEFAULT_ALERTS_PATH: &str = "disaster_alerts.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("alert store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("alert store {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct AlertStore {
    path: PathBuf,
}

impl AlertStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> StoreError {
        StoreError::Json {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Stored alerts; an absent file reads as no alerts.
    pub fn load(&self) -> Result<Vec<AlertRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path).map_err(|err| self.io_error(err))?;
        serde_json::from_slice(&bytes).map_err(|err| self.json_error(err))
    }

    /// Replace the stored alerts. Writes `{path}.tmp` and renames it over
    /// the target, so readers never see a partial file.
    pub fn save(&self, alerts: &[AlertRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
            }
        }
        let payload = serde_json::to_vec_pretty(alerts).map_err(|err| self.json_error(err))?;

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&payload)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        };
        write().map_err(|err| self.io_error(err))?;
        tracing::debug!(path = %self.path.display(), count = alerts.len(), "saved alerts");
        Ok(())
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new(DEFAULT_ALERTS_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floodguard_core::{CapAlert, Coordinate};

    fn record(title: &str, polygon: Option<&str>) -> AlertRecord {
        AlertRecord::from_cap(
            format!("https://alerts.example/{title}.xml"),
            CapAlert {
                event: "Flood".into(),
                headline: title.into(),
                area_desc: "Kamrup".into(),
                polygon: polygon.map(str::to_string),
                sent: Some("2024-06-01T10:00:00+05:30".into()),
            },
        )
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = AlertStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_creates_parent_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = AlertStore::new(dir.path().join("nested").join("alerts.json"));
        let alerts = vec![
            record("river", Some("26.1,91.7 26.2,91.8 26.3,91.7")),
            record("storm", None),
        ];
        store.save(&alerts).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].title, "river");
        assert_eq!(loaded[0].first_coord, Some(Coordinate::new(26.1, 91.7)));
        assert_eq!(loaded[1].first_coord, None);
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = AlertStore::new(dir.path().join("alerts.json"));
        store.save(&[record("old", None)]).unwrap();
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
        assert!(!dir.path().join("alerts.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        std::fs::write(&path, "not json").unwrap();
        let err = AlertStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }
}
