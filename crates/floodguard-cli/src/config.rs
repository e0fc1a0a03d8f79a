//! CLI configuration from environment.

use std::env;
use std::path::PathBuf;

use floodguard_services::alert_store::DEFAULT_ALERTS_PATH;
use floodguard_services::ServiceConfig;

use crate::logging::LogFormat;

pub const DEFAULT_BFE_PATH: &str = "bfe.geojson";

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub bfe_path: PathBuf,
    pub alerts_path: PathBuf,
    pub log_format: LogFormat,
    pub services: ServiceConfig,
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            bfe_path: var("BFE_GEOJSON_PATH")
                .unwrap_or_else(|| DEFAULT_BFE_PATH.to_string())
                .into(),
            alerts_path: var("FLOODGUARD_ALERTS_PATH")
                .unwrap_or_else(|| DEFAULT_ALERTS_PATH.to_string())
                .into(),
            log_format: var("FLOODGUARD_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            services: ServiceConfig::from_lookup(&lookup),
        }
    }
}
