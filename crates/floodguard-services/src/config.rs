//! Service configuration from environment.

use std::env;
use std::time::Duration;

pub const DEFAULT_ELEVATION_URL: &str = "https://api.opentopodata.org/v1/srtm90m";
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_OSRM_URL: &str = "http://router.project-osrm.org";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_FEED_URL: &str =
    "https://sachet.ndma.gov.in/cap_public_website/rss/rss_india.xml";

/// Per-collaborator request timeouts.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    pub elevation: Duration,
    pub overpass: Duration,
    pub osrm: Duration,
    pub weather: Duration,
    pub feed: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            elevation: Duration::from_secs(12),
            overpass: Duration::from_secs(25),
            osrm: Duration::from_secs(8),
            weather: Duration::from_secs(10),
            feed: Duration::from_secs(15),
        }
    }
}

impl Timeouts {
    /// Same timeout for every collaborator.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            elevation: timeout,
            overpass: timeout,
            osrm: timeout,
            weather: timeout,
            feed: timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub elevation_url: String,
    pub overpass_url: String,
    pub osrm_url: String,
    pub weather_url: String,
    pub openweathermap_api_key: Option<String>,
    pub feed_url: String,
    pub timeouts: Timeouts,
    /// Points per elevation request
    pub elevation_chunk_size: usize,
    pub elevation_cache_ttl: Duration,
    pub elevation_cache_max_entries: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            elevation_url: DEFAULT_ELEVATION_URL.to_string(),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            openweathermap_api_key: None,
            feed_url: DEFAULT_FEED_URL.to_string(),
            timeouts: Timeouts::default(),
            elevation_chunk_size: 100,
            elevation_cache_ttl: Duration::from_secs(3600),
            elevation_cache_max_entries: 10_000,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or unparsable values
    /// keep their defaults; empty strings count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let secs = |key: &str| var(key).and_then(|s| s.parse::<u64>().ok());

        let timeouts = secs("FLOODGUARD_HTTP_TIMEOUT_S")
            .filter(|s| *s > 0)
            .map(|s| Timeouts::uniform(Duration::from_secs(s)))
            .unwrap_or(defaults.timeouts);

        Self {
            elevation_url: var("FLOODGUARD_ELEVATION_URL").unwrap_or(defaults.elevation_url),
            overpass_url: var("FLOODGUARD_OVERPASS_URL").unwrap_or(defaults.overpass_url),
            osrm_url: var("FLOODGUARD_OSRM_URL").unwrap_or(defaults.osrm_url),
            weather_url: var("FLOODGUARD_WEATHER_URL").unwrap_or(defaults.weather_url),
            openweathermap_api_key: var("OPENWEATHERMAP_API_KEY"),
            feed_url: var("FLOODGUARD_FEED_URL").unwrap_or(defaults.feed_url),
            timeouts,
            elevation_chunk_size: defaults.elevation_chunk_size,
            elevation_cache_ttl: secs("FLOODGUARD_ELEVATION_CACHE_TTL_S")
                .map(Duration::from_secs)
                .unwrap_or(defaults.elevation_cache_ttl),
            elevation_cache_max_entries: var("FLOODGUARD_ELEVATION_CACHE_MAX_ENTRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.elevation_cache_max_entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServiceConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServiceConfig::default());
        assert!(config.openweathermap_api_key.is_none());
        assert_eq!(config.timeouts.overpass, Duration::from_secs(25));
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("FLOODGUARD_OSRM_URL", "http://localhost:5000"),
            ("OPENWEATHERMAP_API_KEY", "  abc123 "),
            ("FLOODGUARD_HTTP_TIMEOUT_S", "4"),
            ("FLOODGUARD_ELEVATION_CACHE_TTL_S", "not-a-number"),
            ("FLOODGUARD_ELEVATION_CACHE_MAX_ENTRIES", "500"),
            ("FLOODGUARD_FEED_URL", ""),
        ]));
        assert_eq!(config.osrm_url, "http://localhost:5000");
        assert_eq!(config.openweathermap_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.timeouts, Timeouts::uniform(Duration::from_secs(4)));
        assert_eq!(config.elevation_cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.elevation_cache_max_entries, 500);
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
    }
}
