//! Blocking HTTP adapters for the floodguard engine.
//!
//! Each adapter implements one of the collaborator traits from
//! `floodguard-core`. [`Services`] builds all of them from a single
//! [`ServiceConfig`].

pub mod alert_store;
pub mod cache;
pub mod cap_feed;
pub mod config;
pub mod elevation;
pub mod http;
pub mod osrm;
pub mod overpass;
pub mod weather;

use floodguard_core::{Collaborators, ProviderError};

pub use alert_store::{AlertStore, StoreError};
pub use cap_feed::CapFeed;
pub use config::{ServiceConfig, Timeouts};
pub use elevation::OpenTopoData;
pub use osrm::OsrmRouter;
pub use overpass::OverpassPois;
pub use weather::OpenWeatherMap;

/// Every live collaborator, configured once.
pub struct Services {
    pub elevation: OpenTopoData,
    pub pois: OverpassPois,
    pub routes: OsrmRouter,
    pub weather: OpenWeatherMap,
    pub feed: CapFeed,
}

impl Services {
    pub fn new(config: &ServiceConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            elevation: OpenTopoData::new(config)?,
            pois: OverpassPois::new(config)?,
            routes: OsrmRouter::new(config)?,
            weather: OpenWeatherMap::new(config)?,
            feed: CapFeed::new(config)?,
        })
    }

    /// Borrow the adapters the planner needs.
    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            elevation: &self.elevation,
            pois: &self.pois,
            routes: &self.routes,
            weather: &self.weather,
        }
    }
}
