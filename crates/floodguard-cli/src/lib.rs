//! floodguard CLI support: environment configuration and log setup.
//!
//! The `floodguard` binary lives in `src/bin/floodguard.rs`.

pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{load_floods, BfeAnswer, RefreshSummary};
pub use config::CliConfig;
pub use logging::{init_logging, LogFormat};
