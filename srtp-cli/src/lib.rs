//! SRTP CLI Library
//!
//! Shared functionality for SRTP command-line tools.

pub mod config;
pub mod stats;

pub use config::{Config, ConfigError, CustomPolicy, KeyConfig, Profile};
pub use stats::{display_engine_stats, format_bytes, format_compact_stats, format_drops};
