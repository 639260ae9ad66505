//! Builders
//!
//! Fluent builder for Instagram configuration.

pub mod config;

pub use config::{instagram_config, InstagramConfigBuilder};
