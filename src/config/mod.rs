//! Configuration module for the theme pipeline
//!
//! Provides types and parsing for `themesmith.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::{default_config, load_config, ConfigError};
pub use schema::*;
