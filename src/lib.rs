//! Themesmith - asset pipeline for CMS themes
//!
//! This library provides functionality to:
//! - Lint and compile SCSS to prefixed CSS with source maps
//! - Lint, transpile, bundle and minify theme scripts
//! - Recompress raster images
//! - Run these as named sequences and re-run linters on file changes

pub mod build;
pub mod cli;
pub mod config;
pub mod images;
pub mod lint;
pub mod script;
pub mod style;
pub mod watch;
