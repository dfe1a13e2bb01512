//! Configuration loading and discovery for `themesmith.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{
    ImagesConfig, PathsConfig, ScriptConfig, StyleConfig, ThemeConfig, ThemesmithConfig,
    WatchConfig, CONFIG_FILE_NAME,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse themesmith.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override browserslist queries for prefixing
    pub browsers: Option<Vec<String>>,
    /// Override the script downlevel target
    pub target: Option<String>,
    /// Override the watch debounce
    pub debounce_ms: Option<u32>,
}

/// Find themesmith.toml by walking up from the current working directory.
///
/// # Returns
/// - `Some(path)` if a themesmith.toml file is found
/// - `None` if no config file is found
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find themesmith.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a themesmith.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns a default
/// configuration.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("web/themes/acme/themesmith.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<ThemesmithConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<ThemesmithConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: ThemesmithConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Create a default configuration when no themesmith.toml is found.
///
/// The theme name is taken from the current directory name.
pub fn default_config() -> ThemesmithConfig {
    let theme_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "theme".to_string());

    ThemesmithConfig {
        theme: ThemeConfig { name: theme_name },
        paths: PathsConfig::default(),
        style: StyleConfig::default(),
        script: ScriptConfig::default(),
        images: ImagesConfig::default(),
        watch: WatchConfig::default(),
    }
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut ThemesmithConfig, overrides: &CliOverrides) {
    if let Some(ref browsers) = overrides.browsers {
        config.style.browsers = browsers.clone();
    }

    if let Some(ref target) = overrides.target {
        config.script.target = target.clone();
    }

    if let Some(debounce_ms) = overrides.debounce_ms {
        config.watch.debounce_ms = debounce_ms;
    }
}

/// Resolve a path relative to the theme root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the theme root.
pub fn resolve_path(theme_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        theme_root.join(path)
    }
}
