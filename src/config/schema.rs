//! Configuration schema types for `themesmith.toml`
//!
//! Defines the structure and validation rules for theme pipeline configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "themesmith.toml";

/// Theme metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Theme name (required)
    pub name: String,
}

/// Source and output directory layout, relative to the theme root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// SCSS sources
    #[serde(default = "default_sass_dir")]
    pub sass: PathBuf,
    /// Compiled CSS output (maps go to `<css>/maps`)
    #[serde(default = "default_css_dir")]
    pub css: PathBuf,
    /// Script sources; `lib/`, `babel/` and `dist/` live underneath
    #[serde(default = "default_js_dir")]
    pub js: PathBuf,
    /// Image output; sources live in `<img>/src`
    #[serde(default = "default_img_dir")]
    pub img: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sass: default_sass_dir(),
            css: default_css_dir(),
            js: default_js_dir(),
            img: default_img_dir(),
        }
    }
}

fn default_sass_dir() -> PathBuf {
    PathBuf::from("sass")
}

fn default_css_dir() -> PathBuf {
    PathBuf::from("css")
}

fn default_js_dir() -> PathBuf {
    PathBuf::from("js")
}

fn default_img_dir() -> PathBuf {
    PathBuf::from("img")
}

/// Stylesheet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Browserslist queries used for vendor prefixing
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
    /// Style lint rule file, relative to the theme root
    #[serde(default = "default_style_lint_config")]
    pub lint_config: PathBuf,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self { browsers: default_browsers(), lint_config: default_style_lint_config() }
    }
}

fn default_browsers() -> Vec<String> {
    vec!["> 1%".to_string()]
}

fn default_style_lint_config() -> PathBuf {
    PathBuf::from(".sass-lint.yml")
}

/// Script settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Downlevel compilation target (e.g. "es2015")
    #[serde(default = "default_target")]
    pub target: String,
    /// Script lint rule file, relative to the theme root
    #[serde(default = "default_script_lint_config")]
    pub lint_config: PathBuf,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self { target: default_target(), lint_config: default_script_lint_config() }
    }
}

fn default_target() -> String {
    "es2015".to_string()
}

fn default_script_lint_config() -> PathBuf {
    PathBuf::from(".eslintrc.json")
}

/// PNG compression effort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    /// Fastest encoding
    Fast,
    /// Encoder default
    Default,
    /// Smallest output
    #[default]
    Best,
}

/// Image minification settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// PNG compression effort
    #[serde(default)]
    pub png_compression: PngCompression,
    /// JPEG re-encode quality; JPEGs are copied untouched when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u8>,
}

/// Watch mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal before each lint run
    #[serde(default)]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100, clear_screen: false }
    }
}

/// Complete themesmith.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemesmithConfig {
    /// Theme metadata (required)
    pub theme: ThemeConfig,
    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,
    /// Stylesheet settings
    #[serde(default)]
    pub style: StyleConfig,
    /// Script settings
    #[serde(default)]
    pub script: ScriptConfig,
    /// Image settings
    #[serde(default)]
    pub images: ImagesConfig,
    /// Watch settings
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "script.target")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: '{}' {}", CONFIG_FILE_NAME, self.field, self.message)
    }
}

impl ThemesmithConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.theme.name.is_empty() {
            errors.push(ConfigValidationError {
                field: "theme.name".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.style.browsers.iter().all(|q| q.trim().is_empty()) {
            errors.push(ConfigValidationError {
                field: "style.browsers".to_string(),
                message: "must contain at least one browserslist query".to_string(),
            });
        }

        if self.script.target.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "script.target".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if let Some(quality) = self.images.jpeg_quality {
            if !(1..=100).contains(&quality) {
                errors.push(ConfigValidationError {
                    field: "images.jpeg_quality".to_string(),
                    message: "must be between 1 and 100".to_string(),
                });
            }
        }

        if self.watch.debounce_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.debounce_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parse() {
        let toml = r#"
[theme]
name = "acme"
"#;
        let config: ThemesmithConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.theme.name, "acme");
        assert_eq!(config.paths, PathsConfig::default());
        assert_eq!(config.style.browsers, vec!["> 1%".to_string()]);
        assert_eq!(config.script.target, "es2015");
        assert_eq!(config.watch.debounce_ms, 100);
        assert!(config.is_valid());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[theme]
name = "acme"

[paths]
sass = "scss"
css = "dist/css"

[style]
browsers = ["last 2 versions", "not dead"]
lint_config = "lint/sass.yml"

[script]
target = "es2017"

[images]
png_compression = "fast"
jpeg_quality = 70

[watch]
debounce_ms = 250
clear_screen = true
"#;
        let config: ThemesmithConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.paths.sass, PathBuf::from("scss"));
        assert_eq!(config.paths.css, PathBuf::from("dist/css"));
        assert_eq!(config.paths.js, PathBuf::from("js"));
        assert_eq!(config.style.browsers.len(), 2);
        assert_eq!(config.style.lint_config, PathBuf::from("lint/sass.yml"));
        assert_eq!(config.script.target, "es2017");
        assert_eq!(config.images.png_compression, PngCompression::Fast);
        assert_eq!(config.images.jpeg_quality, Some(70));
        assert!(config.watch.clear_screen);
    }

    #[test]
    fn test_missing_theme_section_fails() {
        let result: Result<ThemesmithConfig, _> = toml::from_str("[paths]\nsass = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_each_field() {
        let toml = r#"
[theme]
name = ""

[style]
browsers = []

[script]
target = " "

[images]
jpeg_quality = 0

[watch]
debounce_ms = 0
"#;
        let config: ThemesmithConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "theme.name",
                "style.browsers",
                "script.target",
                "images.jpeg_quality",
                "watch.debounce_ms"
            ]
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigValidationError {
            field: "script.target".to_string(),
            message: "must be a non-empty string".to_string(),
        };
        assert_eq!(err.to_string(), "themesmith.toml: 'script.target' must be a non-empty string");
    }
}
