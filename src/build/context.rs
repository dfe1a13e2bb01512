//! Build context containing configuration and paths for a pipeline run.

use crate::config::loader::resolve_path;
use crate::config::ThemesmithConfig;
use crate::style::compile::MAPS_DIR;
use std::path::{Path, PathBuf};

/// Library scripts, concatenated ahead of the root scripts.
pub const LIB_DIR: &str = "lib";

/// Transpiler output directory under the script root.
pub const BABEL_DIR: &str = "babel";

/// Minifier output directory under the script root.
pub const DIST_DIR: &str = "dist";

/// Image sources directory under the image root.
pub const IMG_SRC_DIR: &str = "src";

/// Build context containing configuration and paths for a pipeline run.
///
/// Every directory accessor returns an absolute path when the theme root is
/// absolute; relative config paths are joined onto the theme root.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: ThemesmithConfig,
    /// Theme root directory (where themesmith.toml is located)
    theme_root: PathBuf,
    /// Whether to run in verbose mode
    verbose: bool,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: ThemesmithConfig, theme_root: PathBuf) -> Self {
        Self { config, theme_root, verbose: false }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ThemesmithConfig {
        &self.config
    }

    /// Get the theme root directory.
    pub fn theme_root(&self) -> &Path {
        &self.theme_root
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve a path relative to the theme root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        resolve_path(&self.theme_root, path)
    }

    /// SCSS source root.
    pub fn sass_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.sass)
    }

    /// CSS output root.
    pub fn css_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.css)
    }

    /// Source-map output directory.
    pub fn maps_dir(&self) -> PathBuf {
        self.css_dir().join(MAPS_DIR)
    }

    /// Script source root.
    pub fn js_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.js)
    }

    /// Library scripts.
    pub fn js_lib_dir(&self) -> PathBuf {
        self.js_dir().join(LIB_DIR)
    }

    /// Transpiled bundle directory.
    pub fn babel_dir(&self) -> PathBuf {
        self.js_dir().join(BABEL_DIR)
    }

    /// Minified bundle directory.
    pub fn dist_dir(&self) -> PathBuf {
        self.js_dir().join(DIST_DIR)
    }

    /// Image output directory.
    pub fn img_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.img)
    }

    /// Image source directory.
    pub fn img_src_dir(&self) -> PathBuf {
        self.img_dir().join(IMG_SRC_DIR)
    }

    /// Style lint rule file.
    pub fn style_lint_config(&self) -> PathBuf {
        self.resolve_path(&self.config.style.lint_config)
    }

    /// Script lint rule file.
    pub fn script_lint_config(&self) -> PathBuf {
        self.resolve_path(&self.config.script.lint_config)
    }
}
