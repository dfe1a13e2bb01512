//! Source file discovery for the pipeline tasks.
//!
//! Every task reads its inputs from fixed locations under the theme root;
//! results are always sorted so runs are reproducible.

use crate::build::BuildContext;
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during source discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Parser error
        #[source]
        source: glob::PatternError,
    },
}

/// Discover files under `base_dir` matching a glob pattern.
///
/// Only regular files are returned. When `extension` is given, other
/// extensions are dropped. A missing base directory yields no files.
pub fn discover_files(
    base_dir: &Path,
    pattern: &str,
    extension: Option<&str>,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let full_pattern = format!("{}/{}", Pattern::escape(&base_dir.to_string_lossy()), pattern);

    let paths = glob(&full_pattern)
        .map_err(|source| DiscoveryError::InvalidPattern { pattern: pattern.to_string(), source })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                let ext_ok = extension
                    .map(|want| path.extension().and_then(|e| e.to_str()) == Some(want))
                    .unwrap_or(true);
                if path.is_file() && ext_ok {
                    files.push(path);
                }
            }
            Err(e) => tracing::warn!("error reading path: {}", e),
        }
    }

    files.sort();
    Ok(files)
}

/// Every `.scss` file under the style root, recursively.
pub fn style_sources(ctx: &BuildContext) -> Result<Vec<PathBuf>, DiscoveryError> {
    discover_files(&ctx.sass_dir(), "**/*.scss", Some("scss"))
}

/// Root scripts checked by the linter (library scripts are not linted).
pub fn script_lint_sources(ctx: &BuildContext) -> Result<Vec<PathBuf>, DiscoveryError> {
    discover_files(&ctx.js_dir(), "*.js", Some("js"))
}

/// Transpiler inputs: library scripts first, then root scripts.
pub fn transpile_sources(ctx: &BuildContext) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = discover_files(&ctx.js_lib_dir(), "*.js", Some("js"))?;
    files.extend(discover_files(&ctx.js_dir(), "*.js", Some("js"))?);
    Ok(files)
}

/// Minifier inputs: everything the transpiler left behind.
pub fn minify_sources(ctx: &BuildContext) -> Result<Vec<PathBuf>, DiscoveryError> {
    discover_files(&ctx.babel_dir(), "*.js", Some("js"))
}

/// Image sources, non-recursive.
pub fn image_sources(ctx: &BuildContext) -> Result<Vec<PathBuf>, DiscoveryError> {
    discover_files(&ctx.img_src_dir(), "*", None)
}
