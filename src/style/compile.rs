//! SCSS to CSS compilation.
//!
//! Each entry point goes through grass (Sass semantics), then lightningcss
//! (vendor prefixing for the configured browsers and printing with a source
//! map). Compiler errors are logged and the file is skipped; they never abort
//! the run.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directory under the CSS output that holds source maps.
pub const MAPS_DIR: &str = "maps";

/// Fatal error for the whole compile step.
#[derive(Debug, Error)]
pub enum StyleError {
    /// The browserslist query could not be resolved
    #[error("Invalid browser query {query:?}: {message}")]
    Browsers {
        /// The joined query
        query: String,
        /// Resolver message
        message: String,
    },
    /// Writing an output file failed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// Output path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Where to read sources and write CSS.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// SCSS source root (also the Sass load path)
    pub sass_dir: PathBuf,
    /// CSS output root
    pub css_dir: PathBuf,
    /// Browserslist queries for prefixing
    pub browsers: Vec<String>,
}

/// Files written and per-file errors that were logged.
#[derive(Debug, Default)]
pub struct CompileOutcome {
    /// CSS and map files written
    pub outputs: Vec<PathBuf>,
    /// Compiler messages for skipped files
    pub errors: Vec<String>,
}

/// A single compiled stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCss {
    /// Printed CSS without the mapping comment
    pub css: String,
    /// Source map JSON
    pub map: String,
}

/// Resolve browserslist queries into lightningcss targets.
pub fn resolve_targets(browsers: &[String]) -> Result<Targets, StyleError> {
    let resolved = Browsers::from_browserslist(browsers.iter().map(String::as_str)).map_err(|e| {
        StyleError::Browsers { query: browsers.join(", "), message: e.to_string() }
    })?;
    Ok(Targets { browsers: resolved, ..Targets::default() })
}

/// Compile every entry point under `sass_dir`.
///
/// Partials (`_name.scss`) are skipped; they are only reachable through
/// `@use`/`@import`.
pub fn compile_all(
    options: &CompileOptions,
    sources: &[PathBuf],
) -> Result<CompileOutcome, StyleError> {
    let targets = resolve_targets(&options.browsers)?;
    let mut outcome = CompileOutcome::default();

    for source in sources {
        if is_partial(source) {
            continue;
        }

        let rel = source.strip_prefix(&options.sass_dir).unwrap_or(source).with_extension("css");
        let compiled = match compile_file(source, &options.sass_dir, &rel, targets) {
            Ok(compiled) => compiled,
            Err(message) => {
                tracing::error!(file = %source.display(), "{}", message);
                outcome.errors.push(format!("{}: {}", source.display(), message));
                continue;
            }
        };

        let css_path = options.css_dir.join(&rel);
        let map_rel = Path::new(MAPS_DIR).join(format!("{}.map", rel.display()));
        let map_path = options.css_dir.join(&map_rel);

        write_file(&map_path, &compiled.map)?;
        let css = format!(
            "{}\n/*# sourceMappingURL={} */\n",
            compiled.css.trim_end(),
            mapping_url(&rel, &map_rel)
        );
        write_file(&css_path, &css)?;

        tracing::debug!(css = %css_path.display(), map = %map_path.display(), "compiled stylesheet");
        outcome.outputs.push(css_path);
        outcome.outputs.push(map_path);
    }

    Ok(outcome)
}

/// Compile one SCSS file to prefixed CSS plus a source map.
///
/// `output_name` is the CSS path relative to the output root; it names the
/// map's `file` entry. Errors are returned as display strings.
pub fn compile_file(
    source: &Path,
    load_path: &Path,
    output_name: &Path,
    targets: Targets,
) -> Result<CompiledCss, String> {
    let grass_options =
        grass::Options::default().style(grass::OutputStyle::Expanded).load_path(load_path);
    let css = grass::from_path(source, &grass_options).map_err(|e| e.to_string())?;

    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());

    // Positions are recorded against the Sass output, so that text is the
    // map's only source; grass emits no map to chain back to the SCSS.
    let intermediate_name = format!("{}.css", source_name);
    let mut source_map = SourceMap::new("/");
    source_map.add_source(&intermediate_name);
    source_map.set_source_content(0, &css).map_err(|e| format!("{:?}", e))?;

    let mut stylesheet = StyleSheet::parse(
        &css,
        ParserOptions { filename: intermediate_name, ..ParserOptions::default() },
    )
    .map_err(|e| e.to_string())?;

    stylesheet
        .minify(MinifyOptions { targets, ..MinifyOptions::default() })
        .map_err(|e| e.to_string())?;

    let printed = stylesheet
        .to_css(PrinterOptions {
            targets,
            source_map: Some(&mut source_map),
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let map = source_map.to_json(None).map_err(|e| format!("{:?}", e))?;
    let map = with_file_entry(&map, output_name);

    Ok(CompiledCss { css: printed.code, map })
}

/// Whether a style source is a partial.
pub fn is_partial(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with('_'))
}

/// Relative URL from a CSS file to its map, both relative to the CSS root.
fn mapping_url(css_rel: &Path, map_rel: &Path) -> String {
    let depth = css_rel
        .parent()
        .map(|p| p.components().filter(|c| matches!(c, Component::Normal(_))).count())
        .unwrap_or(0);
    let mut url = "../".repeat(depth);
    let parts: Vec<String> =
        map_rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    url.push_str(&parts.join("/"));
    url
}

/// Add the `file` field naming the generated CSS to a source-map JSON.
fn with_file_entry(map_json: &str, output_name: &Path) -> String {
    match serde_json::from_str::<serde_json::Value>(map_json) {
        Ok(serde_json::Value::Object(mut obj)) => {
            let file = output_name
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            obj.insert("file".to_string(), serde_json::Value::String(file));
            serde_json::Value::Object(obj).to_string()
        }
        _ => map_json.to_string(),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), StyleError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| StyleError::Write { path: parent.to_path_buf(), source })?;
    }
    fs::write(path, contents).map_err(|source| StyleError::Write { path: path.to_path_buf(), source })
}
