//! Downlevel compilation and concatenation of theme scripts.

use oxc::allocator::Allocator;
use oxc::codegen::Codegen;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the combined bundle.
pub const TRANSPILED_FILE: &str = "transpiled.js";

/// Error from the transpile or minify steps.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The downlevel target is not understood
    #[error("Invalid script target '{target}': {message}")]
    Target {
        /// Requested target
        target: String,
        /// Resolver message
        message: String,
    },
    /// A source failed to parse
    #[error("Failed to parse {}: {message}", path.display())]
    Parse {
        /// Source file
        path: PathBuf,
        /// Parser messages
        message: String,
    },
    /// The transformer rejected a source
    #[error("Failed to transform {}: {message}", path.display())]
    Transform {
        /// Source file
        path: PathBuf,
        /// Transformer messages
        message: String,
    },
    /// Minification failed
    #[error("Failed to minify {}: {message}", path.display())]
    Minify {
        /// Input file
        path: PathBuf,
        /// Failure description
        message: String,
    },
    /// Reading or writing a file failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl ScriptError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| ScriptError::Io { path: path.to_path_buf(), source }
    }
}

/// Downlevel-compile one source text.
pub fn transpile_source(
    path: &Path,
    source: &str,
    options: &TransformOptions,
) -> Result<String, ScriptError> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let parsed = Parser::new(&allocator, source, source_type).parse();

    if !parsed.errors.is_empty() {
        return Err(ScriptError::Parse {
            path: path.to_path_buf(),
            message: join_messages(parsed.errors.iter().map(|e| e.to_string())),
        });
    }

    let mut program = parsed.program;
    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let transformed =
        Transformer::new(&allocator, path, options).build_with_scoping(scoping, &mut program);

    if !transformed.errors.is_empty() {
        return Err(ScriptError::Transform {
            path: path.to_path_buf(),
            message: join_messages(transformed.errors.iter().map(|e| e.to_string())),
        });
    }

    Ok(Codegen::new().build(&program).code)
}

/// Resolve a target name such as `es2015` into transform options.
pub fn transform_options(target: &str) -> Result<TransformOptions, ScriptError> {
    TransformOptions::from_target(target).map_err(|e| ScriptError::Target {
        target: target.to_string(),
        message: e.to_string(),
    })
}

/// Transpile `sources` in order and concatenate them into
/// `<out_dir>/transpiled.js`.
///
/// Returns `None` when there is nothing to transpile. Any parse or
/// transform error fails the whole step and nothing is written.
pub fn transpile_bundle(
    sources: &[PathBuf],
    out_dir: &Path,
    target: &str,
) -> Result<Option<PathBuf>, ScriptError> {
    if sources.is_empty() {
        tracing::info!("no script sources to transpile");
        return Ok(None);
    }

    let options = transform_options(target)?;
    let mut parts = Vec::with_capacity(sources.len());
    for path in sources {
        let source = fs::read_to_string(path).map_err(ScriptError::io(path))?;
        let code = transpile_source(path, &source, &options)?;
        tracing::debug!(file = %path.display(), bytes = code.len(), "transpiled");
        parts.push(code);
    }

    fs::create_dir_all(out_dir).map_err(ScriptError::io(out_dir))?;
    let output = out_dir.join(TRANSPILED_FILE);
    fs::write(&output, concat(&parts)).map_err(ScriptError::io(&output))?;
    Ok(Some(output))
}

/// Join chunks with a newline, making sure each chunk ends with one.
fn concat(parts: &[String]) -> String {
    let mut out = String::new();
    for part in parts {
        out.push_str(part);
        if !part.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

fn join_messages(messages: impl Iterator<Item = String>) -> String {
    messages.collect::<Vec<_>>().join("; ")
}
