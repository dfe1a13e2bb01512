//! Minification of the transpiled bundle.
//!
//! The work runs on its own thread; callers get a [`MinifyHandle`] and must
//! `wait` on it to learn whether it succeeded.

use super::ScriptError;
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions};
use oxc::minifier::{Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// Base name of the minified bundle.
pub const MINIFIED_BASENAME: &str = "app";

/// Suffix appended to the base name before the extension.
pub const MINIFIED_SUFFIX: &str = ".min";

/// File name of the minified bundle (`app.min.js`).
pub fn minified_file_name() -> String {
    format!("{}{}.js", MINIFIED_BASENAME, MINIFIED_SUFFIX)
}

/// Pending minification started by [`spawn_minify`].
#[derive(Debug)]
pub struct MinifyHandle {
    inner: JoinHandle<Result<Vec<PathBuf>, ScriptError>>,
}

impl MinifyHandle {
    /// Block until minification finishes.
    ///
    /// A panic on the worker is reported as a minify error.
    pub fn wait(self) -> Result<Vec<PathBuf>, ScriptError> {
        match self.inner.join() {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "minifier worker panicked".to_string());
                Err(ScriptError::Minify { path: PathBuf::new(), message })
            }
        }
    }
}

/// Start minifying every input into `<dist_dir>/app.min.js`.
///
/// Inputs are expected to be the single transpiled bundle; when there are
/// several, each one is minified to the same name in order, so the last one
/// wins.
pub fn spawn_minify(inputs: Vec<PathBuf>, dist_dir: PathBuf) -> MinifyHandle {
    let inner = thread::spawn(move || minify_files(&inputs, &dist_dir));
    MinifyHandle { inner }
}

/// Minify synchronously. See [`spawn_minify`].
pub fn minify_files(inputs: &[PathBuf], dist_dir: &Path) -> Result<Vec<PathBuf>, ScriptError> {
    if inputs.len() > 1 {
        tracing::warn!(count = inputs.len(), "more than one bundle to minify");
    }

    let output = dist_dir.join(minified_file_name());
    let mut outputs = Vec::new();

    for input in inputs {
        let source = fs::read_to_string(input).map_err(ScriptError::io(input))?;
        let minified = minify_source(input, &source)?;
        tracing::debug!(
            input = %input.display(),
            before = source.len(),
            after = minified.len(),
            "minified"
        );

        fs::create_dir_all(dist_dir).map_err(ScriptError::io(dist_dir))?;
        fs::write(&output, minified).map_err(ScriptError::io(&output))?;
        if !outputs.contains(&output) {
            outputs.push(output.clone());
        }
    }

    Ok(outputs)
}

/// Minify a script, never returning something larger than the input.
///
/// Compresses, mangles local names and prints without whitespace. A source
/// that does not parse is a [`ScriptError::Minify`].
pub fn minify_source(path: &Path, source: &str) -> Result<String, ScriptError> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let parsed = Parser::new(&allocator, source, source_type).parse();

    if !parsed.errors.is_empty() {
        let messages: Vec<String> = parsed.errors.iter().map(|e| e.to_string()).collect();
        return Err(ScriptError::Minify { path: path.to_path_buf(), message: messages.join("; ") });
    }

    let mut program = parsed.program;
    let minified = Minifier::new(MinifierOptions::default()).build(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions::minify())
        .with_scoping(minified.scoping)
        .build(&program)
        .code;

    if code.len() <= source.len() {
        Ok(code)
    } else {
        Ok(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_minified_file_name() {
        assert_eq!(minified_file_name(), "app.min.js");
    }

    #[test]
    fn test_minify_source_shrinks() {
        let src = "// helper\nfunction add(first, second) {\n    return first + second;\n}\n\n/* block */\nwindow.total = add(1, 2);\n";
        let out = minify_source(Path::new("transpiled.js"), src).unwrap();
        assert!(out.len() < src.len());
        assert!(!out.contains("helper"));
        assert!(!out.contains("block"));
        assert!(out.contains("window.total"));
    }

    #[test]
    fn test_minify_source_rejects_invalid_script() {
        let result = minify_source(Path::new("transpiled.js"), "function (( {{ = ;");
        assert!(matches!(result, Err(ScriptError::Minify { .. })));
    }

    #[test]
    fn test_handle_writes_single_output() {
        let temp = TempDir::new().unwrap();
        let babel = temp.path().join("babel");
        fs::create_dir_all(&babel).unwrap();
        let input = babel.join("transpiled.js");
        fs::write(&input, "function  greet ( name ) {\n  return 'hi ' + name ;\n}\n").unwrap();

        let dist = temp.path().join("dist");
        let outputs = spawn_minify(vec![input.clone()], dist.clone()).wait().unwrap();

        assert_eq!(outputs, vec![dist.join("app.min.js")]);
        assert_eq!(fs::read_dir(&dist).unwrap().count(), 1);
        let size_in = fs::metadata(&input).unwrap().len();
        let size_out = fs::metadata(&outputs[0]).unwrap().len();
        assert!(size_out <= size_in);
    }

    #[test]
    fn test_invalid_script_fails_through_handle() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("transpiled.js");
        fs::write(&input, "function (( {{ = ;\n").unwrap();

        let dist = temp.path().join("dist");
        let result = spawn_minify(vec![input.clone()], dist.clone()).wait();

        match result {
            Err(ScriptError::Minify { path, .. }) => assert_eq!(path, input),
            other => panic!("expected minify error, got {:?}", other),
        }
        assert!(!dist.join("app.min.js").exists());
    }

    #[test]
    fn test_missing_input_fails_through_handle() {
        let temp = TempDir::new().unwrap();
        let result =
            spawn_minify(vec![temp.path().join("missing.js")], temp.path().join("dist")).wait();
        assert!(matches!(result, Err(ScriptError::Io { .. })));
    }

    #[test]
    fn test_no_inputs_no_outputs() {
        let temp = TempDir::new().unwrap();
        let outputs = minify_files(&[], &temp.path().join("dist")).unwrap();
        assert!(outputs.is_empty());
    }
}
