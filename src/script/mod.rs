//! Script tasks: linting, transpiling and minification.

pub mod lint;
pub mod minify;
pub mod transpile;

pub use lint::ScriptLinter;
pub use minify::{minified_file_name, spawn_minify, MinifyHandle};
pub use transpile::{transpile_bundle, ScriptError, TRANSPILED_FILE};
