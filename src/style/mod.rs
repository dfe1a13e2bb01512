//! Stylesheet tasks: SCSS linting and compilation.

pub mod compile;
pub mod lint;

pub use compile::{compile_all, compile_file, CompileOptions, CompileOutcome, StyleError};
pub use lint::StyleLinter;
