//! Themesmith - command-line asset pipeline for CMS themes

use std::process::ExitCode;

use themesmith::cli;

fn main() -> ExitCode {
    cli::run()
}
