//! Watch command implementation (watch-lint)

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use super::build::console_runner;
use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::BuildContext;
use crate::watch::{watch_lint, NotifySource};

/// Start the lint watchers and block until the process is interrupted
pub fn run_watch_lint(context: BuildContext) -> ExitCode {
    let debounce = Duration::from_millis(u64::from(context.config().watch.debounce_ms));
    let root = context.theme_root().to_path_buf();
    let runner = Arc::new(console_runner(context, false));

    let handle = match watch_lint(runner, Box::new(NotifySource::new(debounce)), None) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Watch error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("Watching {} for changes...", root.display());
    println!("Press Ctrl+C to stop");
    handle.wait();
    ExitCode::from(EXIT_SUCCESS)
}
