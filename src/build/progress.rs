//! Run progress reporting.
//!
//! The runner and the watcher describe what they are doing as
//! [`ProgressEvent`]s; a [`ProgressReporter`] decides how to show them.
//! Lint reports travel through the same channel so they land in the same
//! stream as the task lines.
//!
//! # Example
//!
//! ```
//! use themesmith::build::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::with_output(std::io::stderr());
//! reporter.report(ProgressEvent::RunStarted { label: "build".to_string(), total_tasks: 3 });
//! ```

use crate::build::{TaskKind, TaskStatus};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Events that can be reported during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A sequence or task list started
    RunStarted {
        /// Sequence name or task list
        label: String,
        /// Number of tasks to run
        total_tasks: usize,
    },
    /// A task started
    TaskStarted {
        /// The task
        task: TaskKind,
    },
    /// A task completed
    TaskCompleted {
        /// The task
        task: TaskKind,
        /// Outcome
        status: TaskStatus,
        /// Duration in milliseconds
        duration_ms: u64,
    },
    /// A formatted lint report
    LintReport {
        /// Linting task
        task: TaskKind,
        /// Report text
        text: String,
    },
    /// The run completed
    RunCompleted {
        /// Whether every task succeeded
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Number of successful tasks
        succeeded: usize,
        /// Number of failed tasks
        failed: usize,
        /// Number of tasks never started
        not_run: usize,
    },
    /// A file change triggered a task
    Changed {
        /// Changed file, relative to the theme root when possible
        path: String,
        /// Task about to run
        task: TaskKind,
    },
    /// A warning was generated
    Warning {
        /// Task that generated the warning (if applicable)
        task: Option<TaskKind>,
        /// Warning message
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    /// Create a new null progress reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
    /// Current task count
    current: AtomicUsize,
    /// Total task count
    total: AtomicUsize,
    /// Output writer
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("current", &self.current)
            .field("total", &self.total)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Set whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { label, total_tasks } => {
                self.total.store(total_tasks, Ordering::SeqCst);
                self.current.store(0, Ordering::SeqCst);
                self.writeln(&format!(
                    "{} Running '{}' ({} task{})",
                    self.cyan("[run]"),
                    label,
                    total_tasks,
                    if total_tasks == 1 { "" } else { "s" }
                ));
            }
            ProgressEvent::TaskStarted { task } => {
                if self.verbose {
                    let current = self.current.load(Ordering::SeqCst) + 1;
                    let total = self.total.load(Ordering::SeqCst);
                    self.writeln(&format!(
                        "{} [{}/{}] Starting {}...",
                        self.cyan("[run]"),
                        current,
                        total,
                        task
                    ));
                }
            }
            ProgressEvent::TaskCompleted { task, status, duration_ms } => {
                let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                let total = self.total.load(Ordering::SeqCst).max(current);

                let status_str = match &status {
                    TaskStatus::Success => self.green("ok"),
                    TaskStatus::Skipped => self.yellow("skipped"),
                    TaskStatus::Failed(_) => self.red("FAILED"),
                };

                self.writeln(&format!(
                    "{} [{}/{}] {} {} ({})",
                    self.cyan("[run]"),
                    current,
                    total,
                    status_str,
                    task,
                    format_duration(duration_ms)
                ));

                if let TaskStatus::Failed(err) = status {
                    self.writeln(&format!("        {}", self.red(&err)));
                }
            }
            ProgressEvent::LintReport { task: _, text } => {
                self.writeln(text.trim_end_matches('\n'));
            }
            ProgressEvent::RunCompleted { success, duration_ms, succeeded, failed, not_run } => {
                let duration_str = format_duration(duration_ms);
                if success {
                    self.writeln(&format!(
                        "{} {} task{} in {}",
                        self.green("[done]"),
                        succeeded,
                        if succeeded == 1 { "" } else { "s" },
                        duration_str
                    ));
                } else {
                    self.writeln(&format!(
                        "{} {} succeeded, {} failed, {} not run in {}",
                        self.red("[error]"),
                        succeeded,
                        failed,
                        not_run,
                        duration_str
                    ));
                }
            }
            ProgressEvent::Changed { path, task } => {
                self.writeln(&format!("{} {} -> {}", self.cyan("[watch]"), path, task));
            }
            ProgressEvent::Warning { task, message } => {
                let prefix = match task {
                    Some(task) => format!("{}: ", task),
                    None => String::new(),
                };
                self.writeln(&format!("{} {}{}", self.yellow("[warn]"), prefix, message));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Format a duration in milliseconds to a human-readable string.
pub(crate) fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}
