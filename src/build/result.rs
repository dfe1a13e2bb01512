//! Run result types.
//!
//! Contains types for representing the outcome of tasks and sequences.

use crate::build::TaskKind;
use std::path::PathBuf;
use std::time::Duration;

/// Status of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task succeeded
    Success,
    /// Task not executed (dry run)
    Skipped,
    /// Task failed with error
    Failed(String),
}

impl TaskStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Skipped)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Skipped => write!(f, "skipped"),
            TaskStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of running a single task.
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// Task that ran
    pub task: TaskKind,
    /// Outcome
    pub status: TaskStatus,
    /// Files written
    pub outputs: Vec<PathBuf>,
    /// Task duration
    pub duration: Duration,
    /// Non-fatal problems (skipped stylesheets, lint warnings)
    pub warnings: Vec<String>,
}

impl TaskResult {
    /// Create a successful result.
    pub fn success(task: TaskKind, outputs: Vec<PathBuf>, duration: Duration) -> Self {
        Self { task, status: TaskStatus::Success, outputs, duration, warnings: vec![] }
    }

    /// Create a skipped result.
    pub fn skipped(task: TaskKind) -> Self {
        Self {
            task,
            status: TaskStatus::Skipped,
            outputs: vec![],
            duration: Duration::ZERO,
            warnings: vec![],
        }
    }

    /// Create a failed result.
    pub fn failed(task: TaskKind, error: String, duration: Duration) -> Self {
        Self { task, status: TaskStatus::Failed(error), outputs: vec![], duration, warnings: vec![] }
    }

    /// Add warnings to the result.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Check if this result is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of running a sequence or a list of tasks.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Sequence name, or the joined task names for ad-hoc runs
    pub label: String,
    /// Results of tasks that ran, in order
    pub tasks: Vec<TaskResult>,
    /// Tasks that never ran because an earlier one failed
    pub not_run: Vec<TaskKind>,
    /// Total duration
    pub total_duration: Duration,
}

impl RunResult {
    /// Create an empty result.
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Self::default() }
    }

    /// Add a task result.
    pub fn add_result(&mut self, result: TaskResult) {
        self.tasks.push(result);
    }

    /// Set the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    /// Number of tasks that succeeded.
    pub fn success_count(&self) -> usize {
        self.tasks.iter().filter(|r| matches!(r.status, TaskStatus::Success)).count()
    }

    /// Number of tasks skipped by a dry run.
    pub fn skipped_count(&self) -> usize {
        self.tasks.iter().filter(|r| matches!(r.status, TaskStatus::Skipped)).count()
    }

    /// Number of failed tasks.
    pub fn failed_count(&self) -> usize {
        self.tasks.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Check if the run succeeded (no failures).
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// The failing task, if any.
    pub fn failure(&self) -> Option<&TaskResult> {
        self.tasks.iter().find(|r| r.status.is_failure())
    }

    /// All files written.
    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.tasks.iter().flat_map(|r| r.outputs.iter()).collect()
    }

    /// All warnings.
    pub fn all_warnings(&self) -> Vec<&String> {
        self.tasks.iter().flat_map(|r| r.warnings.iter()).collect()
    }

    /// Format a summary of the run.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        match self.failure() {
            Some(failed) => {
                lines.push(format!(
                    "'{}' failed at {}: {} succeeded, {} not run",
                    self.label,
                    failed.task,
                    self.success_count(),
                    self.not_run.len()
                ));
                lines.push(format!("  - {}: {}", failed.task, failed.status));
            }
            None if self.skipped_count() > 0 => {
                let names: Vec<&str> = self.tasks.iter().map(|r| r.task.name()).collect();
                lines.push(format!("'{}' dry run: {}", self.label, names.join(" -> ")));
            }
            None => {
                lines.push(format!(
                    "'{}' succeeded: {} task{} in {:?}",
                    self.label,
                    self.success_count(),
                    if self.success_count() == 1 { "" } else { "s" },
                    self.total_duration
                ));
            }
        }

        let warnings = self.all_warnings();
        if !warnings.is_empty() {
            lines.push(format!("Warnings ({}):", warnings.len()));
            for warning in warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if warnings.len() > 5 {
                lines.push(format!("  ... and {} more", warnings.len() - 5));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_display() {
        assert_eq!(TaskStatus::Success.to_string(), "success");
        assert_eq!(TaskStatus::Skipped.to_string(), "skipped");
        assert_eq!(TaskStatus::Failed("boom".to_string()).to_string(), "failed: boom");
    }

    #[test]
    fn test_task_result_constructors() {
        let ok = TaskResult::success(
            TaskKind::StyleCompile,
            vec![PathBuf::from("css/style.css")],
            Duration::from_millis(10),
        );
        assert!(ok.is_success());
        assert_eq!(ok.outputs.len(), 1);

        let failed = TaskResult::failed(TaskKind::ScriptLint, "2 errors".to_string(), Duration::ZERO);
        assert!(!failed.is_success());
        assert!(failed.outputs.is_empty());
    }

    #[test]
    fn test_run_result_counts() {
        let mut result = RunResult::new("build");
        result.add_result(TaskResult::success(TaskKind::StyleCompile, vec![], Duration::ZERO));
        result.add_result(TaskResult::failed(
            TaskKind::ScriptTranspile,
            "parse error".to_string(),
            Duration::ZERO,
        ));
        result.not_run.push(TaskKind::ScriptMinify);

        assert_eq!(result.success_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.is_success());
        assert_eq!(result.failure().unwrap().task, TaskKind::ScriptTranspile);
    }

    #[test]
    fn test_summary_failure() {
        let mut result = RunResult::new("lint");
        result.add_result(TaskResult::failed(TaskKind::StyleLint, "1 error".to_string(), Duration::ZERO));
        result.not_run.push(TaskKind::ScriptLint);

        let summary = result.summary();
        assert!(summary.contains("'lint' failed at sass-lint"));
        assert!(summary.contains("1 not run"));
    }

    #[test]
    fn test_summary_success_with_warnings() {
        let mut result = RunResult::new("build");
        result.add_result(
            TaskResult::success(TaskKind::StyleCompile, vec![], Duration::ZERO)
                .with_warnings(vec!["sass/broken.scss: undefined variable".to_string()]),
        );
        let summary = result.with_duration(Duration::from_millis(5)).summary();
        assert!(summary.contains("'build' succeeded: 1 task"));
        assert!(summary.contains("Warnings (1)"));
    }

    #[test]
    fn test_summary_dry_run() {
        let mut result = RunResult::new("build");
        result.add_result(TaskResult::skipped(TaskKind::StyleCompile));
        result.add_result(TaskResult::skipped(TaskKind::ScriptTranspile));
        assert_eq!(result.summary(), "'build' dry run: sass -> js-babel");
    }
}
