//! Task execution.
//!
//! The [`TaskRunner`] executes sequences and task lists from a [`Pipeline`]
//! one task after another and stops at the first failure.

use crate::build::discovery::{
    image_sources, minify_sources, script_lint_sources, style_sources, transpile_sources,
};
use crate::build::progress::{NullProgress, ProgressEvent, ProgressReporter};
use crate::build::{BuildContext, PlanError, Pipeline, RunResult, TaskKind, TaskResult};
use crate::images::minify_images;
use crate::lint::{lint_files, load_rule_overrides, FailPolicy, LintReport, Linter, RuleSet};
use crate::script::{self, spawn_minify, transpile_bundle, ScriptLinter};
use crate::style::{self, compile_all, CompileOptions, StyleLinter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Error that prevents a run from starting.
///
/// Task failures are not errors at this level; they are recorded in the
/// [`RunResult`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unknown sequence or task, or a dependency cycle
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// What a successful task produced.
#[derive(Debug, Default)]
struct TaskOutput {
    outputs: Vec<PathBuf>,
    warnings: Vec<String>,
}

/// Executes pipeline tasks against a theme.
pub struct TaskRunner {
    /// Build context
    context: BuildContext,
    /// What can run
    pipeline: Pipeline,
    /// Where progress goes
    progress: Arc<dyn ProgressReporter>,
    /// Whether to only report the plan
    dry_run: bool,
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("context", &self.context)
            .field("pipeline", &self.pipeline)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl TaskRunner {
    /// Create a runner for the standard theme pipeline.
    pub fn new(context: BuildContext) -> Self {
        let pipeline = Pipeline::theme(&context.config().paths);
        Self { context, pipeline, progress: Arc::new(NullProgress::new()), dry_run: false }
    }

    /// Replace the pipeline definition.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Set the progress reporter.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Set dry-run mode (report the plan, run nothing).
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The build context.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// The pipeline definition.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The progress reporter.
    pub fn progress(&self) -> &Arc<dyn ProgressReporter> {
        &self.progress
    }

    /// Run a named sequence.
    pub fn run_sequence(&self, name: &str) -> Result<RunResult, PipelineError> {
        let tasks = self.pipeline.sequence(name)?.tasks.clone();
        Ok(self.execute(name, &tasks))
    }

    /// Run tasks by kind, optionally pulling in their dependencies.
    pub fn run_tasks(&self, tasks: &[TaskKind], with_deps: bool) -> Result<RunResult, PipelineError> {
        let order = self.pipeline.resolve(tasks, with_deps)?;
        let label = order.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ");
        Ok(self.execute(&label, &order))
    }

    /// Run tasks in order, stopping at the first failure.
    fn execute(&self, label: &str, order: &[TaskKind]) -> RunResult {
        let start = Instant::now();
        let mut result = RunResult::new(label);

        tracing::debug!(run = label, tasks = order.len(), dry_run = self.dry_run, "starting run");
        self.progress.report(ProgressEvent::RunStarted {
            label: label.to_string(),
            total_tasks: order.len(),
        });

        for (index, task) in order.iter().enumerate() {
            let task_result =
                if self.dry_run { TaskResult::skipped(*task) } else { self.run_task(*task) };
            let failed = task_result.status.is_failure();
            result.add_result(task_result);

            if failed {
                result.not_run = order[index + 1..].to_vec();
                break;
            }
        }

        let result = result.with_duration(start.elapsed());
        self.progress.report(ProgressEvent::RunCompleted {
            success: result.is_success(),
            duration_ms: result.total_duration.as_millis() as u64,
            succeeded: result.success_count(),
            failed: result.failed_count(),
            not_run: result.not_run.len(),
        });
        result
    }

    /// Run a single task and report it.
    pub fn run_task(&self, task: TaskKind) -> TaskResult {
        let start = Instant::now();
        self.progress.report(ProgressEvent::TaskStarted { task });

        let outcome = match task {
            TaskKind::StyleLint => self.style_lint(),
            TaskKind::StyleCompile => self.style_compile(),
            TaskKind::ScriptLint => self.script_lint(),
            TaskKind::ScriptTranspile => self.script_transpile(),
            TaskKind::ScriptMinify => self.script_minify(),
            TaskKind::ImageMinify => self.image_minify(),
        };
        let duration = start.elapsed();

        let result = match outcome {
            Ok(output) => {
                for warning in &output.warnings {
                    self.progress.report(ProgressEvent::Warning {
                        task: Some(task),
                        message: warning.clone(),
                    });
                }
                TaskResult::success(task, output.outputs, duration).with_warnings(output.warnings)
            }
            Err(message) => {
                tracing::debug!(task = %task, "task failed: {}", message);
                TaskResult::failed(task, message, duration)
            }
        };

        self.progress.report(ProgressEvent::TaskCompleted {
            task,
            status: result.status.clone(),
            duration_ms: duration.as_millis() as u64,
        });
        result
    }

    fn style_lint(&self) -> Result<TaskOutput, String> {
        let rules = self.load_rules(
            TaskKind::StyleLint,
            style::lint::DEFAULT_RULES,
            self.context.style_lint_config(),
        )?;
        let files = style_sources(&self.context).map_err(|e| e.to_string())?;
        self.lint(TaskKind::StyleLint, &StyleLinter::new(rules), &files, FailPolicy::OnError)
    }

    fn script_lint(&self) -> Result<TaskOutput, String> {
        let rules = self.load_rules(
            TaskKind::ScriptLint,
            script::lint::DEFAULT_RULES,
            self.context.script_lint_config(),
        )?;
        let files = script_lint_sources(&self.context).map_err(|e| e.to_string())?;
        self.lint(TaskKind::ScriptLint, &ScriptLinter::new(rules), &files, FailPolicy::AfterAll)
    }

    /// Built-in defaults overlaid with the theme's rule file.
    fn load_rules(
        &self,
        task: TaskKind,
        defaults: &[(&str, crate::lint::Severity)],
        rule_file: PathBuf,
    ) -> Result<RuleSet, String> {
        let mut rules = RuleSet::new(defaults);
        let overrides = load_rule_overrides(&rule_file).map_err(|e| e.to_string())?;
        for unknown in rules.apply(&overrides) {
            self.progress.report(ProgressEvent::Warning {
                task: Some(task),
                message: format!("unknown rule '{}' in {}", unknown, rule_file.display()),
            });
        }
        Ok(rules)
    }

    fn lint(
        &self,
        task: TaskKind,
        linter: &dyn Linter,
        files: &[PathBuf],
        policy: FailPolicy,
    ) -> Result<TaskOutput, String> {
        let report = lint_files(linter, files, policy).map_err(|e| e.to_string())?;
        self.print_report(task, &report);

        if report.has_errors() {
            let errors = report.error_count();
            let mut message =
                format!("{} error{} reported", errors, if errors == 1 { "" } else { "s" });
            if report.stopped_early {
                message.push_str(&format!(
                    " (stopped after {} of {} files)",
                    report.files_checked,
                    files.len()
                ));
            }
            return Err(message);
        }

        let warnings = report.warning_count();
        let mut output = TaskOutput::default();
        if warnings > 0 {
            output
                .warnings
                .push(format!("{} lint warning{}", warnings, if warnings == 1 { "" } else { "s" }));
        }
        Ok(output)
    }

    fn print_report(&self, task: TaskKind, report: &LintReport) {
        let text = report.format(Some(self.context.theme_root()));
        if !text.is_empty() {
            self.progress.report(ProgressEvent::LintReport { task, text });
        }
    }

    fn style_compile(&self) -> Result<TaskOutput, String> {
        let sources = style_sources(&self.context).map_err(|e| e.to_string())?;
        let options = CompileOptions {
            sass_dir: self.context.sass_dir(),
            css_dir: self.context.css_dir(),
            browsers: self.context.config().style.browsers.clone(),
        };
        let outcome = compile_all(&options, &sources).map_err(|e| e.to_string())?;
        Ok(TaskOutput { outputs: outcome.outputs, warnings: outcome.errors })
    }

    fn script_transpile(&self) -> Result<TaskOutput, String> {
        let sources = transpile_sources(&self.context).map_err(|e| e.to_string())?;
        let output = transpile_bundle(
            &sources,
            &self.context.babel_dir(),
            &self.context.config().script.target,
        )
        .map_err(|e| e.to_string())?;
        Ok(TaskOutput { outputs: output.into_iter().collect(), warnings: vec![] })
    }

    fn script_minify(&self) -> Result<TaskOutput, String> {
        let inputs = minify_sources(&self.context).map_err(|e| e.to_string())?;
        let handle = spawn_minify(inputs, self.context.dist_dir());
        let outputs = handle.wait().map_err(|e| e.to_string())?;
        Ok(TaskOutput { outputs, warnings: vec![] })
    }

    fn image_minify(&self) -> Result<TaskOutput, String> {
        let sources = image_sources(&self.context).map_err(|e| e.to_string())?;
        let outcomes =
            minify_images(&sources, &self.context.img_dir(), &self.context.config().images)
                .map_err(|e| e.to_string())?;
        let saved: u64 = outcomes.iter().map(|o| o.saved()).sum();
        tracing::info!(images = outcomes.len(), saved_bytes = saved, "images minified");
        Ok(TaskOutput { outputs: outcomes.into_iter().map(|o| o.output).collect(), warnings: vec![] })
    }
}
