//! Task command implementations (build, lint, run, images, list)

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::progress::ConsoleProgress;
use crate::build::{parse_task_names, BuildContext, PipelineError, RunResult, TaskKind, TaskRunner};

/// Create a runner that reports to the terminal.
pub(crate) fn console_runner(context: BuildContext, dry_run: bool) -> TaskRunner {
    let verbose = context.is_verbose();
    let progress = ConsoleProgress::with_output(std::io::stdout())
        .with_colors(std::io::stdout().is_terminal())
        .with_verbose(verbose);
    TaskRunner::new(context).with_progress(Arc::new(progress)).with_dry_run(dry_run)
}

/// Run a named sequence
pub fn run_sequence(context: BuildContext, name: &str, dry_run: bool) -> ExitCode {
    let runner = console_runner(context, dry_run);
    finish(runner.run_sequence(name))
}

/// Run individual tasks by name
pub fn run_tasks(context: BuildContext, names: &[String], with_deps: bool, dry_run: bool) -> ExitCode {
    let tasks = match parse_task_names(names) {
        Ok(tasks) => tasks,
        Err(e) => {
            eprintln!("Error: {}", e);
            let known: Vec<&str> = TaskKind::ALL.iter().map(|t| t.name()).collect();
            eprintln!("Known tasks: {}", known.join(", "));
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let runner = console_runner(context, dry_run);
    finish(runner.run_tasks(&tasks, with_deps))
}

/// Run the image minifier
pub fn run_images(context: BuildContext) -> ExitCode {
    let runner = console_runner(context, false);
    finish(runner.run_tasks(&[TaskKind::ImageMinify], false))
}

/// Print the pipeline definition
pub fn run_list(context: BuildContext) -> ExitCode {
    let runner = TaskRunner::new(context);
    let pipeline = runner.pipeline();

    println!("Sequences:");
    for sequence in pipeline.sequences() {
        let names: Vec<&str> = sequence.tasks.iter().map(|t| t.name()).collect();
        println!("  {:<10} {}", sequence.name, names.join(" -> "));
    }
    println!("  {:<10} watch and re-run linters", "watch-lint");

    println!("\nTasks:");
    for def in pipeline.tasks() {
        let deps = if def.dependencies.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = def.dependencies.iter().map(|t| t.name()).collect();
            format!(" (after {})", names.join(", "))
        };
        println!("  {:<10} {}{}", def.kind.name(), def.kind.description(), deps);
    }

    println!("\nWatch rules:");
    for rule in pipeline.watch_rules() {
        let mut globs = rule.include.join(", ");
        if !rule.exclude.is_empty() {
            globs.push_str(&format!(" (except {})", rule.exclude.join(", ")));
        }
        println!("  {} -> {}", globs, rule.task);
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Print the run summary and map it to an exit code.
fn finish(result: Result<RunResult, PipelineError>) -> ExitCode {
    match result {
        Ok(result) => {
            println!("{}", result.summary());
            if result.is_success() {
                ExitCode::from(EXIT_SUCCESS)
            } else {
                ExitCode::from(EXIT_ERROR)
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_INVALID_ARGS)
        }
    }
}
