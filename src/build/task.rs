//! Task and pipeline definitions.
//!
//! A [`Pipeline`] is plain data: the tasks that exist, the dependencies
//! between them, the named sequences that chain them, and the watch rules
//! that re-trigger them. Nothing is registered globally; the runner in
//! [`crate::build::pipeline`] executes whatever a pipeline value describes.

use crate::config::PathsConfig;
use std::collections::HashSet;
use thiserror::Error;

/// A unit of work the runner knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Lint SCSS sources
    StyleLint,
    /// Compile SCSS to prefixed CSS with maps
    StyleCompile,
    /// Lint root scripts
    ScriptLint,
    /// Transpile and concatenate scripts
    ScriptTranspile,
    /// Minify the transpiled bundle
    ScriptMinify,
    /// Recompress images
    ImageMinify,
}

impl TaskKind {
    /// Every task, in definition order.
    pub const ALL: [TaskKind; 6] = [
        TaskKind::StyleLint,
        TaskKind::StyleCompile,
        TaskKind::ScriptLint,
        TaskKind::ScriptTranspile,
        TaskKind::ScriptMinify,
        TaskKind::ImageMinify,
    ];

    /// Name used on the command line and in reports.
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::StyleLint => "sass-lint",
            TaskKind::StyleCompile => "sass",
            TaskKind::ScriptLint => "js-lint",
            TaskKind::ScriptTranspile => "js-babel",
            TaskKind::ScriptMinify => "js-uglify",
            TaskKind::ImageMinify => "images",
        }
    }

    /// Look a task up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// One-line description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            TaskKind::StyleLint => "lint SCSS sources",
            TaskKind::StyleCompile => "compile SCSS to CSS with source maps",
            TaskKind::ScriptLint => "lint root scripts",
            TaskKind::ScriptTranspile => "transpile and concatenate scripts",
            TaskKind::ScriptMinify => "minify the script bundle",
            TaskKind::ImageMinify => "recompress images",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A task together with the tasks whose outputs it consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDef {
    /// The task
    pub kind: TaskKind,
    /// Tasks that must have run before this one
    pub dependencies: Vec<TaskKind>,
}

impl TaskDef {
    /// A task with no dependencies.
    pub fn new(kind: TaskKind) -> Self {
        Self { kind, dependencies: vec![] }
    }

    /// Add a dependency to this task.
    pub fn with_dependency(mut self, dep: TaskKind) -> Self {
        self.dependencies.push(dep);
        self
    }
}

/// A named, ordered chain of tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// Sequence name (e.g. "build")
    pub name: String,
    /// Tasks, run left to right
    pub tasks: Vec<TaskKind>,
}

/// Which task a change to matching files re-runs.
///
/// Globs are relative to the theme root and use `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRule {
    /// Files that trigger the task
    pub include: Vec<String>,
    /// Files excluded even when included
    pub exclude: Vec<String>,
    /// Task to run
    pub task: TaskKind,
}

/// Error while resolving what to run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// No sequence with that name
    #[error("Unknown sequence '{0}'")]
    UnknownSequence(String),
    /// No task with that name
    #[error("Unknown task '{0}'")]
    UnknownTask(String),
    /// Circular dependency detected
    #[error("Circular dependency detected involving task '{0}'")]
    CyclicDependency(TaskKind),
}

/// Name of the compile-and-bundle sequence.
pub const BUILD_SEQUENCE: &str = "build";

/// Name of the lint sequence.
pub const LINT_SEQUENCE: &str = "lint";

/// The complete definition of what can run.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    tasks: Vec<TaskDef>,
    sequences: Vec<Sequence>,
    watch_rules: Vec<WatchRule>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard theme pipeline for a directory layout.
    pub fn theme(paths: &PathsConfig) -> Self {
        let mut pipeline = Self::new();
        for kind in TaskKind::ALL {
            let def = match kind {
                TaskKind::ScriptMinify => TaskDef::new(kind).with_dependency(TaskKind::ScriptTranspile),
                _ => TaskDef::new(kind),
            };
            pipeline.add_task(def);
        }

        pipeline.add_sequence(
            BUILD_SEQUENCE,
            vec![TaskKind::StyleCompile, TaskKind::ScriptTranspile, TaskKind::ScriptMinify],
        );
        pipeline.add_sequence(LINT_SEQUENCE, vec![TaskKind::StyleLint, TaskKind::ScriptLint]);

        let sass = glob_dir(&paths.sass);
        let js = glob_dir(&paths.js);
        pipeline.add_watch_rule(WatchRule {
            include: vec![format!("{}/**/*.scss", sass)],
            exclude: vec![],
            task: TaskKind::StyleLint,
        });
        pipeline.add_watch_rule(WatchRule {
            include: vec![format!("{}/**/*.js", js)],
            exclude: vec![format!("{}/{}/*.js", js, crate::build::DIST_DIR)],
            task: TaskKind::ScriptLint,
        });

        pipeline
    }

    /// Add or replace a task definition.
    pub fn add_task(&mut self, def: TaskDef) {
        self.tasks.retain(|t| t.kind != def.kind);
        self.tasks.push(def);
    }

    /// Add a named sequence.
    pub fn add_sequence(&mut self, name: &str, tasks: Vec<TaskKind>) {
        self.sequences.push(Sequence { name: name.to_string(), tasks });
    }

    /// Add a watch rule.
    pub fn add_watch_rule(&mut self, rule: WatchRule) {
        self.watch_rules.push(rule);
    }

    /// All task definitions.
    pub fn tasks(&self) -> &[TaskDef] {
        &self.tasks
    }

    /// All sequences.
    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    /// All watch rules.
    pub fn watch_rules(&self) -> &[WatchRule] {
        &self.watch_rules
    }

    /// Look up a task definition.
    pub fn task(&self, kind: TaskKind) -> Option<&TaskDef> {
        self.tasks.iter().find(|t| t.kind == kind)
    }

    /// Look up a sequence by name.
    pub fn sequence(&self, name: &str) -> Result<&Sequence, PlanError> {
        self.sequences
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| PlanError::UnknownSequence(name.to_string()))
    }

    /// Order the requested tasks for execution.
    ///
    /// Without `with_deps` the tasks run exactly as given. With it, declared
    /// dependencies are pulled in and placed before their dependents; each
    /// task appears once.
    pub fn resolve(&self, requested: &[TaskKind], with_deps: bool) -> Result<Vec<TaskKind>, PlanError> {
        if !with_deps {
            let mut seen = HashSet::new();
            return Ok(requested.iter().copied().filter(|t| seen.insert(*t)).collect());
        }

        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();
        for kind in requested {
            self.visit_task(*kind, &mut visited, &mut visiting, &mut result)?;
        }
        Ok(result)
    }

    fn visit_task(
        &self,
        kind: TaskKind,
        visited: &mut HashSet<TaskKind>,
        visiting: &mut HashSet<TaskKind>,
        result: &mut Vec<TaskKind>,
    ) -> Result<(), PlanError> {
        if visited.contains(&kind) {
            return Ok(());
        }
        if !visiting.insert(kind) {
            return Err(PlanError::CyclicDependency(kind));
        }

        if let Some(def) = self.task(kind) {
            for dep in &def.dependencies {
                self.visit_task(*dep, visited, visiting, result)?;
            }
        }

        visiting.remove(&kind);
        visited.insert(kind);
        result.push(kind);
        Ok(())
    }
}

/// Parse task names into kinds.
pub fn parse_task_names(names: &[String]) -> Result<Vec<TaskKind>, PlanError> {
    names
        .iter()
        .map(|n| TaskKind::from_name(n).ok_or_else(|| PlanError::UnknownTask(n.clone())))
        .collect()
}

/// Render a directory as a glob prefix with forward slashes.
fn glob_dir(path: &std::path::Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    text.trim_end_matches('/').to_string()
}
