//! Watch mode: re-run linters when sources change.
//!
//! File events come from a [`ChangeSource`]. [`NotifySource`] is the real one,
//! built on `notify` with debouncing. [`ManualSource`] lets callers push
//! events by hand. [`watch_lint`] subscribes once per pipeline watch rule and
//! runs the rule's task on a dedicated thread for every change.

use crate::build::progress::ProgressEvent;
use crate::build::{TaskResult, TaskRunner, WatchRule};
use glob::{MatchOptions, Pattern};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Error during watch setup.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch {}: {source}", path.display())]
    WatchPath {
        /// Directory that could not be watched
        path: PathBuf,
        /// Underlying watcher error
        #[source]
        source: notify::Error,
    },
    /// A watch glob does not parse
    #[error("Invalid watch pattern '{pattern}': {source}")]
    Pattern {
        /// The offending pattern
        pattern: String,
        /// Parser error
        #[source]
        source: glob::PatternError,
    },
    /// Theme root not found
    #[error("Theme root not found: {}", .0.display())]
    RootNotFound(PathBuf),
}

/// A changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Absolute path of the changed file
    pub path: PathBuf,
}

/// The set of files one subscriber cares about.
#[derive(Debug, Clone)]
pub struct Subscription {
    root: PathBuf,
    // notify reports canonical paths on some platforms
    canonical_root: Option<PathBuf>,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

fn match_options() -> MatchOptions {
    MatchOptions { case_sensitive: true, require_literal_separator: true, require_literal_leading_dot: false }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, WatchError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| WatchError::Pattern { pattern: p.clone(), source })
        })
        .collect()
}

impl Subscription {
    /// Create a subscription for globs relative to `root`.
    pub fn new(root: &Path, include: &[String], exclude: &[String]) -> Result<Self, WatchError> {
        Ok(Self {
            root: root.to_path_buf(),
            canonical_root: root.canonicalize().ok().filter(|c| c != root),
            include: compile_patterns(include)?,
            exclude: compile_patterns(exclude)?,
        })
    }

    /// Create a subscription from a pipeline watch rule.
    pub fn for_rule(root: &Path, rule: &WatchRule) -> Result<Self, WatchError> {
        Self::new(root, &rule.include, &rule.exclude)
    }

    /// Root the globs are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a changed path belongs to this subscription.
    pub fn matches(&self, path: &Path) -> bool {
        let mut roots = vec![self.root.as_path()];
        roots.extend(self.canonical_root.as_deref());
        let Some(rel) = relative_to(path, &roots) else {
            return false;
        };
        let options = match_options();
        self.include.iter().any(|p| p.matches_with(&rel, options))
            && !self.exclude.iter().any(|p| p.matches_with(&rel, options))
    }

    /// Directories to watch recursively: the literal prefix of each include
    /// glob.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for pattern in &self.include {
            let literal: PathBuf = Path::new(pattern.as_str())
                .components()
                .take_while(|c| !c.as_os_str().to_string_lossy().contains(['*', '?', '[']))
                .collect();
            let dir = self.root.join(literal);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }
}

/// `path` relative to one of `roots` with `/` separators.
fn relative_to(path: &Path, roots: &[&Path]) -> Option<String> {
    let rel = roots.iter().find_map(|root| path.strip_prefix(root).ok())?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Something that delivers file change events.
pub trait ChangeSource {
    /// Start delivering events for files matching `subscription`.
    ///
    /// The receiver closes when the source is dropped.
    fn subscribe(&mut self, subscription: &Subscription) -> Result<Receiver<ChangeEvent>, WatchError>;
}

/// Change source backed by a debounced `notify` watcher.
pub struct NotifySource {
    debounce: Duration,
    debouncers: Vec<Debouncer<RecommendedWatcher>>,
}

impl std::fmt::Debug for NotifySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySource")
            .field("debounce", &self.debounce)
            .field("watchers", &self.debouncers.len())
            .finish()
    }
}

impl NotifySource {
    /// Create a source that coalesces events within `debounce`.
    pub fn new(debounce: Duration) -> Self {
        Self { debounce, debouncers: Vec::new() }
    }
}

impl ChangeSource for NotifySource {
    fn subscribe(&mut self, subscription: &Subscription) -> Result<Receiver<ChangeEvent>, WatchError> {
        if !subscription.root().exists() {
            return Err(WatchError::RootNotFound(subscription.root().to_path_buf()));
        }

        let (tx, rx) = channel();
        let filter = subscription.clone();
        let mut debouncer = new_debouncer(self.debounce, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        if matches!(event.kind, DebouncedEventKind::Any) && filter.matches(&event.path) {
                            let _ = tx.send(ChangeEvent { path: event.path });
                        }
                    }
                }
                Err(error) => tracing::warn!("watch error: {:?}", error),
            }
        })
        .map_err(WatchError::WatcherInit)?;

        for dir in subscription.watch_dirs() {
            if !dir.is_dir() {
                tracing::warn!(dir = %dir.display(), "watch directory does not exist, skipping");
                continue;
            }
            debouncer
                .watcher()
                .watch(&dir, RecursiveMode::Recursive)
                .map_err(|source| WatchError::WatchPath { path: dir.clone(), source })?;
            tracing::debug!(dir = %dir.display(), "watching");
        }

        self.debouncers.push(debouncer);
        Ok(rx)
    }
}

/// Change source driven by hand.
///
/// Clones share their subscribers, so one clone can be handed to
/// [`watch_lint`] while another pushes events.
#[derive(Debug, Clone, Default)]
pub struct ManualSource {
    subscribers: Arc<Mutex<Vec<(Subscription, Sender<ChangeEvent>)>>>,
}

impl ManualSource {
    /// Create a source with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a change to every subscriber whose globs match.
    ///
    /// Returns how many subscribers received it.
    pub fn trigger(&self, path: &Path) -> usize {
        let Ok(subscribers) = self.subscribers.lock() else {
            return 0;
        };
        subscribers
            .iter()
            .filter(|(sub, _)| sub.matches(path))
            .filter(|(_, tx)| tx.send(ChangeEvent { path: path.to_path_buf() }).is_ok())
            .count()
    }

    /// Drop every subscriber, closing their receivers.
    pub fn close(&self) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.clear();
        }
    }
}

impl ChangeSource for ManualSource {
    fn subscribe(&mut self, subscription: &Subscription) -> Result<Receiver<ChangeEvent>, WatchError> {
        let (tx, rx) = channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push((subscription.clone(), tx));
        }
        Ok(rx)
    }
}

/// Running watchers returned by [`watch_lint`].
pub struct WatchHandle {
    workers: Vec<JoinHandle<()>>,
    source: Box<dyn ChangeSource>,
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle").field("workers", &self.workers.len()).finish()
    }
}

impl WatchHandle {
    /// Block until every subscription has closed.
    ///
    /// With a [`NotifySource`] this never returns; the process ends on Ctrl+C.
    pub fn wait(self) {
        let WatchHandle { workers, source } = self;
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("watch worker panicked");
            }
        }
        drop(source);
    }
}

/// Subscribe every watch rule of the runner's pipeline and return at once.
///
/// Each rule gets its own thread that runs the rule's task whenever a
/// matching change arrives. Events that queued up while a run was in
/// progress are folded into the next run. Failures are reported and
/// watching continues.
///
/// When `outcomes` is given, every task result is sent to it in completion
/// order; otherwise results are only reported through the runner's progress.
pub fn watch_lint(
    runner: Arc<TaskRunner>,
    mut source: Box<dyn ChangeSource>,
    outcomes: Option<Sender<TaskResult>>,
) -> Result<WatchHandle, WatchError> {
    let root = runner.context().theme_root().to_path_buf();
    let clear = runner.context().config().watch.clear_screen;
    let mut workers = Vec::new();

    for rule in runner.pipeline().watch_rules() {
        let subscription = Subscription::for_rule(&root, rule)?;
        let events = source.subscribe(&subscription)?;
        let runner = Arc::clone(&runner);
        let outcome_tx = outcomes.clone();
        let task = rule.task;
        let root = root.clone();

        tracing::info!(task = %task, globs = ?rule.include, "watching");
        workers.push(thread::spawn(move || {
            while let Ok(event) = events.recv() {
                let coalesced = events.try_iter().count();
                if clear {
                    clear_screen();
                }
                let shown = event.path.strip_prefix(&root).unwrap_or(&event.path);
                tracing::debug!(path = %shown.display(), coalesced, "change detected");
                runner.progress().report(ProgressEvent::Changed {
                    path: shown.display().to_string(),
                    task,
                });

                let result = runner.run_task(task);
                if let Some(tx) = &outcome_tx {
                    if tx.send(result).is_err() {
                        tracing::trace!("outcome receiver dropped");
                    }
                }
            }
        }));
    }

    Ok(WatchHandle { workers, source })
}

/// Clear the terminal screen
fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}
