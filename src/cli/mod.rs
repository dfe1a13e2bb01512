//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod watch;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::build::BuildContext;
use crate::config::loader::{find_config, load_config, merge_cli_overrides, CliOverrides};
use crate::config::{default_config, CONFIG_FILE_NAME};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Themesmith - build, lint and watch CMS theme assets
#[derive(Parser)]
#[command(name = "themesmith")]
#[command(about = "Themesmith - compile SCSS, bundle scripts, lint sources and minify images for a theme")]
#[command(version)]
pub struct Cli {
    /// Theme root (defaults to the directory holding themesmith.toml)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file to use instead of searching for themesmith.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Browserslist query for prefixing (repeatable, overrides config)
    #[arg(long = "browser", global = true, value_name = "QUERY")]
    pub browsers: Vec<String>,

    /// Script downlevel target (overrides config)
    #[arg(long, global = true)]
    pub target: Option<String>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile stylesheets, then transpile and minify scripts
    Build {
        /// Print the tasks that would run without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Lint stylesheets, then scripts
    Lint {
        /// Print the tasks that would run without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-run the linters whenever sources change (Ctrl+C to stop)
    #[command(name = "watch-lint")]
    WatchLint {
        /// Debounce delay in milliseconds (overrides config)
        #[arg(long)]
        debounce_ms: Option<u32>,
    },

    /// Recompress images from img/src into img
    Images,

    /// Run individual tasks by name
    Run {
        /// Task names (sass-lint, sass, js-lint, js-babel, js-uglify, images)
        #[arg(required = true)]
        tasks: Vec<String>,

        /// Also run the tasks they depend on, first
        #[arg(long)]
        with_deps: bool,

        /// Print the tasks that would run without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// List sequences, tasks and watch rules
    List,
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let debounce_ms = match &cli.command {
        Commands::WatchLint { debounce_ms } => *debounce_ms,
        _ => None,
    };
    let overrides = CliOverrides {
        browsers: (!cli.browsers.is_empty()).then(|| cli.browsers.clone()),
        target: cli.target.clone(),
        debounce_ms,
    };

    let context = match load_context(cli.root.as_deref(), cli.config.as_deref(), &overrides) {
        Ok(context) => context.with_verbose(cli.verbose),
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    match cli.command {
        Commands::Build { dry_run } => build::run_sequence(context, "build", dry_run),
        Commands::Lint { dry_run } => build::run_sequence(context, "lint", dry_run),
        Commands::WatchLint { .. } => watch::run_watch_lint(context),
        Commands::Images => build::run_images(context),
        Commands::Run { tasks, with_deps, dry_run } => {
            build::run_tasks(context, &tasks, with_deps, dry_run)
        }
        Commands::List => build::run_list(context),
    }
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "themesmith=debug" } else { "themesmith=info" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Locate the theme, load its configuration and apply CLI overrides.
fn load_context(
    root: Option<&Path>,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<BuildContext, String> {
    let config_path = match (config_path, root) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, Some(root)) => Some(root.join(CONFIG_FILE_NAME)).filter(|p| p.exists()),
        (None, None) => find_config(),
    };

    let theme_root = match (root, &config_path) {
        (Some(root), _) => root.to_path_buf(),
        // A bare file name has an empty parent: the current directory
        (None, Some(path)) => match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir().map_err(|e| e.to_string())?,
        },
        (None, None) => std::env::current_dir().map_err(|e| e.to_string())?,
    };

    if !theme_root.is_dir() {
        return Err(format!("Theme root not found: {}", theme_root.display()));
    }

    let mut config = match &config_path {
        Some(path) => {
            tracing::debug!(config = %path.display(), "using config");
            load_config(Some(path)).map_err(|e| e.to_string())?
        }
        None => {
            tracing::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
            let mut config = default_config();
            if let Some(name) = theme_root.file_name() {
                config.theme.name = name.to_string_lossy().into_owned();
            }
            config
        }
    };

    merge_cli_overrides(&mut config, overrides);
    let errors = config.validate();
    if !errors.is_empty() {
        let lines: Vec<String> = errors.iter().map(|e| format!("  - {}", e)).collect();
        return Err(format!("Invalid configuration:\n{}", lines.join("\n")));
    }

    tracing::debug!(theme = %config.theme.name, root = %theme_root.display(), "theme loaded");
    Ok(BuildContext::new(config, theme_root))
}
