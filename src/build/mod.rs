//! Task pipeline for theme assets.
//!
//! # Overview
//!
//! - **Definition**: a [`Pipeline`] value lists tasks, their dependencies,
//!   named sequences and watch rules
//! - **Discovery**: each task finds its inputs under the theme root
//! - **Execution**: a [`TaskRunner`] runs tasks in order and stops at the
//!   first failure
//!
//! # Example
//!
//! ```ignore
//! use themesmith::build::{BuildContext, TaskRunner};
//! use themesmith::config::load_config;
//!
//! let config = load_config(None)?;
//! let runner = TaskRunner::new(BuildContext::new(config, theme_root));
//!
//! let result = runner.run_sequence("build")?;
//! println!("{}", result.summary());
//! ```

pub mod context;
pub mod discovery;
pub mod pipeline;
pub mod progress;
pub mod result;
pub mod task;

pub use context::*;
pub use discovery::DiscoveryError;
pub use pipeline::*;
pub use result::*;
pub use task::*;
