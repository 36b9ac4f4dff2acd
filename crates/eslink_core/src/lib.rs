//! # eslink_core
//!
//! Job model and execution for the eslink worker.
//!
//! This crate provides:
//! - The `Job` / `JobResponse` data model and the worker wire protocol
//! - Settings snapshots
//! - Configuration resolution (config cascade, ignore files, home-root detection)
//! - The `Engine` abstraction and the ESLint command-line engine
//! - The `JobExecutor` run by the worker for every job
//!
//! ## Example
//!
//! ```rust,ignore
//! use eslink_core::{EslintFactory, Job, JobExecutor, JobKind, Settings};
//!
//! let executor = JobExecutor::new(EslintFactory);
//! let job = Job::new(JobKind::Lint, "/project/src/index.js", Settings::default())
//!     .with_text("var a = 1;;\n");
//!
//! let response = executor.execute(&job)?;
//! ```

mod diagnostic;
pub mod engine;
mod error;
pub mod eslint;
pub mod executor;
pub mod installation;
mod job;
pub mod protocol;
pub mod resolver;
mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use diagnostic::{Diagnostic, Fix, LineIndex, Position, Range, Severity};
pub use engine::{Engine, EngineFactory};
pub use error::JobError;
pub use eslint::{EslintCli, EslintFactory};
pub use executor::JobExecutor;
pub use job::{
    DebugInfo, InstallationKind, Job, JobKind, JobResponse, RuleOverrides, RuleSeverity,
    disabled_rules,
};
pub use resolver::{ConfigResolver, ResolvedConfigLocation};
pub use settings::{EMBEDDED_HTML_SCOPE, PathResolution, Settings};
