//! # eslink_session
//!
//! Caller side of eslink: talks to the worker process and turns editor
//! events into jobs.
//!
//! - [`Dispatcher`] owns the worker channel and correlates each job with its
//!   single response.
//! - [`SessionController`] builds jobs from documents and settings, discards
//!   stale lint results and reports fixes through a [`Notifier`].

mod document;
pub mod dispatcher;
mod error;
mod message;
pub mod session;
mod state;

pub use dispatcher::{DEFAULT_TIMEOUT, Dispatcher};
pub use document::{Document, Notifier, ProjectLocator, ProjectRoots};
pub use error::{DispatchError, SessionError};
pub use message::LintMessage;
pub use session::{
    DEBUG_DISABLED, DEBUG_TITLE, FixOutcome, LintState, PLEASE_SAVE, SessionController,
};
pub use state::SettingsState;
