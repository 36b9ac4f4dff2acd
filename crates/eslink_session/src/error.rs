//! Session error types.

use std::time::Duration;

use eslink_core::protocol::JobFailure;
use thiserror::Error;

/// Errors returned by [`crate::Dispatcher::send`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The worker was terminated or has exited.
    #[error("The eslink worker is not running")]
    WorkerUnavailable,

    /// Another job is still waiting for its response.
    #[error("A job is already in flight")]
    Busy,

    /// The worker did not answer in time.
    #[error("The eslink worker did not answer within {0:?}")]
    Timeout(Duration),

    /// The worker answered with an error.
    #[error(transparent)]
    Rejected(#[from] JobFailure),

    /// I/O error on the worker channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by [`crate::SessionController`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Dispatch failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The document has never been saved to disk.
    #[error("The document has no path")]
    MissingPath,

    /// The worker answered with a response of the wrong kind.
    #[error("Unexpected {0} response from the worker")]
    UnexpectedResponse(&'static str),
}

impl SessionError {
    /// Creates an unexpected-response error for `response`.
    pub fn unexpected(response: &eslink_core::JobResponse) -> Self {
        use eslink_core::JobResponse;

        Self::UnexpectedResponse(match response {
            JobResponse::Lint(_) => "lint",
            JobResponse::Fix(_) => "fix",
            JobResponse::Debug(_) => "debug",
        })
    }
}
