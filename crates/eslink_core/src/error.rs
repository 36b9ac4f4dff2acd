//! Job error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving or executing a job.
#[derive(Debug, Error)]
pub enum JobError {
    /// No ESLint configuration could be located for the file.
    #[error("No ESLint configuration found for {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The engine could not be constructed (missing install, bad configuration).
    #[error("Failed to initialize ESLint: {0}")]
    EngineInit(String),

    /// The engine failed unexpectedly while analysing a file.
    #[error("ESLint failed: {0}")]
    EngineRuntime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JobError {
    /// Creates an engine initialization error.
    pub fn engine_init(message: impl Into<String>) -> Self {
        Self::EngineInit(message.into())
    }

    /// Creates an engine runtime error.
    pub fn engine_runtime(message: impl Into<String>) -> Self {
        Self::EngineRuntime(message.into())
    }
}
