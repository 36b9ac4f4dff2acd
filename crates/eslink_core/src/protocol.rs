//! Wire format between the session and the worker process.
//!
//! Both directions are newline-delimited JSON. The session writes one
//! [`WorkerRequest`] per line; the worker answers each with exactly one
//! [`WorkerEvent`] named [`RESPONSE_EVENT`].

use serde::{Deserialize, Serialize};

use crate::{Job, JobError, JobResponse};

/// Name of the single response event.
pub const RESPONSE_EVENT: &str = "eslink:response";

/// A job tagged with the id used to correlate its response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub id: u64,
    pub job: Job,
}

/// Category of a rejected job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    ConfigNotFound,
    EngineInit,
    EngineRuntime,
    /// Malformed requests and anything else the worker could not classify.
    Internal,
}

/// Error half of a [`WorkerEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&JobError> for JobFailure {
    fn from(err: &JobError) -> Self {
        let kind = match err {
            JobError::ConfigNotFound(_) => FailureKind::ConfigNotFound,
            JobError::EngineInit(_) => FailureKind::EngineInit,
            JobError::EngineRuntime(_) => FailureKind::EngineRuntime,
            JobError::Io(_) | JobError::Serialization(_) => FailureKind::Internal,
        };
        Self::new(kind, err.to_string())
    }
}

/// The worker's reply to one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerEvent {
    pub event: String,
    pub id: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Resolved or rejected job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(JobResponse),
    Error(JobFailure),
}

impl WorkerEvent {
    /// A resolved response.
    pub fn resolved(id: u64, response: JobResponse) -> Self {
        Self {
            event: RESPONSE_EVENT.to_string(),
            id,
            outcome: Outcome::Result(response),
        }
    }

    /// A rejected response.
    pub fn rejected(id: u64, failure: JobFailure) -> Self {
        Self {
            event: RESPONSE_EVENT.to_string(),
            id,
            outcome: Outcome::Error(failure),
        }
    }

    /// Converts the outcome into a `Result`.
    pub fn into_result(self) -> Result<JobResponse, JobFailure> {
        match self.outcome {
            Outcome::Result(response) => Ok(response),
            Outcome::Error(failure) => Err(failure),
        }
    }
}
