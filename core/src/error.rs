//! Error types for the OneFuse client.
//!
//! # Design
//! Transport failures and 5xx responses are the only conditions classified
//! from the wire by default. 4xx responses pass through to the decoders
//! unless the client runs with `StatusPolicy::Strict`. Callers decide
//! whether to retry by asking [`OneFuseError::retry_policy`]; the client
//! itself never retries.

use thiserror::Error;

use crate::capability::{ResourceKind, Verb};

pub type Result<T, E = OneFuseError> = std::result::Result<T, E>;

/// Whether the calling orchestrator may safely re-run the failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    Retryable,
    NonRetryable,
}

/// Errors returned by `ApiClient` parsers and `OneFuseClient` operations.
#[derive(Debug, Error)]
pub enum OneFuseError {
    /// DNS, connection or TLS failure. No HTTP status was received.
    #[error("transport error calling {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered with a status of 500 or above. `body` is verbatim.
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },

    /// A 4xx status, only reported under `StatusPolicy::Strict`.
    #[error("client error {status}: {body}")]
    ClientStatus { status: u16, body: String },

    /// The body parsed but did not carry the record the operation guarantees.
    #[error("invalid response {status} while {operation}: {body}")]
    DecodeContract {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("{verb} {resource} is not implemented")]
    NotImplemented { resource: ResourceKind, verb: Verb },

    /// The workspace collection has no entry named `Default`.
    #[error("unable to find default workspace")]
    DefaultWorkspaceNotFound,
}

impl OneFuseError {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            OneFuseError::Transport { .. } | OneFuseError::Server { .. } => RetryPolicy::Retryable,
            _ => RetryPolicy::NonRetryable,
        }
    }

    pub(crate) fn not_implemented(resource: ResourceKind, verb: Verb) -> Self {
        OneFuseError::NotImplemented { resource, verb }
    }
}
