//! Blocking client for the OneFuse REST API (`/api/v3/onefuse/`).
//!
//! # Overview
//! Maps custom names, Microsoft AD policies, Microsoft endpoints and
//! workspaces onto typed operations. `OneFuseClient` is the entry point; it
//! composes the pure `ApiClient` (request building, status classification,
//! response decoding) with a `Transport` that performs the HTTP exchange.
//!
//! # Design
//! - Configuration is an explicit `Config` value; there is no global state.
//! - `ApiClient` splits every operation into `build_*` and `parse_*`, so the
//!   I/O boundary is explicit and parsers are testable with canned responses.
//! - Only 5xx statuses are errors by default; see `StatusPolicy`.
//! - Unimplemented operations are listed in `capability` and fail with
//!   `OneFuseError::NotImplemented` without any network call.
//! - Nothing is retried. `OneFuseError::retry_policy` tells the caller what
//!   is safe to retry.

pub mod capability;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;
pub mod types;

pub use capability::{ResourceKind, Verb};
pub use client::{ApiClient, StatusPolicy, DEFAULT_WORKSPACE_NAME};
pub use config::{Config, Scheme};
pub use dispatcher::OneFuseClient;
pub use error::{OneFuseError, Result, RetryPolicy};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::{Filter, ResourceType};
pub use transport::{Transport, UreqTransport};
pub use types::{
    AdPolicyLinks, CustomName, CustomNameRequest, EndpointLinks, EndpointsListResponse, LetterCase,
    LinkMeta, MicrosoftAdPolicy, MicrosoftEndpoint, NewMicrosoftAdPolicy, Workspace,
    WorkspacesListResponse,
};
