//! Error types for the Stackware client
//!
//! One enum covers the whole taxonomy: caller misuse (`UnresolvedPath`,
//! `Argument`, `UnsupportedFilter`), lookup outcomes (`NotFound`,
//! `TooManyResults`), polling outcomes (`WaitTimeout`, `TaskFailed`) and
//! transport-level failures. Nothing here is retried by the library;
//! every variant surfaces to the caller except `LogNotFound`, which is
//! swallowed during best-effort job-log collection.

use std::time::Duration;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A path could not be built because a required ancestor binding
    /// (e.g. the owning cluster's id) was not supplied.
    #[error("cannot resolve path for {entity}: missing ancestor binding '{binding}'")]
    UnresolvedPath {
        entity: &'static str,
        binding: &'static str,
    },

    /// Conflicting or invalid arguments from the caller.
    #[error("{0}")]
    Argument(String),

    /// A lookup matched nothing.
    #[error("no {0} matched the request")]
    NotFound(&'static str),

    /// A lookup that assumes uniqueness matched more than one object.
    #[error("more than one {0} matched the request")]
    TooManyResults(&'static str),

    /// A filter key is not declared for the entity type.
    #[error("filter '{filter}' is not supported for {entity}")]
    UnsupportedFilter {
        entity: &'static str,
        filter: String,
    },

    /// Polling exceeded its deadline. The remote operation may still be
    /// running; only the client-side wait has given up.
    #[error("timed out after {timeout:?} waiting for {entity} to reach a terminal status")]
    WaitTimeout {
        entity: &'static str,
        timeout: Duration,
    },

    /// The task reached its failure terminal status.
    #[error("task finished with status '{0}'")]
    TaskFailed(String),

    /// The server refused to run an action because the target object has
    /// unresolved issues.
    #[error("action rejected: the object has unresolved issues")]
    ActionHasIssues,

    /// A job log file does not exist on the server.
    #[error("log file is not present on the server")]
    LogNotFound,

    /// The connected server is too old for the requested operation.
    #[error("server version {server} is older than required {required}")]
    VersionMismatch { required: String, server: String },

    /// A prototype of a different kind than requested was found.
    #[error("bundle does not contain a prototype of the requested kind")]
    IncorrectPrototype,

    /// The server rejected the request with a structured error body.
    #[error("server returned {status} {code}: {desc}")]
    Api {
        status: u16,
        code: String,
        desc: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from server: {0}")]
    Protocol(String),

    /// Low-level HTTP failure.
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("failed to decode server response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The base URL given to [`crate::Client::connect`] is invalid.
    #[error("invalid server url: {0}")]
    BaseUrl(#[from] url::ParseError),

    /// Login failed or no token was issued.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl Error {
    /// True for the "lookup matched nothing" outcome, whether it came
    /// from an empty search or a direct 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Machine-readable error code from a structured server error.
    pub(crate) fn api_code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}
