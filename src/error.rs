//! Error types for ukg-bi
//!
//! Errors fall into two groups:
//! - Permanent errors raised before any remote call (bad configuration,
//!   unknown report names). These are never retried.
//! - Errors raised while talking to the report service (authentication,
//!   submission, transport, job status). The outer retry policy re-runs the
//!   whole execute-and-fetch sequence when it sees one of these.

use thiserror::Error;

/// Result type alias for ukg-bi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ukg-bi
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "username")
        key: Option<String>,
    },

    /// Report name is not present in the configured report mapping
    #[error("unknown report: {0:?} is not in the configured report mapping")]
    UnknownReport(String),

    /// Login handshake or token logon was rejected
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The service refused to execute the report request
    #[error("report submission failed: {0}")]
    Submission(String),

    /// Unexpected HTTP status or malformed response from the service
    #[error("transport error: {0}")]
    Transport(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// SOAP fault returned by the service
    #[error("SOAP fault from {operation}: {message}")]
    Fault {
        /// The remote operation that faulted (e.g., "ExecuteReport")
        operation: String,
        /// Fault reason text
        message: String,
    },

    /// The report job reached the Failed state
    #[error("report {report_key} failed on the server")]
    ReportFailed {
        /// Key of the failed report job
        report_key: String,
    },

    /// The report job was still working when the poll budget ran out
    #[error("report {report_key} still working after {attempts} poll attempts")]
    ReportNotReady {
        /// Key of the pending report job
        report_key: String,
        /// Number of polls performed
        attempts: u32,
    },

    /// Report stream could not be decoded into text
    #[error("decode error: {0}")]
    Decode(String),

    /// Every outer attempt at execute-and-fetch failed
    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// The error from the final attempt
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Returns the innermost error, looking through `RetriesExhausted`
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::RetriesExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
