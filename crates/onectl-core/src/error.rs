//! Error types for onectl
//!
//! Every failure a reconciliation can hit is one of these variants. The CLI
//! maps them onto exit codes; nothing in the core retries on error.

use thiserror::Error;

/// Result type alias for onectl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for onectl
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or conflicting parameters, detected before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// A resource that the operation requires does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// An identifier matched more than one resource by name
    #[error("Ambiguous identifier: {0}")]
    Ambiguous(String),

    /// Provider API failure, message passed through verbatim
    #[error("Provider error ({provider}): {message}")]
    Remote {
        /// Provider name
        provider: String,
        /// Error message as returned by the provider
        message: String,
    },

    /// Completion wait exceeded its budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// An update stopped part way through its sub-actions
    #[error("Update of {resource} failed at '{failed}' after applying [{}]: {source}", .applied.join(", "))]
    PartialUpdate {
        /// Resource id or name being updated
        resource: String,
        /// Sub-actions that took effect before the failure
        applied: Vec<String>,
        /// Sub-action that failed
        failed: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an ambiguity error
    pub fn ambiguous(msg: impl Into<String>) -> Self {
        Self::Ambiguous(msg.into())
    }

    /// Create a provider-specific error
    pub fn remote(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// True for errors raised before any remote call was made
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Config(_))
    }
}
