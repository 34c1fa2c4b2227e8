//! Error types for the admin dashboard core.
//!
//! This module defines the centralized error type [`AdminError`] and a type alias
//! [`Result`] used throughout the crate. Every operation either resolves with data
//! or fails with exactly one of these errors; callers catch them at the UI boundary
//! and turn them into a notification. Nothing here is fatal to the process.

use thiserror::Error;

/// The main error type for dashboard operations.
///
/// Errors are scoped to the single interaction that triggered them. There is no
/// retry or backoff anywhere in the crate: a failed request is reported and
/// abandoned.
///
/// # Examples
///
/// ```
/// use equilink_admin::AdminError;
///
/// let err = AdminError::remote(Some(409), "duplicate key value");
/// assert!(err.is_remote());
/// assert_eq!(err.to_string(), "Remote error (409): duplicate key value");
/// ```
#[derive(Debug, Error)]
pub enum AdminError {
    /// Transport failure or backend rejection.
    ///
    /// `status` is the HTTP status when the backend answered, `None` when the
    /// request never completed (connection refused, timeout, ...).
    #[error("Remote error{}: {message}", status_suffix(*.status))]
    Remote {
        /// HTTP status returned by the backend, if any.
        status: Option<u16>,
        /// Backend or transport message.
        message: String,
    },

    /// A single-record fetch matched zero rows.
    #[error("{resource} record not found: {id}")]
    NotFound {
        /// Collection that was queried.
        resource: String,
        /// Identifier that matched nothing.
        id: String,
    },

    /// Sign-in failed or the signed-in user may not reach the dashboard.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Communication with the background query worker failed.
    #[error("Worker communication error: {0}")]
    Worker(String),
}

impl AdminError {
    /// Builds a [`AdminError::Remote`] from a status and message.
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Builds a [`AdminError::NotFound`] for a resource and id.
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Returns `true` for transport or backend failures.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

fn status_suffix(status: Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// A specialized `Result` type for dashboard operations.
pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_without_status_omits_parenthesis() {
        let err = AdminError::remote(None, "connection refused");
        assert_eq!(err.to_string(), "Remote error: connection refused");
    }

    #[test]
    fn not_found_is_not_remote() {
        let err = AdminError::not_found("profiles", "abc");
        assert!(!err.is_remote());
        assert_eq!(err.to_string(), "profiles record not found: abc");
    }
}
