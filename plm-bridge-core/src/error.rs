//! Error types shared by the REST client, the assembly automation and the
//! transcription tooling.
//!
//! Client failures fall into two tiers:
//! - local precondition failures ([`PlmError::NotAuthenticated`],
//!   [`PlmError::TokenExpired`]) raised before any network I/O,
//! - transport/protocol failures raised after a failed I/O attempt, always
//!   carrying the original cause.
//!
//! Nothing in this crate retries automatically.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlmError {
    #[error("Not authenticated. Call authenticate() first.")]
    NotAuthenticated,

    #[error("Token expired at {expired_at}. Re-authentication required.")]
    TokenExpired { expired_at: DateTime<Utc> },

    /// Network error or non-success HTTP status. 4xx and 5xx are not told apart.
    #[error("{operation} failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed on {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation}: response is missing `{field}`")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

impl PlmError {
    /// True for the local "unauthenticated" tier: no token, or an expired one.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            PlmError::NotAuthenticated | PlmError::TokenExpired { .. }
        )
    }

    pub(crate) fn http(operation: &'static str) -> impl FnOnce(reqwest::Error) -> PlmError {
        move |source| PlmError::Http { operation, source }
    }

    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> PlmError {
        let path = path.into();
        move |source| PlmError::Io {
            operation,
            path,
            source,
        }
    }
}

/// Outcome of an operation whose failure is tolerated by the caller.
///
/// Used where a failure is deliberately not propagated (logout notification,
/// "create if missing" probing) so callers can still tell an ignored failure
/// apart from a success.
#[derive(Debug)]
#[must_use]
pub enum BestEffort<E = PlmError> {
    Completed,
    /// Nothing to do, e.g. logout without a session.
    Skipped,
    Ignored(E),
}

impl<E> BestEffort<E> {
    pub fn is_completed(&self) -> bool {
        matches!(self, BestEffort::Completed)
    }

    pub fn ignored(&self) -> Option<&E> {
        match self {
            BestEffort::Ignored(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid ledger JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
