//! Bearer-token session held by a [`crate::client::TeamcenterClient`].
//!
//! Expiry is a local estimate: one hour after a successful login. The server
//! never reports its own expiry, and there is no refresh; an expired session
//! stays expired until the caller authenticates again.

use chrono::{DateTime, Duration, Utc};
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::PlmError;

/// Source of "now" for expiry checks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn token_lifetime() -> Duration {
    Duration::hours(1)
}

#[derive(Clone, PartialEq)]
pub struct Session {
    token: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Session {
    pub fn issue(token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            issued_at,
            expires_at: issued_at + token_lifetime(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Local precondition check run before every protected request.
    pub fn validate(session: Option<&Session>, now: DateTime<Utc>) -> Result<&Session, PlmError> {
        let session = session.ok_or(PlmError::NotAuthenticated)?;
        if session.is_expired_at(now) {
            tracing::info!(expired_at = %session.expires_at, "Session token expired");
            return Err(PlmError::TokenExpired {
                expired_at: session.expires_at,
            });
        }
        Ok(session)
    }
}
