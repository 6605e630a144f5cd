//! Error handling for spreadsheet API calls.
//!
//! HTTP failures are captured as [`ApiError`] so the retry loop can classify
//! them, then folded into [`ChantagError`] with read or write context once
//! retries are exhausted.

use std::fmt;
use std::time::Duration;

use crate::error::ChantagError;

use super::AsHttpError;

/// Whether a failed call was reading or writing. Picks the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// An error returned by the spreadsheet API, with status kept for retry logic.
#[derive(Debug)]
pub struct ApiError {
    pub status: Option<reqwest::StatusCode>,
    /// Retry-After header value in seconds, if available
    pub retry_after: Option<u64>,
    pub message: String,
    /// Without a status, whether the call may succeed if repeated.
    pub retryable: bool,
}

impl ApiError {
    /// A failure before any response, such as a dropped connection.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            retry_after: None,
            message: message.into(),
            retryable: true,
        }
    }

    /// A local failure that repeating the request cannot fix.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            retryable: false,
            ..Self::new(message)
        }
    }

    pub fn with_status(message: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self {
            status: Some(status),
            retry_after: None,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Fold into a crate error. Rate limiting wins over direction.
    pub fn into_chantag_error(self, direction: Direction, what: &str) -> ChantagError {
        if let Some(wait) = self.get_retry_after() {
            return ChantagError::RateLimited(wait.as_secs());
        }
        if self.status.map(|s| s.as_u16()) == Some(401) {
            return ChantagError::AuthRequired;
        }

        let detail = format!("{what}: {self}");
        match direction {
            Direction::Read => ChantagError::RemoteRead(detail),
            Direction::Write => ChantagError::RemoteWrite(detail),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({})", self.message, status.as_u16()),
            None => write!(f, "{}", self.message),
        }
    }
}

impl AsHttpError for ApiError {
    fn as_http_error(&self) -> Option<(reqwest::StatusCode, Option<u64>)> {
        self.status.map(|s| (s, self.retry_after))
    }

    fn is_transient(&self) -> bool {
        match self.status {
            Some(status) => status.is_server_error(),
            None => self.retryable,
        }
    }

    fn is_rate_limited(&self) -> bool {
        self.status.map(|s| s.as_u16()) == Some(429)
    }

    fn get_retry_after(&self) -> Option<Duration> {
        if !self.is_rate_limited() {
            return None;
        }
        Some(Duration::from_secs(self.retry_after.unwrap_or(60)))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status(),
            retry_after: None,
            message: err.to_string(),
            // Builder and body errors fail the same way every time.
            retryable: err.is_timeout() || err.is_connect() || err.is_request(),
        }
    }
}
