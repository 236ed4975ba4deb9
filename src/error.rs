// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! Failure taxonomy for visits and capability acquisition.
//!
//! Every failure a visit can hit is classified into one of four kinds at the
//! capability boundary. The kind only drives the log line; the supervisor
//! treats all visit failures identically.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Category of a visit failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A bounded wait was exceeded.
    Timeout,
    /// Transport-level failure to reach the target.
    Connection,
    /// Capability-level failure distinct from transport (e.g. browser crash).
    Navigation,
    /// Anything uncategorized.
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connection => write!(f, "connection"),
            Self::Navigation => write!(f, "navigation"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// A classified failure raised while navigating to or loading a target.
#[derive(Debug, Error)]
pub enum VisitError {
    #[error("page load exceeded the {0:?} bound")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl VisitError {
    pub fn timeout(bound: Duration) -> Self {
        Self::Timeout(bound)
    }

    pub fn connection(err: impl fmt::Display) -> Self {
        Self::Connection(err.to_string())
    }

    pub fn navigation(err: impl fmt::Display) -> Self {
        Self::Navigation(err.to_string())
    }

    pub fn unexpected(err: impl fmt::Display) -> Self {
        Self::Unexpected(err.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Navigation(_) => ErrorKind::Navigation,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

/// Classify a reqwest transport error.
///
/// Timeouts and connect failures get their own kinds; everything else the
/// transport can raise (body, decode, redirect loops) is uncategorized.
pub fn classify_transport(err: reqwest::Error, bound: Duration) -> VisitError {
    if err.is_timeout() {
        VisitError::timeout(bound)
    } else if err.is_connect() {
        VisitError::connection(err)
    } else {
        VisitError::unexpected(err)
    }
}

/// No acquisition strategy produced a usable capability.
#[derive(Debug, Error)]
#[error("all {tried} acquisition strategies failed (last: {last})")]
pub struct AcquireError {
    pub tried: usize,
    pub last: String,
}

impl AcquireError {
    pub fn exhausted(tried: usize, last: Option<String>) -> Self {
        Self {
            tried,
            last: last.unwrap_or_else(|| "no strategies configured".to_string()),
        }
    }
}
