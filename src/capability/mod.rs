// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capability abstraction over the navigation engines.
//!
//! A `Session` is an exclusively-owned handle to an open browsing or HTTP
//! session; a `SessionProvider` knows how to acquire one, trying its
//! acquisition strategies in a fixed priority order.

pub mod chromium;
pub mod http;

use crate::error::{AcquireError, VisitError};
use crate::shutdown::CancelToken;
use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::{info, warn};

/// Lightweight metadata extracted after a completed page load.
#[derive(Debug, Clone, Default)]
pub struct PageInfo {
    /// URL after redirects, when the engine can report it.
    pub final_url: Option<String>,
    /// Page title, when one could be extracted.
    pub title: Option<String>,
    /// HTTP status code (HTTP engine only).
    pub status: Option<u16>,
    /// Response body length in bytes (HTTP engine only).
    pub body_bytes: Option<u64>,
}

/// How a page load ended when it did not fail.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The page finished loading.
    Complete(PageInfo),
    /// Shutdown was requested mid-load; nothing to report.
    Interrupted,
}

/// Whether a capability lives for the whole process or one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    PerProcess,
    PerCycle,
}

/// An open navigation session. At most one exists at any time.
#[async_trait]
pub trait Session: Send {
    /// Navigate to `url` and wait, bounded, for the load to complete.
    async fn load(&mut self, url: &str, cancel: &CancelToken) -> Result<LoadOutcome, VisitError>;

    /// Release the underlying capability.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Acquires sessions for the supervisor.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Engine label for logs ("browser", "http").
    fn label(&self) -> &'static str;

    fn mode(&self) -> AcquireMode;

    /// Try the acquisition strategies in priority order; first success wins.
    async fn acquire(&self) -> Result<Box<dyn Session>, AcquireError>;
}

/// Run acquisition strategies in order, returning the first success.
///
/// Each strategy swallows its own failure with a warning; only exhaustion of
/// the whole list surfaces as an `AcquireError` carrying the last cause.
pub(crate) async fn try_strategies<T>(
    strategies: Vec<(&'static str, BoxFuture<'_, Result<T>>)>,
) -> Result<T, AcquireError> {
    let total = strategies.len();
    let mut last: Option<String> = None;
    for (index, (name, attempt)) in strategies.into_iter().enumerate() {
        match attempt.await {
            Ok(value) => {
                info!("acquired session via {name}");
                return Ok(value);
            }
            Err(err) => {
                warn!("acquisition strategy {}/{} ({name}) failed: {err:#}", index + 1, total);
                last = Some(format!("{err:#}"));
            }
        }
    }
    Err(AcquireError::exhausted(total, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn failing(name: &'static str) -> (&'static str, BoxFuture<'static, Result<u32>>) {
        (name, Box::pin(async move { Err(anyhow!("{name} unavailable")) }))
    }

    #[tokio::test]
    async fn first_successful_strategy_wins() {
        let order = AtomicUsize::new(0);
        let strategies: Vec<(&'static str, BoxFuture<'_, Result<u32>>)> = vec![
            failing("managed"),
            failing("system"),
            ("visible", Box::pin(async {
                order.fetch_add(1, Ordering::SeqCst);
                Ok(3)
            })),
        ];
        let got = try_strategies(strategies).await.unwrap();
        assert_eq!(got, 3);
        assert_eq!(order.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_reports_last_cause() {
        let strategies: Vec<(&'static str, BoxFuture<'_, Result<u32>>)> =
            vec![failing("managed"), failing("system")];
        let err = try_strategies(strategies).await.unwrap_err();
        assert_eq!(err.tried, 2);
        assert!(err.last.contains("system unavailable"));
    }

    #[tokio::test]
    async fn later_strategies_do_not_run_after_success() {
        let ran = AtomicUsize::new(0);
        let strategies: Vec<(&'static str, BoxFuture<'_, Result<u32>>)> = vec![
            ("first", Box::pin(async { Ok(1) })),
            ("second", Box::pin(async {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            })),
        ];
        let got = try_strategies(strategies).await.unwrap();
        assert_eq!(got, 1);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
