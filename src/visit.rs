// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! A single visit: navigate, wait for the load, report, dwell.

use crate::capability::{LoadOutcome, PageInfo, Session};
use crate::config::Target;
use crate::error::ErrorKind;
use crate::shutdown::CancelToken;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Outcome of one visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    Success,
    Failure(ErrorKind),
}

/// Record of one visit, consumed immediately by the supervisor.
#[derive(Debug, Clone)]
pub struct VisitResult {
    pub target_url: String,
    pub outcome: VisitOutcome,
    pub elapsed: Duration,
}

impl VisitResult {
    pub fn succeeded(&self) -> bool {
        self.outcome == VisitOutcome::Success
    }
}

/// Visit `target` with the held session.
///
/// Failures during navigation or the load wait are classified, logged, and
/// folded into the result — they never propagate. Returns `None` when
/// shutdown preempted the visit; nothing is recorded in that case.
pub async fn visit(
    session: &mut dyn Session,
    target: &Target,
    cancel: &CancelToken,
) -> Option<VisitResult> {
    info!("visiting {}", target.url);
    let start = Instant::now();

    match session.load(&target.url, cancel).await {
        Ok(LoadOutcome::Interrupted) => None,
        Ok(LoadOutcome::Complete(page)) => {
            let elapsed = start.elapsed();
            info!("page loaded in {:.2}s", elapsed.as_secs_f64());
            report_page(&page);

            if !dwell(target.dwell, cancel).await {
                return None;
            }
            Some(VisitResult {
                target_url: target.url.clone(),
                outcome: VisitOutcome::Success,
                elapsed,
            })
        }
        Err(err) => {
            let kind = err.kind();
            match kind {
                ErrorKind::Timeout => error!("{} took too long to load: {err}", target.url),
                ErrorKind::Connection => error!("could not reach {}: {err}", target.url),
                ErrorKind::Navigation => error!("navigation to {} failed: {err}", target.url),
                ErrorKind::Unexpected => error!("visit to {} failed: {err}", target.url),
            }
            Some(VisitResult {
                target_url: target.url.clone(),
                outcome: VisitOutcome::Failure(kind),
                elapsed: start.elapsed(),
            })
        }
    }
}

/// Log the page metadata the engine could extract.
fn report_page(page: &PageInfo) {
    if let Some(status) = page.status {
        if (200..300).contains(&status) {
            info!("status: {status}");
        } else {
            // A non-success status is a warning, not a visit failure.
            warn!("non-success status: {status}");
        }
    }
    if let Some(bytes) = page.body_bytes {
        info!("page size: {bytes} bytes");
    }
    match (&page.title, &page.final_url) {
        (None, None) if page.status.is_none() => {
            warn!("page metadata unavailable");
        }
        (title, final_url) => {
            if let Some(t) = title {
                info!("page title: {}", snip(t, 100));
            }
            if let Some(u) = final_url {
                info!("final URL: {u}");
            }
        }
    }
}

/// Block on the page for the configured dwell, one countdown tick per second.
///
/// Returns `false` when shutdown cut the dwell short.
async fn dwell(duration: Duration, cancel: &CancelToken) -> bool {
    let total = duration.as_secs();
    info!("dwelling on page for {total}s");
    for remaining in (1..=total).rev() {
        info!("{remaining}s remaining on page");
        if !cancel.sleep_unless_cancelled(Duration::from_secs(1)).await {
            return false;
        }
    }
    info!("dwell complete, leaving page");
    true
}

fn snip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}
