// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! The cycle supervisor: the unbounded loop that drives everything.
//!
//! One cycle is one pass over the configured targets. Visit failures never
//! abort the loop; only cancellation or a fatal up-front acquisition failure
//! ends it. All teardown runs here, on a single exit path.

use crate::capability::{AcquireMode, Session, SessionProvider};
use crate::config::Target;
use crate::shutdown::CancelToken;
use crate::visit::{visit, VisitResult};
use anyhow::Result;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, warn};

/// The one live session plus the cycle tally.
///
/// The session is exclusively owned here; acquiring a replacement always
/// tears down the previous handle first.
struct SessionState {
    session: Option<Box<dyn Session>>,
    cycle_count: u64,
}

/// Aggregate of one cycle, folded from its visit results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleResult {
    pub cycle_number: u64,
    pub all_succeeded: bool,
}

impl CycleResult {
    pub fn fold(cycle_number: u64, results: &[VisitResult]) -> Self {
        Self {
            cycle_number,
            all_succeeded: results.iter().all(VisitResult::succeeded),
        }
    }
}

/// Final statistics reported when the loop ends.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub engine: String,
    pub cycles: u64,
    pub targets: Vec<Target>,
}

pub struct Supervisor {
    provider: Box<dyn SessionProvider>,
    targets: Vec<Target>,
    cycle_pause: Duration,
    cancel: CancelToken,
    state: SessionState,
}

impl Supervisor {
    pub fn new(
        provider: Box<dyn SessionProvider>,
        targets: Vec<Target>,
        cycle_pause: Duration,
        cancel: CancelToken,
    ) -> Self {
        Self {
            provider,
            targets,
            cycle_pause,
            cancel,
            state: SessionState {
                session: None,
                cycle_count: 0,
            },
        }
    }

    /// Run cycles until cancelled.
    ///
    /// Returns an error only when a variant requiring up-front acquisition
    /// cannot acquire at all; per-visit and per-cycle failures are tolerated
    /// indefinitely.
    pub async fn run(mut self) -> Result<RunSummary> {
        if self.provider.mode() == AcquireMode::PerProcess {
            match self.provider.acquire().await {
                Ok(session) => self.install_session(session).await,
                Err(err) => {
                    error!(
                        "could not acquire a {} session: {err}",
                        self.provider.label()
                    );
                    self.finish().await;
                    return Err(err.into());
                }
            }
        }

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            self.run_cycle().await;
            if self.cancel.is_cancelled() {
                break;
            }
            info!(
                "pausing {}s before the next cycle",
                self.cycle_pause.as_secs()
            );
            if !self.cancel.sleep_unless_cancelled(self.cycle_pause).await {
                break;
            }
        }

        self.finish().await;
        Ok(RunSummary {
            engine: self.provider.label().to_string(),
            cycles: self.state.cycle_count,
            targets: self.targets,
        })
    }

    async fn run_cycle(&mut self) {
        self.state.cycle_count += 1;
        let cycle = self.state.cycle_count;
        info!("==== cycle #{cycle} ====");

        if self.provider.mode() == AcquireMode::PerCycle {
            match self.provider.acquire().await {
                Ok(session) => self.install_session(session).await,
                Err(err) => {
                    warn!("cycle #{cycle}: no session available: {err}");
                    warn!("cycle #{cycle} completed with errors");
                    return;
                }
            }
        }

        let targets = self.targets.clone();
        let total = targets.len();
        let mut results = Vec::with_capacity(total);
        for (index, target) in targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return;
            }
            info!("site {}/{} of cycle #{cycle}", index + 1, total);
            let Some(session) = self.state.session.as_deref_mut() else {
                warn!("cycle #{cycle}: session missing, skipping remaining sites");
                break;
            };
            match visit(session, target, &self.cancel).await {
                Some(result) => results.push(result),
                // Interrupted mid-visit; the partial cycle is not aggregated.
                None => return,
            }
        }

        let aggregate = CycleResult::fold(cycle, &results);
        if aggregate.all_succeeded && results.len() == total {
            info!("cycle #{cycle} completed successfully");
        } else {
            warn!("cycle #{cycle} completed with errors");
        }

        // The fresh-per-cycle variant fully tears the capability down here.
        if self.provider.mode() == AcquireMode::PerCycle {
            self.release_session().await;
        }
    }

    /// Store a newly acquired session, tearing down any prior one first.
    async fn install_session(&mut self, session: Box<dyn Session>) {
        if let Some(previous) = self.state.session.take() {
            if let Err(err) = previous.close().await {
                warn!("failed to close previous session: {err:#}");
            }
        }
        self.state.session = Some(session);
    }

    /// Release the held session, if any. A close failure is logged, never
    /// escalated.
    async fn release_session(&mut self) {
        if let Some(session) = self.state.session.take() {
            match session.close().await {
                Ok(()) => info!("session closed"),
                Err(err) => warn!("session close failed: {err:#}"),
            }
        }
    }

    /// Single teardown path for every way out of the loop.
    async fn finish(&mut self) {
        self.release_session().await;
        info!(
            "patrol stopped after {} cycle(s)",
            self.state.cycle_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::visit::VisitOutcome;

    fn result(outcome: VisitOutcome) -> VisitResult {
        VisitResult {
            target_url: "https://a.example".to_string(),
            outcome,
            elapsed: Duration::from_secs(1),
        }
    }

    #[test]
    fn fold_requires_every_visit_to_succeed() {
        let all_ok = [result(VisitOutcome::Success), result(VisitOutcome::Success)];
        assert!(CycleResult::fold(1, &all_ok).all_succeeded);

        let one_bad = [
            result(VisitOutcome::Success),
            result(VisitOutcome::Failure(ErrorKind::Timeout)),
        ];
        let folded = CycleResult::fold(2, &one_bad);
        assert_eq!(folded.cycle_number, 2);
        assert!(!folded.all_succeeded);
    }

    #[test]
    fn empty_cycle_folds_as_success() {
        assert!(CycleResult::fold(1, &[]).all_succeeded);
    }
}
