// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cooperative shutdown signaling.
//!
//! The operator's interrupt never preempts in-flight work directly. It flips a
//! level-triggered flag that every short sleep (dwell tick, readiness poll,
//! inter-cycle pause) observes, so teardown always runs on the single
//! supervisor exit path.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Shared cancellation flag. Cheap to clone; all clones observe the same flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Request shutdown. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives inside self, so wait_for cannot see it dropped.
        let _ = rx.wait_for(|stop| *stop).await;
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `false` when the sleep was cut short by cancellation.
    pub async fn sleep_unless_cancelled(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the one interrupt handler: flip the token on ctrl-c.
pub fn listen_for_interrupt(cancel: CancelToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current step");
            cancel.cancel();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_clear_and_latches() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        token.cancel(); // idempotent
        assert!(token.is_cancelled());
        // Already-cancelled token resolves immediately.
        token.cancelled().await;
    }

    #[tokio::test]
    async fn clones_observe_the_same_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_is_cut_short_by_cancel() {
        let token = CancelToken::new();
        let sleeper = token.clone();
        let handle = tokio::spawn(async move {
            sleeper.sleep_unless_cancelled(Duration::from_secs(60)).await
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
        assert!(!handle.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_when_not_cancelled() {
        let token = CancelToken::new();
        assert!(token.sleep_unless_cancelled(Duration::from_secs(1)).await);
    }
}
