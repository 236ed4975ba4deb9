// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-based navigation capability using chromiumoxide.
//!
//! Acquisition tries three strategies in priority order: a managed binary
//! under `~/.patrol/chromium/`, a browser found on the system `PATH`, and
//! finally the same binary launched visible (headed) as a last resort.

use super::{try_strategies, LoadOutcome, PageInfo, Session, SessionProvider};
use super::AcquireMode;
use crate::config::PatrolConfig;
use crate::error::{AcquireError, VisitError};
use crate::shutdown::CancelToken;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::future::BoxFuture;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

/// Find a managed Chromium binary (`PATROL_CHROMIUM_PATH` env or
/// `~/.patrol/chromium/`).
pub fn find_managed_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("PATROL_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".patrol/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".patrol/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".patrol/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".patrol/chromium/chrome-linux64/chrome"),
                home.join(".patrol/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    None
}

/// Find a browser installed on the system `PATH`.
pub fn find_system_browser() -> Option<PathBuf> {
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }
    None
}

/// Browser session provider.
pub struct ChromiumProvider {
    nav_timeout: Duration,
    ready_timeout: Duration,
    ready_interval: Duration,
    per_cycle: bool,
}

impl ChromiumProvider {
    pub fn new(cfg: &PatrolConfig, per_cycle: bool) -> Self {
        Self {
            nav_timeout: cfg.nav_timeout,
            ready_timeout: cfg.ready_poll_timeout,
            ready_interval: cfg.ready_poll_interval,
            per_cycle,
        }
    }

    async fn open_managed(&self) -> Result<ChromiumSession> {
        let path = find_managed_chromium()
            .context("no managed browser under ~/.patrol/chromium (run `patrol install`)")?;
        self.open(&path, true).await
    }

    async fn open_system(&self) -> Result<ChromiumSession> {
        let path = find_system_browser().context("no browser found on PATH")?;
        self.open(&path, true).await
    }

    async fn open_headed(&self) -> Result<ChromiumSession> {
        let path = find_managed_chromium()
            .or_else(find_system_browser)
            .context("no browser binary available")?;
        self.open(&path, false).await
    }

    async fn open(&self, binary: &Path, headless: bool) -> Result<ChromiumSession> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(binary.to_path_buf())
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--window-size=1920,1080");
        if headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .with_context(|| format!("failed to launch {}", binary.display()))?;

        // Drain CDP events for the lifetime of the browser.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open a page")?;

        debug!("browser launched: {} (headless={headless})", binary.display());

        Ok(ChromiumSession {
            browser,
            page,
            handler_task,
            nav_timeout: self.nav_timeout,
            ready_timeout: self.ready_timeout,
            ready_interval: self.ready_interval,
        })
    }
}

#[async_trait]
impl SessionProvider for ChromiumProvider {
    fn label(&self) -> &'static str {
        "browser"
    }

    fn mode(&self) -> AcquireMode {
        if self.per_cycle {
            AcquireMode::PerCycle
        } else {
            AcquireMode::PerProcess
        }
    }

    async fn acquire(&self) -> Result<Box<dyn Session>, AcquireError> {
        let strategies: Vec<(&'static str, BoxFuture<'_, Result<ChromiumSession>>)> = vec![
            ("managed chromium", Box::pin(self.open_managed())),
            ("system browser", Box::pin(self.open_system())),
            ("visible browser", Box::pin(self.open_headed())),
        ];
        let session = try_strategies(strategies).await?;
        Ok(Box::new(session))
    }
}

/// An open browser with a single page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    nav_timeout: Duration,
    ready_timeout: Duration,
    ready_interval: Duration,
}

impl ChromiumSession {
    /// Poll `document.readyState` until the page reports complete.
    async fn wait_until_ready(&self, cancel: &CancelToken) -> Result<LoadOutcome, VisitError> {
        let deadline = Instant::now() + self.ready_timeout;
        loop {
            if cancel.is_cancelled() {
                return Ok(LoadOutcome::Interrupted);
            }
            let state = self
                .page
                .evaluate("document.readyState")
                .await
                .map_err(VisitError::navigation)?;
            let complete = state
                .into_value::<String>()
                .map(|s| s == "complete")
                .unwrap_or(false);
            if complete {
                return Ok(LoadOutcome::Complete(self.page_info().await));
            }
            if Instant::now() >= deadline {
                return Err(VisitError::timeout(self.ready_timeout));
            }
            if !cancel.sleep_unless_cancelled(self.ready_interval).await {
                return Ok(LoadOutcome::Interrupted);
            }
        }
    }

    /// Best-effort title and final URL; failures here are not visit failures.
    async fn page_info(&self) -> PageInfo {
        let title = self
            .page
            .evaluate("document.title")
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok())
            .filter(|t| !t.is_empty());
        let final_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .map(|u| u.to_string());
        PageInfo {
            final_url,
            title,
            status: None,
            body_bytes: None,
        }
    }
}

#[async_trait]
impl Session for ChromiumSession {
    async fn load(&mut self, url: &str, cancel: &CancelToken) -> Result<LoadOutcome, VisitError> {
        let navigation = tokio::select! {
            _ = cancel.cancelled() => return Ok(LoadOutcome::Interrupted),
            result = tokio::time::timeout(self.nav_timeout, self.page.goto(url)) => result,
        };
        match navigation {
            Err(_) => Err(VisitError::timeout(self.nav_timeout)),
            Ok(Err(e)) => Err(VisitError::navigation(e)),
            Ok(Ok(_)) => self.wait_until_ready(cancel).await,
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumSession {
            mut browser,
            page,
            handler_task,
            ..
        } = *self;
        let _ = page.close().await;
        match browser.close().await {
            Ok(_) => {
                let _ = handler_task.await;
                Ok(())
            }
            Err(e) => {
                handler_task.abort();
                Err(anyhow::Error::new(e).context("failed to close browser"))
            }
        }
    }
}
