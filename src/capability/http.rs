// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! Plain-HTTP navigation capability wrapping reqwest.
//!
//! Not a browser — a reusable client with browser-like headers. "Acquisition"
//! is just building the client once and cannot fail under normal conditions.

use super::{AcquireMode, LoadOutcome, PageInfo, Session, SessionProvider};
use crate::config::PatrolConfig;
use crate::error::{classify_transport, AcquireError, VisitError};
use crate::shutdown::CancelToken;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;
use tracing::{info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36";

/// HTTP session provider. Single strategy; effectively infallible.
pub struct HttpProvider {
    timeout: Duration,
    type_pause: Duration,
}

impl HttpProvider {
    pub fn new(timeout: Duration, type_pause: Duration) -> Self {
        Self { timeout, type_pause }
    }

    pub fn from_config(cfg: &PatrolConfig) -> Self {
        Self::new(cfg.nav_timeout, cfg.type_pause)
    }
}

#[async_trait]
impl SessionProvider for HttpProvider {
    fn label(&self) -> &'static str {
        "http"
    }

    fn mode(&self) -> AcquireMode {
        AcquireMode::PerProcess
    }

    async fn acquire(&self) -> Result<Box<dyn Session>, AcquireError> {
        let session = HttpSession::new(self.timeout, self.type_pause)
            .map_err(|e| AcquireError::exhausted(1, Some(format!("{e:#}"))))?;
        Ok(Box::new(session))
    }
}

/// A reusable HTTP client posing as a browser.
pub struct HttpSession {
    client: reqwest::Client,
    timeout: Duration,
    type_pause: Duration,
}

impl HttpSession {
    pub fn new(timeout: Duration, type_pause: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            timeout,
            type_pause,
        })
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn load(&mut self, url: &str, cancel: &CancelToken) -> Result<LoadOutcome, VisitError> {
        // Simulate typing the URL before hitting enter.
        info!("typing URL: {url}");
        if !self.type_pause.is_zero() && !cancel.sleep_unless_cancelled(self.type_pause).await {
            return Ok(LoadOutcome::Interrupted);
        }

        info!("requesting {url}");
        let response = tokio::select! {
            _ = cancel.cancelled() => return Ok(LoadOutcome::Interrupted),
            result = self.client.get(url).send() => {
                result.map_err(|e| classify_transport(e, self.timeout))?
            }
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = tokio::select! {
            _ = cancel.cancelled() => return Ok(LoadOutcome::Interrupted),
            result = response.text() => {
                result.map_err(|e| classify_transport(e, self.timeout))?
            }
        };

        let title = match extract_title(&body) {
            TitleExtract::Found(t) => Some(t),
            TitleExtract::NotFound => {
                info!("title: not found in document");
                None
            }
            TitleExtract::Unparseable => {
                warn!("title: extraction failed");
                None
            }
        };

        Ok(LoadOutcome::Complete(PageInfo {
            final_url: Some(final_url),
            title,
            status: Some(status),
            body_bytes: Some(body.len() as u64),
        }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        // Dropping the client closes its connection pool.
        Ok(())
    }
}

/// Result of the best-effort `<title>` scan.
#[derive(Debug, PartialEq)]
pub(crate) enum TitleExtract {
    Found(String),
    NotFound,
    Unparseable,
}

/// Locate the first `<title>…</title>` substring.
///
/// Absence of either marker is NotFound; a slice that falls outside the
/// document is Unparseable rather than a panic.
pub(crate) fn extract_title(html: &str) -> TitleExtract {
    const OPEN: &str = "<title>";
    const CLOSE: &str = "</title>";

    let Some(open_at) = html.find(OPEN) else {
        return TitleExtract::NotFound;
    };
    let start = open_at + OPEN.len();
    let Some(close_rel) = html[start..].find(CLOSE) else {
        return TitleExtract::NotFound;
    };
    match html.get(start..start + close_rel) {
        Some(raw) => TitleExtract::Found(raw.trim().to_string()),
        None => TitleExtract::Unparseable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_and_trims_title() {
        let html = "<html><head><title>  Hello World </title></head></html>";
        assert_eq!(
            extract_title(html),
            TitleExtract::Found("Hello World".to_string())
        );
    }

    #[test]
    fn missing_markers_are_not_found() {
        assert_eq!(extract_title("<html></html>"), TitleExtract::NotFound);
        assert_eq!(
            extract_title("<title>never closed"),
            TitleExtract::NotFound
        );
        assert_eq!(extract_title(""), TitleExtract::NotFound);
    }

    #[test]
    fn first_title_wins() {
        let html = "<title>one</title><title>two</title>";
        assert_eq!(extract_title(html), TitleExtract::Found("one".to_string()));
    }

    #[test]
    fn empty_title_is_found_and_empty() {
        assert_eq!(
            extract_title("<title></title>"),
            TitleExtract::Found(String::new())
        );
    }

    #[test]
    fn session_builds_without_network() {
        let session = HttpSession::new(Duration::from_secs(30), Duration::from_secs(1));
        assert!(session.is_ok());
    }
}
