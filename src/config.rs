// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! Patrol configuration.
//!
//! The target list and all timing constants are fixed at construction time.
//! Environment variables provide the only override surface:
//!
//! - `PATROL_TARGETS`        comma-separated URLs replacing the default list
//! - `PATROL_DWELL_SECS`     dwell applied uniformly to every target
//! - `PATROL_NAV_TIMEOUT_SECS`   outer navigation bound (default 30)
//! - `PATROL_CYCLE_PAUSE_SECS`   inter-cycle pause (default per engine variant)
//! - `PATROL_CHROMIUM_PATH`  explicit browser binary (see capability::chromium)

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Default target list: URL plus per-site dwell in seconds.
const DEFAULT_TARGETS: &[(&str, u64)] = &[
    ("https://example.com", 10),
    ("https://example.org", 10),
];

const DEFAULT_NAV_TIMEOUT_SECS: u64 = 30;
const DEFAULT_READY_POLL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_READY_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_TYPE_PAUSE_SECS: u64 = 1;

/// A site to keep warm and how long to stay on it per visit.
#[derive(Debug, Clone, Serialize)]
pub struct Target {
    pub url: String,
    pub dwell: Duration,
}

/// Construction-time runtime configuration.
#[derive(Debug, Clone)]
pub struct PatrolConfig {
    /// Ordered target list; visited in this order every cycle.
    pub targets: Vec<Target>,
    /// Outer bound on a single navigation or GET.
    pub nav_timeout: Duration,
    /// Bound on the browser readiness poll after navigation.
    pub ready_poll_timeout: Duration,
    /// Interval between readiness probes.
    pub ready_poll_interval: Duration,
    /// Simulated URL-typing pause before an HTTP GET.
    pub type_pause: Duration,
    /// Inter-cycle pause override; `None` means the engine variant default.
    pub cycle_pause: Option<Duration>,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            targets: DEFAULT_TARGETS
                .iter()
                .map(|(url, secs)| Target {
                    url: (*url).to_string(),
                    dwell: Duration::from_secs(*secs),
                })
                .collect(),
            nav_timeout: Duration::from_secs(DEFAULT_NAV_TIMEOUT_SECS),
            ready_poll_timeout: Duration::from_secs(DEFAULT_READY_POLL_TIMEOUT_SECS),
            ready_poll_interval: Duration::from_millis(DEFAULT_READY_POLL_INTERVAL_MS),
            type_pause: Duration::from_secs(DEFAULT_TYPE_PAUSE_SECS),
            cycle_pause: None,
        }
    }
}

impl PatrolConfig {
    /// Build the configuration, applying any environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(raw) = read_env_string("PATROL_TARGETS") {
            let dwell = Duration::from_secs(
                DEFAULT_TARGETS.first().map(|(_, secs)| *secs).unwrap_or(10),
            );
            cfg.targets =
                parse_target_list(&raw, dwell).context("invalid PATROL_TARGETS")?;
        }
        if let Some(secs) = read_env_u64("PATROL_DWELL_SECS") {
            if secs == 0 {
                bail!("PATROL_DWELL_SECS must be greater than zero");
            }
            for target in &mut cfg.targets {
                target.dwell = Duration::from_secs(secs);
            }
        }
        if let Some(secs) = read_env_u64("PATROL_NAV_TIMEOUT_SECS") {
            cfg.nav_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = read_env_u64("PATROL_CYCLE_PAUSE_SECS") {
            cfg.cycle_pause = Some(Duration::from_secs(secs));
        }

        Ok(cfg)
    }
}

/// Parse a comma-separated URL list into targets with a uniform dwell.
pub fn parse_target_list(raw: &str, dwell: Duration) -> Result<Vec<Target>> {
    let mut targets = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed = Url::parse(trimmed)
            .with_context(|| format!("'{trimmed}' is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("'{trimmed}' must use http or https");
        }
        targets.push(Target {
            url: trimmed.to_string(),
            dwell,
        });
    }
    if targets.is_empty() {
        bail!("target list is empty");
    }
    Ok(targets)
}

fn read_env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse::<u64>().ok())
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_ordered_targets() {
        let cfg = PatrolConfig::default();
        assert_eq!(cfg.targets.len(), 2);
        assert_eq!(cfg.targets[0].url, "https://example.com");
        assert_eq!(cfg.targets[0].dwell, Duration::from_secs(10));
        assert_eq!(cfg.nav_timeout, Duration::from_secs(30));
    }

    #[test]
    fn parses_comma_separated_urls() {
        let targets = parse_target_list(
            "https://a.example, https://b.example ,",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].url, "https://a.example");
        assert_eq!(targets[1].url, "https://b.example");
        assert_eq!(targets[1].dwell, Duration::from_secs(5));
    }

    #[test]
    fn rejects_invalid_and_non_http_urls() {
        assert!(parse_target_list("not a url", Duration::from_secs(1)).is_err());
        assert!(parse_target_list("ftp://a.example", Duration::from_secs(1)).is_err());
        assert!(parse_target_list(" , ", Duration::from_secs(1)).is_err());
    }
}
