// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! `patrol run` — start the keep-warm loop.

use super::Engine;
use crate::capability::chromium::ChromiumProvider;
use crate::capability::http::HttpProvider;
use crate::capability::SessionProvider;
use crate::config::PatrolConfig;
use crate::shutdown::{self, CancelToken};
use crate::supervisor::Supervisor;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Inter-cycle pause when the browser session lives for the whole process.
const LONG_LIVED_PAUSE: Duration = Duration::from_secs(2);
/// Inter-cycle pause for the fresh-browser and HTTP variants.
const FRESH_PAUSE: Duration = Duration::from_secs(3);

pub async fn run(engine: Engine, fresh: bool, json: bool) -> Result<()> {
    let cfg = PatrolConfig::from_env().context("invalid configuration")?;

    if fresh && engine == Engine::Http {
        warn!("--fresh has no effect with the http engine");
    }

    let provider: Box<dyn SessionProvider> = match engine {
        Engine::Browser => Box::new(ChromiumProvider::new(&cfg, fresh)),
        Engine::Http => Box::new(HttpProvider::from_config(&cfg)),
    };
    let pause = cfg.cycle_pause.unwrap_or(match engine {
        Engine::Browser if !fresh => LONG_LIVED_PAUSE,
        _ => FRESH_PAUSE,
    });

    banner(&cfg, provider.label(), fresh, pause);

    let cancel = CancelToken::new();
    shutdown::listen_for_interrupt(cancel.clone());

    let supervisor = Supervisor::new(provider, cfg.targets, pause, cancel);
    let summary = supervisor.run().await?;

    if json {
        println!("{}", serde_json::to_string(&summary)?);
    }
    Ok(())
}

fn banner(cfg: &PatrolConfig, engine: &str, fresh: bool, pause: Duration) {
    info!("patrol v{}", env!("CARGO_PKG_VERSION"));
    info!("targets:");
    for (index, target) in cfg.targets.iter().enumerate() {
        info!(
            "  {}. {} ({}s dwell)",
            index + 1,
            target.url,
            target.dwell.as_secs()
        );
    }
    let lifetime = if fresh {
        "fresh session every cycle"
    } else {
        "long-lived session"
    };
    info!("engine: {engine} ({lifetime})");
    info!(
        "mode: unbounded loop, {}s between cycles, ctrl-c to stop",
        pause.as_secs()
    );
}
