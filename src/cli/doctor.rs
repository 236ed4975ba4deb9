// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! Environment readiness check.

use crate::capability::chromium::{find_managed_chromium, find_system_browser};
use crate::config::PatrolConfig;
use anyhow::Result;
use url::Url;

/// Check browser availability and target validity.
pub async fn run() -> Result<()> {
    println!("Patrol Doctor");
    println!("=============");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    // Acquisition strategies, in the order the patrol tries them.
    let managed = find_managed_chromium();
    match &managed {
        Some(path) => println!("[OK] managed browser: {}", path.display()),
        None => println!("[!!] no managed browser under ~/.patrol/chromium (run `patrol install`)"),
    }
    let system = find_system_browser();
    match &system {
        Some(path) => println!("[OK] system browser: {}", path.display()),
        None => println!("[!!] no browser found on PATH"),
    }

    println!();

    let cfg = PatrolConfig::from_env()?;
    for target in &cfg.targets {
        match Url::parse(&target.url) {
            Ok(parsed) => println!(
                "[OK] target {} ({}s dwell, host {})",
                target.url,
                target.dwell.as_secs(),
                parsed.host_str().unwrap_or("?")
            ),
            Err(e) => println!("[!!] target {}: {e}", target.url),
        }
    }

    println!();
    if managed.is_some() || system.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY for the browser engine");
        println!("  Run `patrol install`, or use `patrol run --engine http`.");
    }

    Ok(())
}
