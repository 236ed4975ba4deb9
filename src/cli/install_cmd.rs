// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! `patrol install` — one-shot browser provisioning.
//!
//! Installs a Chromium build through the platform package manager. This is an
//! external side effect, fully outside the patrol loop; a failure here is
//! reported to the operator and nothing else.

use crate::capability::chromium::{find_managed_chromium, find_system_browser};
use anyhow::{bail, Context, Result};
use std::process::Command;

pub async fn run(force: bool) -> Result<()> {
    if !force {
        if let Some(path) = find_managed_chromium().or_else(find_system_browser) {
            println!("[OK] browser already available: {}", path.display());
            println!("  Use --force to install anyway.");
            return Ok(());
        }
    }

    if !cfg!(target_os = "linux") {
        bail!(
            "automatic install is only supported on Linux; \
             download Chrome for Testing into ~/.patrol/chromium/ instead"
        );
    }

    println!("Installing chromium via the system package manager...");
    let status = Command::new("apt-get")
        .args(["install", "-y", "chromium"])
        .status()
        .context("failed to invoke apt-get (is this a Debian-based system?)")?;

    if !status.success() {
        bail!("apt-get exited with {status}; try installing chromium manually");
    }

    match find_system_browser() {
        Some(path) => {
            println!("[OK] chromium installed: {}", path.display());
            Ok(())
        }
        None => bail!("install finished but no browser was found on PATH"),
    }
}
