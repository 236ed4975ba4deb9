// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the patrol binary.

pub mod doctor;
pub mod install_cmd;
pub mod run_cmd;

use clap::ValueEnum;

/// Which navigation engine the patrol uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    /// Headless browser (chromiumoxide).
    Browser,
    /// Plain HTTP requests (reqwest).
    Http,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Browser => write!(f, "browser"),
            Self::Http => write!(f, "http"),
        }
    }
}
