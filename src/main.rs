// Copyright 2026 Patrol Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use patrol::cli::{self, Engine};

#[derive(Parser)]
#[command(
    name = "patrol",
    about = "Patrol — keep-warm site patrol runtime",
    version,
    after_help = "Run 'patrol <command> --help' for details on each command."
)]
struct Cli {
    /// Print the final run summary as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the patrol loop until interrupted
    Run {
        /// Navigation engine
        #[arg(long, value_enum, default_value_t = Engine::Browser)]
        engine: Engine,
        /// Open and fully tear down the browser every cycle
        #[arg(long)]
        fresh: bool,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Install a browser binary
    Install {
        /// Install even if a browser is already available
        #[arg(long)]
        force: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "patrol=debug"
    } else if cli.quiet {
        "patrol=warn"
    } else {
        "patrol=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let result = match cli.command {
        Commands::Run { engine, fresh } => cli::run_cmd::run(engine, fresh, cli.json).await,
        Commands::Doctor => cli::doctor::run().await,
        Commands::Install { force } => cli::install_cmd::run(force).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "patrol", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success (including graceful interrupt), 1=error.
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
