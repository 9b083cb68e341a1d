//! Command-line interface for the `advq` query compiler.

use std::{
    io::{self, IsTerminal},
    process::ExitCode,
};

use advq::cli::{
    CommandContext,
    args::{Cli, Commands},
    commands,
};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "ADVQ_LOG";

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    // init must work even when an existing config file is broken
    let ctx = match cli.command {
        Commands::Init(_) => CommandContext::load_cwd_only(),
        _ => CommandContext::load(),
    };
    let ctx = match ctx {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    commands::run(cli.command, &ctx)
}

/// Installs a stderr log subscriber filtered by `ADVQ_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal())
                .with_target(false),
        )
        .with(filter)
        .init();
}
