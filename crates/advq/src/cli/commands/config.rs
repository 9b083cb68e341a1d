//! Implementation of `advq config`.

use std::process::ExitCode;

use crate::cli::{context::CommandContext, output::dim};

/// Shows effective configuration settings.
///
/// Validation warnings were already logged when the context loaded.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;

    let toml = match config.settings_to_toml() {
        Ok(toml) => toml,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if config.sources.is_empty() {
        println!("{}", dim("# no configuration files found, showing defaults"));
    }
    for path in &config.sources {
        println!("{}", dim(&format!("# from {}", path.display())));
    }
    print!("{toml}");

    ExitCode::SUCCESS
}
