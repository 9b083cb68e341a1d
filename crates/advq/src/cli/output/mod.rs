//! Rendering and JSON serialization for CLI output.

use std::{
    io::{self, IsTerminal},
    process::ExitCode,
};

use advq_sql::CompileError;
use serde::Serialize;

/// ANSI escape sequences used for styling.
mod colors {
    /// Reset all attributes.
    pub const RESET: &str = "\x1b[0m";
    /// Bold text.
    pub const BOLD: &str = "\x1b[1m";
    /// Dimmed text.
    pub const DIM: &str = "\x1b[2m";
}

/// Wraps `text` in `style` when stdout is a terminal.
fn styled(style: &str, text: &str) -> String {
    if io::stdout().is_terminal() {
        format!("{style}{text}{}", colors::RESET)
    } else {
        text.to_string()
    }
}

/// Formats text as a section heading (bold).
pub fn subheader(text: &str) -> String {
    styled(colors::BOLD, text)
}

/// Formats text as dimmed/less important.
pub fn dim(text: &str) -> String {
    styled(colors::DIM, text)
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Prints a compile error to stderr with a hint. Parse errors also show the
/// offending query line with a caret.
pub fn report_compile_error(err: &CompileError) {
    if let CompileError::Parse(parse) = err {
        eprintln!("error: {}", parse.format_with_context());
        return;
    }
    eprintln!("error: {err}");
    if let Some(hint) = err.suggestion() {
        eprintln!("hint: {hint}");
    }
}

/// Indents every line by two spaces.
pub fn indent(text: &str) -> String {
    text.lines().map(|line| format!("  {line}\n")).collect()
}
