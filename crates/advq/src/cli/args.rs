//! Clap argument definitions for the `advq` CLI.

use advq_sql::Scope;
use clap::{Args, Parser, Subcommand};

/// Parses a scope name.
fn parse_scope(s: &str) -> Result<Scope, String> {
    s.parse()
}

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "advq")]
#[command(version)]
#[command(about = "Compile advanced media search queries into SQL")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared output mode flags.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Shared explain/debug flag.
#[derive(Args, Debug, Clone, Default)]
pub struct ExplainArgs {
    /// Show the parsed query AST and order keys without compiling
    #[arg(long)]
    pub explain: bool,
}

/// Arguments for `advq compile`.
#[derive(Args, Debug, Clone)]
pub struct CompileCommand {
    /// Advanced search query
    pub query: String,

    /// Ordering list, e.g. "-lastplayed, artist" [default: from config]
    #[arg(short = 'o', long, allow_hyphen_values = true)]
    pub order: Option<String>,

    /// User bound by starred, albumrating and ranking [default: admin]
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Media type scope: all, songs, albums, artists [default: all]
    #[arg(short = 's', long, value_parser = parse_scope)]
    pub scope: Option<Scope>,

    /// Table named in the assembled statement [default: media_file]
    #[arg(long)]
    pub table: Option<String>,

    /// Column list selected by the assembled statement [default: media_file.*]
    #[arg(long)]
    pub columns: Option<String>,

    #[command(flatten)]
    /// Output formatting flags.
    pub output: OutputArgs,

    #[command(flatten)]
    /// Explain/debug flags.
    pub explain: ExplainArgs,
}

/// Arguments for `advq fields`.
#[derive(Args, Debug, Clone)]
pub struct FieldsCommand {
    #[command(flatten)]
    /// Output formatting flags.
    pub output: OutputArgs,
}

/// Arguments for `advq init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.advq.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `advq` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Compile a query and print the SQL statement and parameters
    #[command(after_help = "\
QUERY SYNTAX:
  field:value           Contains (text) or equals (numbers, dates)
  field=value           Exact match
  field~regexp          Regular expression (text fields)
  field<value           Also <=, >, >= (numbers, dates)
  field:[low TO high]   Inclusive range
  field:null            Missing value
  \"quoted value\"        Values with spaces
  a:1 b:2               Both (implicit AND)
  a:1 OR b:2            Either
  NOT a:1               Negation
  (expr)                Grouping

ORDERING:
  Comma-separated fields, '-' for descending: -lastplayed, artist

EXAMPLES:
  advq compile 'artist:queen year<1980'
  advq compile 'starred:y' -o '-ranking' -u alice
  advq compile 'genre:rock OR genre:\"hard rock\"' --scope songs
  advq compile 'year:[1990 TO 1999] NOT albumrating<3' --json")]
    Compile(CompileCommand),

    /// List the searchable fields
    Fields(FieldsCommand),

    /// Initialize advq configuration in current directory
    Init(InitCommand),

    /// Show effective configuration settings
    Config,
}
