//! Implementation of `advq compile`.

use std::process::ExitCode;

use advq_query::{OrderKey, QueryExpr, parse, parse_order};
use advq_sql::{Field, Fragment, Scope, compile_scoped};
use serde::Serialize;

use crate::cli::{
    args::CompileCommand,
    context::CommandContext,
    output::{dim, print_json, report_compile_error, subheader},
};

/// Compile settings after applying flags over configuration.
struct Resolved<'a> {
    /// Trimmed query text.
    query: &'a str,
    /// Trimmed ordering list.
    order: &'a str,
    /// User bound by per-user joins.
    username: &'a str,
    /// Media type scope.
    scope: Scope,
    /// Table for the assembled statement.
    table: &'a str,
    /// Column list for the assembled statement.
    columns: &'a str,
}

/// JSON output for a compiled query.
#[derive(Serialize)]
struct JsonCompileOutput<'a> {
    /// The query as compiled.
    query: &'a str,
    /// The ordering list as compiled.
    order: &'a str,
    /// User bound by per-user joins.
    username: &'a str,
    /// Media type scope.
    scope: Scope,
    /// Assembled statement.
    statement: String,
    /// Parameters in binding order.
    parameters: Vec<&'a str>,
    /// The fragment the statement was assembled from.
    fragment: &'a Fragment,
}

/// JSON output for `--explain`.
#[derive(Serialize)]
struct JsonExplainOutput<'a> {
    /// The query as parsed.
    query: &'a str,
    /// Parsed query AST.
    ast: QueryExpr,
    /// Parsed order keys.
    order: Vec<OrderKey>,
}

/// Compiles the query and prints the statement and its parameters.
pub fn run(ctx: &CommandContext, cmd: &CompileCommand) -> ExitCode {
    let settings = &ctx.config.compile;
    let resolved = Resolved {
        query: cmd.query.trim(),
        order: cmd.order.as_deref().unwrap_or(&settings.order).trim(),
        username: cmd.user.as_deref().unwrap_or(&settings.username),
        scope: cmd.scope.unwrap_or_else(|| ctx.config.scope()),
        table: cmd.table.as_deref().unwrap_or(&settings.table),
        columns: cmd.columns.as_deref().unwrap_or(&settings.columns),
    };
    let json = cmd.output.json || ctx.config.output.json;

    if resolved.query.is_empty() {
        eprintln!("error: query is empty");
        eprintln!("hint: run 'advq compile --help' for the query syntax");
        return ExitCode::FAILURE;
    }

    if cmd.explain.explain {
        return explain(&resolved, json);
    }

    let fragment = match compile_scoped(
        resolved.query,
        resolved.order,
        resolved.username,
        resolved.scope,
    ) {
        Ok(fragment) => fragment,
        Err(e) => {
            report_compile_error(&e);
            return ExitCode::FAILURE;
        }
    };
    let statement = fragment.select_statement(resolved.table, resolved.columns);

    if json {
        return print_json(&JsonCompileOutput {
            query: resolved.query,
            order: resolved.order,
            username: resolved.username,
            scope: resolved.scope,
            statement,
            parameters: fragment.parameters(),
            fragment: &fragment,
        });
    }

    println!("{statement}");
    println!();
    println!("{}", subheader("Parameters:"));
    let parameters = fragment.parameters();
    if parameters.is_empty() {
        println!("  {}", dim("(none)"));
    }
    for (idx, param) in parameters.iter().enumerate() {
        println!("  {}. {param}", idx + 1);
    }

    ExitCode::SUCCESS
}

/// Prints the parsed query AST and order keys.
fn explain(resolved: &Resolved<'_>, json: bool) -> ExitCode {
    let ast = match parse(resolved.query) {
        Ok(ast) => ast,
        Err(e) => {
            report_compile_error(&e.into());
            return ExitCode::FAILURE;
        }
    };
    let order = match parse_order(resolved.order) {
        Ok(order) => order,
        Err(e) => {
            report_compile_error(&e.into());
            return ExitCode::FAILURE;
        }
    };

    if json {
        return print_json(&JsonExplainOutput {
            query: resolved.query,
            ast,
            order,
        });
    }

    println!("{}", subheader("Query:"));
    println!("  {}", ast.to_query_string());
    println!();
    println!("{}", subheader("Parsed AST:"));
    for line in ast.to_string().lines() {
        println!("  {line}");
    }
    println!();
    println!("{}", subheader("Predicates:"));
    for predicate in ast.predicates() {
        let kind = Field::lookup(predicate.field()).map_or_else(
            |_| "unknown field".to_string(),
            |field| field.value_type().to_string(),
        );
        println!("  {predicate} {}", dim(&format!("({kind})")));
    }
    println!();
    println!("{}", subheader("Order keys:"));
    if order.is_empty() {
        println!("  {}", dim("(none)"));
    }
    for key in &order {
        println!("  {key} ({})", key.direction.sql());
    }

    ExitCode::SUCCESS
}
