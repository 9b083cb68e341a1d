//! Implementation of `advq fields`.

use std::process::ExitCode;

use advq_sql::Field;
use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};

use crate::cli::{args::FieldsCommand, output::print_json};

/// Lists the searchable fields with their types and columns.
pub fn run(cmd: &FieldsCommand) -> ExitCode {
    if cmd.output.json {
        return print_json(&Field::ALL);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Field", "Type", "Column"]);
    for field in Field::ALL {
        let column = field
            .sql_full_column()
            .unwrap_or_else(|| String::from("(computed, order only)"));
        table.add_row(vec![
            Cell::new(field.name()),
            Cell::new(field.value_type().to_string()),
            Cell::new(column),
        ]);
    }
    println!("{table}");

    ExitCode::SUCCESS
}
