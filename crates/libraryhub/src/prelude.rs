pub use crate::error::Error;

pub use anstream::eprintln;
pub use anstream::println;
pub use color_eyre::eyre::{eyre, Context, OptionExt, Result};

/// Borderless table with a bold cyan header row.
pub fn new_table(headers: &[&str]) -> prettytable::Table {
    use colored::Colorize;

    let mut table = prettytable::Table::new();
    table.set_format(
        prettytable::format::FormatBuilder::new()
            .padding(1, 1)
            .build(),
    );
    table.set_titles(prettytable::Row::new(
        headers
            .iter()
            .map(|h| prettytable::Cell::new(&h.bold().cyan().to_string()))
            .collect(),
    ));

    table
}

/// Pretty-print any serializable value to stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
