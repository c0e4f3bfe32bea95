//! Output formatting utilities
//!
//! Standard output carries data (audit lines, CSV, JSON); everything meant
//! for the operator goes to standard error.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

/// Print a success message
pub fn success(msg: &str) {
    eprintln!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{}", msg.yellow());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print `label | count` rows as a table
pub fn counts(rows: &[(&str, usize)]) {
    let mut table = create_table();
    for (label, count) in rows {
        table.add_row(vec![label.to_string(), count.to_string()]);
    }
    eprintln!("{}", table);
}
