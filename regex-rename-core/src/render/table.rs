use crate::ledger::PreviewRow;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use std::io::{self, IsTerminal};

/// Render preview rows as a table, one row per file.
pub fn render_table(rows: &[PreviewRow], use_color: bool) -> String {
    let mut table = Table::new();

    if io::stdout().is_terminal() {
        table.set_content_arrangement(ContentArrangement::Dynamic);
    } else {
        table.set_content_arrangement(ContentArrangement::Disabled);
    }

    // Force styling even in non-TTY environments when colors are explicitly requested
    if use_color {
        table.enforce_styling();
        table.set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Original").fg(Color::Cyan),
            Cell::new("Preview").fg(Color::Cyan),
        ]);
    } else {
        table.set_header(vec!["#", "Original", "Preview"]);
    }

    for (index, row) in rows.iter().enumerate() {
        let number = (index + 1).to_string();
        if use_color && row.changed {
            table.add_row(vec![
                Cell::new(&number),
                Cell::new(&row.original_name),
                Cell::new(&row.preview_name)
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold),
            ]);
        } else if use_color {
            table.add_row(vec![
                Cell::new(&number),
                Cell::new(&row.original_name),
                Cell::new(&row.preview_name).fg(Color::DarkGrey),
            ]);
        } else {
            table.add_row(vec![&number, &row.original_name, &row.preview_name]);
        }
    }

    format!("{table}\n")
}
