mod summary;
mod table;

pub use summary::render_summary;
pub use table::render_table;

use crate::ledger::PreviewRow;
use anyhow::Result;
use std::io::{self, IsTerminal, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewFormat {
    Table,
    Summary,
    Json,
    None,
}

impl std::str::FromStr for PreviewFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "summary" => Ok(Self::Summary),
            "json" => Ok(Self::Json),
            "none" => Ok(Self::None),
            _ => Err(format!("Invalid preview format: {s}")),
        }
    }
}

/// Determine whether to use colors based on explicit preference or terminal detection
pub fn should_use_color_with_detector<F>(use_color: Option<bool>, is_terminal: F) -> bool
where
    F: Fn() -> bool,
{
    match use_color {
        Some(explicit_color) => explicit_color,
        None => is_terminal(),
    }
}

/// Determine whether to use colors based on explicit preference or terminal detection
pub fn should_use_color(use_color: Option<bool>) -> bool {
    should_use_color_with_detector(use_color, || io::stdout().is_terminal())
}

/// Render preview rows in the specified format
pub fn render_preview(rows: &[PreviewRow], format: PreviewFormat, use_color: Option<bool>) -> String {
    let use_color = should_use_color(use_color);

    match format {
        PreviewFormat::Table => render_table(rows, use_color),
        PreviewFormat::Summary => render_summary(rows, use_color),
        PreviewFormat::Json => serde_json::to_string_pretty(rows).unwrap_or_default() + "\n",
        PreviewFormat::None => String::new(),
    }
}

/// Write preview rows to stdout
pub fn write_preview(rows: &[PreviewRow], format: PreviewFormat, use_color: Option<bool>) -> Result<()> {
    let output = render_preview(rows, format, use_color);
    let mut stdout = io::stdout();
    write!(stdout, "{output}")?;
    stdout.flush()?;
    Ok(())
}
