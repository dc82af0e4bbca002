use crate::ledger::PreviewRow;
use nu_ansi_term::Color as AnsiColor;
use std::fmt::Write;

/// Render a compact summary listing only the files that change.
pub fn render_summary(rows: &[PreviewRow], use_color: bool) -> String {
    let mut output = String::new();
    let changed: Vec<&PreviewRow> = rows.iter().filter(|row| row.changed).collect();

    writeln!(output, "[PREVIEW]").unwrap();
    writeln!(output, "Files: {}", rows.len()).unwrap();
    writeln!(output, "Changed: {}", changed.len()).unwrap();

    if changed.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No changes.").unwrap();
        return output;
    }

    writeln!(output).unwrap();
    for row in changed {
        if use_color {
            writeln!(
                output,
                "{} -> {}",
                AnsiColor::Red.paint(&row.original_name),
                AnsiColor::Green.bold().paint(&row.preview_name)
            )
            .unwrap();
        } else {
            writeln!(output, "{} -> {}", row.original_name, row.preview_name).unwrap();
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample_rows;

    #[test]
    fn test_summary_lists_changed_rows() {
        insta::assert_snapshot!(render_summary(&sample_rows(), false), @r"
        [PREVIEW]
        Files: 2
        Changed: 1

        IMG_0001.jpg -> holiday_01.jpg
        ");
    }

    #[test]
    fn test_summary_without_changes() {
        let rows = vec![sample_rows().remove(1)];
        insta::assert_snapshot!(render_summary(&rows, false), @r"
        [PREVIEW]
        Files: 1
        Changed: 0

        No changes.
        ");
    }

    #[test]
    fn test_summary_color() {
        let output = render_summary(&sample_rows(), true);
        assert!(output.contains(&AnsiColor::Green.bold().paint("holiday_01.jpg").to_string()));
    }
}
