use crate::commit::RenameReport;
use crate::ledger::PreviewRow;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

/// Result of a preview run
#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResult {
    pub files: usize,
    pub changed: usize,
    /// Files that were given but could not be added.
    pub skipped: usize,
    pub operations: Vec<String>,
    pub rows: Vec<PreviewRow>,
}

/// Result of a commit run
#[derive(Debug, Serialize, Deserialize)]
pub struct CommitResult {
    pub dry_run: bool,
    pub planned: usize,
    pub report: RenameReport,
}

/// Result of a version command
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResult {
    pub name: String,
    pub version: String,
}

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }

    fn format_json(&self) -> String;
    fn format_summary(&self) -> String;
}

impl OutputFormatter for PreviewResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": true,
            "operation": "preview",
            "summary": {
                "files": self.files,
                "changed": self.changed,
                "skipped": self.skipped,
            },
            "operations": self.operations,
            "rows": self.rows,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();
        write!(output, "{} of {} file(s) will be renamed", self.changed, self.files).unwrap();
        if self.skipped > 0 {
            write!(output, " ({} skipped)", self.skipped).unwrap();
        }
        output.push('\n');
        output
    }
}

impl OutputFormatter for CommitResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.report.is_clean(),
            "operation": "apply",
            "dry_run": self.dry_run,
            "summary": {
                "planned": self.planned,
                "renamed": self.report.success_count,
                "errors": self.report.errors.len(),
            },
            "renamed": self.report.renamed,
            "errors": self.report.errors,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.dry_run {
            return format!("Dry run: {} file(s) would be renamed\n", self.planned);
        }

        let mut output = String::new();
        if self.report.success_count > 0 {
            writeln!(output, "✓ Renamed {} file(s)", self.report.success_count).unwrap();
        } else if self.report.is_clean() {
            writeln!(output, "Nothing to rename").unwrap();
        }

        if !self.report.errors.is_empty() {
            writeln!(output, "✗ {} error(s):", self.report.errors.len()).unwrap();
            for error in &self.report.errors {
                writeln!(output, "  {error}").unwrap();
            }
        }

        output
    }
}

impl OutputFormatter for VersionResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "name": self.name,
            "version": self.version,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}
