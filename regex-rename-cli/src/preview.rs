use anyhow::{bail, Result};
use regex_rename_core::{
    load_ledger, write_preview, AddSummary, Ledger, OperationSpec, OutputFormatter, Pipeline,
    PreviewEngine, PreviewFormat, PreviewOutcome, PreviewResult,
};
use std::path::PathBuf;

use crate::cli::{CliError, OutputFormat};

/// A ledger with its preview names filled in.
pub struct PreviewSession {
    pub ledger: Ledger,
    pub pipeline: Pipeline,
    pub summary: AddSummary,
}

impl PreviewSession {
    pub fn result(&self) -> PreviewResult {
        PreviewResult {
            files: self.ledger.len(),
            changed: self.ledger.changed_count(),
            skipped: self.summary.skipped,
            operations: self.pipeline.operations().map(ToString::to_string).collect(),
            rows: self.ledger.preview_rows(),
        }
    }
}

/// Load `paths`, run the operations over them and wait for the preview.
pub fn build_preview(ops: &[OperationSpec], paths: &[PathBuf], recursive: bool) -> Result<PreviewSession> {
    let (mut ledger, summary) = load_ledger(paths, recursive)?;
    if ledger.is_empty() {
        return Err(CliError::NoFiles.into());
    }

    for op in ops {
        if let OperationSpec::Replace(spec) = op {
            if !spec.is_valid() {
                eprintln!(
                    "Warning: '{}' is not a valid regular expression, that replace step does nothing",
                    spec.pattern()
                );
            }
        }
    }

    let pipeline: Pipeline = ops.iter().cloned().collect();
    let mut engine = PreviewEngine::new();
    engine.request(&ledger, &pipeline);

    match engine.wait(&mut ledger) {
        PreviewOutcome::Applied { .. } => {},
        other => bail!("preview did not complete ({other:?})"),
    }

    Ok(PreviewSession {
        ledger,
        pipeline,
        summary,
    })
}

pub fn handle_preview(
    ops: &[OperationSpec],
    paths: &[PathBuf],
    recursive: bool,
    preview: PreviewFormat,
    use_color: Option<bool>,
    output: OutputFormat,
) -> Result<()> {
    let session = build_preview(ops, paths, recursive)?;
    let result = session.result();

    match output {
        OutputFormat::Json => {
            println!("{}", result.format_json());
        },
        OutputFormat::Summary => {
            write_preview(&result.rows, preview, use_color)?;
            print!("{}", result.format_summary());
        },
    }

    Ok(())
}
