use anyhow::Result;
use regex_rename_core::{
    commit, write_preview, CommitOptions, CommitResult, OperationSpec, OutputFormatter,
    PreviewFormat, RenameReport,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::cli::{CliError, OutputFormat};
use crate::preview::build_preview;

pub struct ApplyArgs {
    pub ops: Vec<OperationSpec>,
    pub paths: Vec<PathBuf>,
    pub recursive: bool,
    pub preview: PreviewFormat,
    pub dry_run: bool,
    pub log_file: Option<PathBuf>,
    pub yes: bool,
    pub use_color: Option<bool>,
    pub output: OutputFormat,
}

pub fn handle_apply(args: ApplyArgs, interrupted: Arc<AtomicBool>) -> Result<()> {
    let mut session = build_preview(&args.ops, &args.paths, args.recursive)?;
    let planned = session.ledger.changed_count();

    if args.output == OutputFormat::Summary {
        write_preview(&session.ledger.preview_rows(), args.preview, args.use_color)?;
    }

    if planned == 0 || args.dry_run {
        let result = CommitResult {
            dry_run: args.dry_run,
            planned,
            report: RenameReport::default(),
        };
        print_result(&result, args.output);
        return Ok(());
    }

    if !args.yes && !get_user_confirmation(planned, args.output)? {
        match args.output {
            OutputFormat::Json => eprintln!("Operation cancelled."),
            OutputFormat::Summary => println!("Operation cancelled."),
        }
        return Ok(());
    }

    let options = CommitOptions {
        log_file: args.log_file,
        interrupt: Some(interrupted),
    };
    let report = commit(&mut session.ledger, &options);
    let errors = report.errors.len();

    print_result(
        &CommitResult {
            dry_run: false,
            planned,
            report,
        },
        args.output,
    );

    if errors > 0 {
        return Err(CliError::RenameErrors(errors).into());
    }
    Ok(())
}

fn print_result(result: &CommitResult, output: OutputFormat) {
    match output {
        OutputFormat::Json => println!("{}", result.format_json()),
        OutputFormat::Summary => print!("{}", result.format_summary()),
    }
}

/// Ask on stdin. In JSON mode the prompt goes to stderr so stdout stays one document.
fn get_user_confirmation(planned: usize, output: OutputFormat) -> Result<bool> {
    let prompt = format!("Rename {planned} file(s)? [y/N]: ");
    match output {
        OutputFormat::Json => {
            let mut stderr = io::stderr();
            write!(stderr, "{prompt}")?;
            stderr.flush()?;
        },
        OutputFormat::Summary => {
            let mut stdout = io::stdout();
            write!(stdout, "{prompt}")?;
            stdout.flush()?;
        },
    }

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;

    Ok(response.trim().eq_ignore_ascii_case("y"))
}
