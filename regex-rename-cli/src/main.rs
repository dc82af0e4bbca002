use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use regex_rename_core::{Config, OutputFormatter, PreviewFormat, VersionResult};
use std::path::Path;
use std::process;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod apply;
mod cli;
mod preview;

use cli::{Cli, CliError, Commands, OutputFormat, PreviewArg};

fn main() {
    let interrupted = Arc::new(AtomicBool::new(false));

    let interrupted_clone = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nReceived SIGINT. Finishing the current rename...");
        interrupted_clone.store(true, Ordering::SeqCst);
    }) {
        eprintln!("Warning: could not install Ctrl-C handler: {e}");
    }

    let cli = Cli::parse();

    // Handle -C directory flag
    if let Some(ref dir) = cli.directory {
        if let Err(e) = change_directory(dir) {
            eprintln!("Error: {e:#}");
            process::exit(exit_code(&e));
        }
    }

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {e:#}, using default settings");
        Config::default()
    });

    let use_color = if cli.no_color {
        Some(false)
    } else {
        config.defaults.use_color
    };

    let preview_format = |arg: Option<PreviewArg>| -> PreviewFormat {
        arg.map(Into::into).unwrap_or_else(|| {
            PreviewFormat::from_str(&config.defaults.preview_format).unwrap_or(PreviewFormat::Table)
        })
    };

    let result = match cli.command {
        Commands::Preview {
            pipeline,
            files,
            preview,
            output,
        } => preview::handle_preview(
            &pipeline.ops,
            &files.paths,
            files.recursive || config.defaults.recursive,
            preview_format(preview),
            use_color,
            output,
        ),

        Commands::Apply {
            pipeline,
            files,
            preview,
            dry_run,
            log_file,
            output,
        } => apply::handle_apply(
            apply::ApplyArgs {
                ops: pipeline.ops,
                paths: files.paths,
                recursive: files.recursive || config.defaults.recursive,
                preview: preview_format(preview),
                dry_run,
                log_file: log_file.or_else(|| config.defaults.log_file.clone()),
                yes: cli.yes,
                use_color,
                output,
            },
            Arc::clone(&interrupted),
        ),

        Commands::Completions { shell, out_dir } => {
            let mut cmd = Cli::command();
            match out_dir {
                Some(dir) => generate_completions(shell, &mut cmd, "regex-rename", &dir),
                None => {
                    clap_complete::generate(shell, &mut cmd, "regex-rename", &mut std::io::stdout());
                    Ok(())
                },
            }
        },

        Commands::Version { output } => handle_version(output),
    };

    if interrupted.load(Ordering::SeqCst) {
        if let Err(e) = &result {
            eprintln!("Error: {e:#}");
        }
        eprintln!("Operation interrupted.");
        process::exit(130);
    }

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(exit_code(&e));
        },
    }
}

fn change_directory(dir: &Path) -> Result<()> {
    std::env::set_current_dir(dir).map_err(|e| {
        CliError::InvalidInput(format!("cannot change to directory {}: {e}", dir.display()))
            .into()
    })
}

/// 1 when some renames failed, 2 for invalid input, 3 for anything else.
fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<CliError>()
        .map_or(3, CliError::exit_code)
}

pub fn generate_completions<G: clap_complete::Generator>(
    gen: G,
    cmd: &mut clap::Command,
    name: &str,
    out_dir: &Path,
) -> Result<()> {
    use clap_complete::generate_to;
    use std::fs;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = generate_to(gen, cmd, name, out_dir)?;
    println!("Generated completion file: {}", path.display());
    Ok(())
}

fn handle_version(output: OutputFormat) -> Result<()> {
    let version_result = VersionResult {
        name: "regex-rename".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    println!("{}", version_result.format(output.into()));
    Ok(())
}
