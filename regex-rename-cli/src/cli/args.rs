use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use regex_rename_core::OperationSpec;
use std::path::PathBuf;

use super::types::{OutputFormat, PreviewArg};

/// Batch file renaming with regex, numbering tags and previews
#[derive(Parser, Debug)]
#[command(name = "regex-rename")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Run as if started in <path> instead of the current working directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Assume yes for all prompts
    #[arg(short = 'y', long = "yes", global = true, env = "REGEX_RENAME_YES")]
    pub yes: bool,
}

/// The ordered list of naming operations
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Naming operation, applied in the order given. Repeatable.
    ///
    ///   replace:/PATTERN/REPLACEMENT/   regex on the base name; any delimiter works
    ///   prefix:TEXT
    ///   suffix:TEXT                     added before the extension
    ///   insert:POSITION:TEXT            character offset into the base name
    ///   ext:EXTENSION                   empty EXTENSION drops the extension
    ///   remove-ext
    ///   case:lower|upper|title
    ///
    /// TEXT and REPLACEMENT may contain numbering tags: <0>, <000>, <00:5>.
    /// The zeros give the minimum width, the optional number the start (default 1).
    #[arg(short = 'o', long = "op", value_name = "SPEC", verbatim_doc_comment)]
    pub ops: Vec<OperationSpec>,
}

/// Files to operate on
#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    /// Files or directories. Directories contribute the files inside them, sorted by name.
    #[arg(required = true, value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(short = 'r', long)]
    pub recursive: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the names the operations would produce
    Preview {
        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        files: FileArgs,

        /// Preview output format (defaults from config if not specified)
        #[arg(long, value_enum)]
        preview: Option<PreviewArg>,

        /// Output format for the result summary
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Preview, confirm, then rename the files on disk
    Apply {
        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        files: FileArgs,

        /// Preview output format (defaults from config if not specified)
        #[arg(long, value_enum)]
        preview: Option<PreviewArg>,

        /// Show what would be renamed without touching the disk
        #[arg(long)]
        dry_run: bool,

        /// Append every rename attempt to this file
        #[arg(long, value_name = "PATH")]
        log_file: Option<PathBuf>,

        /// Output format for the result summary
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,

        /// Write the completion file into this directory instead of stdout
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Show version information
    Version {
        /// Output format
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ops_keep_their_order() {
        let cli = Cli::parse_from([
            "regex-rename",
            "preview",
            "--op",
            "suffix:_b",
            "-o",
            "prefix:a_",
            "--op",
            "replace:/x/y/",
            "file.txt",
        ]);

        let Commands::Preview { pipeline, files, .. } = cli.command else {
            panic!("expected preview command");
        };
        assert_eq!(
            pipeline.ops,
            vec![
                OperationSpec::suffix("_b"),
                OperationSpec::prefix("a_"),
                OperationSpec::replace("x", "y"),
            ]
        );
        assert_eq!(files.paths, vec![PathBuf::from("file.txt")]);
    }

    #[test]
    fn test_bad_op_is_rejected() {
        let result = Cli::try_parse_from(["regex-rename", "preview", "--op", "shout:x", "f"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_color_flag() {
        let cli = Cli::parse_from(["regex-rename", "--no-color", "version"]);
        assert!(cli.no_color);
    }

    #[test]
    fn test_paths_are_required() {
        let result = Cli::try_parse_from(["regex-rename", "apply", "--op", "prefix:x"]);
        assert!(result.is_err());
    }
}
