use clap::ValueEnum;
use regex_rename_core::PreviewFormat;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PreviewArg {
    Table,
    Summary,
    Json,
    None,
}

impl From<PreviewArg> for PreviewFormat {
    fn from(arg: PreviewArg) -> Self {
        match arg {
            PreviewArg::Table => Self::Table,
            PreviewArg::Summary => Self::Summary,
            PreviewArg::Json => Self::Json,
            PreviewArg::None => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl From<OutputFormat> for regex_rename_core::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// Failures that map to a specific exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("no files to rename: none of the given paths is an existing regular file")]
    NoFiles,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} file(s) could not be renamed")]
    RenameErrors(usize),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RenameErrors(_) => 1,
            Self::NoFiles | Self::InvalidInput(_) => 2,
        }
    }
}
