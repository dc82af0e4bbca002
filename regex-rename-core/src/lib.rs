#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod commit;
pub mod config;
pub mod files;
pub mod ledger;
pub mod operation;
pub mod output;
pub mod pipeline;
pub mod preview;
pub mod render;
pub mod tags;

pub use commit::{
    commit, detect_case_insensitive_fs, is_valid_file_name, CommitOptions, RenameReport,
    RenamedFile,
};
pub use config::Config;
pub use files::{collect_paths, load_ledger};
pub use ledger::{AddSummary, FileRecord, Ledger, PreviewRow};
pub use operation::{split_extension, CaseMode, OperationParseError, OperationSpec, ReplaceSpec};
pub use output::{
    CommitResult, OutputFormat, OutputFormatter, PreviewResult, VersionResult,
};
pub use pipeline::{evaluate, Pipeline};
pub use preview::{Notifier, PreviewEngine, PreviewOutcome};
pub use render::{render_preview, should_use_color, write_preview, PreviewFormat};
