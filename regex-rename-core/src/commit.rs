use crate::ledger::Ledger;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Options for [`commit`].
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Append a timestamped line for every attempt and outcome to this file.
    pub log_file: Option<PathBuf>,
    /// When set, files not yet renamed are skipped.
    pub interrupt: Option<Arc<AtomicBool>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Result of one commit. Failures are collected here rather than aborting the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameReport {
    pub success_count: usize,
    pub errors: Vec<String>,
    #[serde(default)]
    pub renamed: Vec<RenamedFile>,
}

impl RenameReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Append-only rename log.
struct CommitLog {
    file: Option<File>,
}

impl CommitLog {
    fn disabled() -> Self {
        Self { file: None }
    }

    fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory {}", parent.display())
                })?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Ok(Self { file: Some(file) })
    }

    fn write(&mut self, message: &str) -> io::Result<()> {
        if let Some(ref mut file) = self.file {
            writeln!(
                file,
                "[{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                message
            )?;
            file.flush()?;
        }
        Ok(())
    }

    /// Log a line. A write failure turns logging off for the rest of the run.
    fn log(&mut self, message: &str) {
        if let Err(e) = self.write(message) {
            eprintln!("Warning: failed to write rename log: {e}");
            self.file = None;
        }
    }
}

struct PendingRename {
    index: usize,
    from: PathBuf,
    directory: PathBuf,
    original_name: String,
    new_name: String,
}

/// Rename every changed record in `ledger` on disk, one at a time.
///
/// Existing files are never overwritten. Successful renames are written back into the
/// ledger, so committing again without a new preview does nothing.
pub fn commit(ledger: &mut Ledger, options: &CommitOptions) -> RenameReport {
    let mut log = match options.log_file.as_deref() {
        Some(path) => CommitLog::open(path).unwrap_or_else(|e| {
            eprintln!("Warning: {e:#}, continuing without a rename log");
            CommitLog::disabled()
        }),
        None => CommitLog::disabled(),
    };

    let pending: Vec<PendingRename> = ledger
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| r.new_name != r.original_name)
        .map(|(index, r)| PendingRename {
            index,
            from: r.original_path.clone(),
            directory: r.directory.clone(),
            original_name: r.original_name.clone(),
            new_name: r.new_name.clone(),
        })
        .collect();

    let mut report = RenameReport::default();
    if pending.is_empty() {
        return report;
    }
    log.log(&format!("Starting commit of {} file(s)", pending.len()));

    let mut case_insensitive: HashMap<PathBuf, bool> = HashMap::new();

    for item in pending {
        let interrupted = options
            .interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst));
        if interrupted {
            let message = format!("Skipped '{}': interrupted", item.original_name);
            log.log(&message);
            report.errors.push(message);
            continue;
        }

        if !is_valid_file_name(&item.new_name) {
            let message = format!(
                "Cannot rename '{}': '{}' is not a valid file name",
                item.original_name, item.new_name
            );
            log.log(&message);
            report.errors.push(message);
            continue;
        }

        let to = item.directory.join(&item.new_name);
        let case_only = is_case_only_change(&item.original_name, &item.new_name);

        let two_step = if fs::symlink_metadata(&to).is_ok() {
            let same_file = case_only
                && *case_insensitive
                    .entry(item.directory.clone())
                    .or_insert_with(|| detect_case_insensitive_fs(&item.directory));
            if !same_file {
                let message = format!(
                    "Cannot rename '{}': target '{}' already exists",
                    item.original_name, item.new_name
                );
                log.log(&message);
                report.errors.push(message);
                continue;
            }
            true
        } else {
            false
        };

        match perform_rename(&item.from, &to, two_step, &mut log) {
            Ok(()) => {
                ledger.mark_renamed(item.index, to.clone());
                report.success_count += 1;
                report.renamed.push(RenamedFile {
                    from: item.from,
                    to,
                });
            },
            Err(e) => {
                let message = format!("Failed to rename '{}': {e:#}", item.original_name);
                log.log(&message);
                report.errors.push(message);
            },
        }
    }

    log.log(&format!(
        "Commit finished: {} renamed, {} error(s)",
        report.success_count,
        report.errors.len()
    ));
    report
}

/// A name that can be joined onto a directory without escaping it.
pub fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\0')
        && !(cfg!(windows) && name.contains('\\'))
}

fn is_case_only_change(from: &str, to: &str) -> bool {
    from != to && from.to_lowercase() == to.to_lowercase()
}

fn perform_rename(from: &Path, to: &Path, two_step: bool, log: &mut CommitLog) -> Result<()> {
    log.log(&format!("Renaming {} -> {}", from.display(), to.display()));

    if two_step {
        let temp = temp_name_for(from);
        log.log(&format!(
            "Case-only rename detected, using temp: {}",
            temp.display()
        ));
        if fs::symlink_metadata(&temp).is_ok() {
            bail!("temporary name '{}' already exists", temp.display());
        }
        fs::rename(from, &temp)?;
        if let Err(e) = fs::rename(&temp, to) {
            if let Err(restore) = fs::rename(&temp, from) {
                bail!(
                    "{e}; could not restore the original name ({restore}), the file is now at '{}'",
                    temp.display()
                );
            }
            return Err(e.into());
        }
    } else {
        fs::rename(from, to)?;
    }

    log.log(&format!(
        "Successfully renamed {} -> {}",
        from.display(),
        to.display()
    ));
    Ok(())
}

fn temp_name_for(from: &Path) -> PathBuf {
    let name = from
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    from.with_file_name(format!(".{name}.{}.regex-rename.tmp", std::process::id()))
}

/// Check if the filesystem at the given directory is case-insensitive.
pub fn detect_case_insensitive_fs(path: &Path) -> bool {
    let Ok(temp_dir) = TempDir::new_in(path) else {
        // Assume case-sensitive if we can't test
        return false;
    };

    let lower = temp_dir.path().join("case_probe_a");
    let upper = temp_dir.path().join("case_probe_A");

    if fs::write(&lower, b"probe").is_err() {
        return false;
    }
    fs::metadata(&upper).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationSpec;
    use crate::pipeline::Pipeline;
    use crate::preview::PreviewEngine;

    fn setup(names: &[&str]) -> (TempDir, Ledger) {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::new();
        for name in names {
            let path = temp_dir.path().join(name);
            fs::write(&path, *name).unwrap();
            ledger.add_file(&path);
        }
        (temp_dir, ledger)
    }

    fn preview(ledger: &mut Ledger, ops: Vec<OperationSpec>) {
        let pipeline: Pipeline = ops.into();
        let mut engine = PreviewEngine::new();
        engine.request(ledger, &pipeline);
        engine.wait(ledger);
    }

    #[test]
    fn test_commit_renames_changed_files() {
        let (temp_dir, mut ledger) = setup(&["a.txt", "b.txt"]);
        preview(&mut ledger, vec![OperationSpec::prefix("<0>_")]);

        let report = commit(&mut ledger, &CommitOptions::default());

        assert!(report.is_clean(), "{:?}", report.errors);
        assert_eq!(report.success_count, 2);
        assert!(temp_dir.path().join("1_a.txt").exists());
        assert!(temp_dir.path().join("2_b.txt").exists());
        assert!(!temp_dir.path().join("a.txt").exists());

        let record = &ledger.records()[0];
        assert_eq!(record.original_name, "1_a.txt");
        assert_eq!(record.original_path, temp_dir.path().join("1_a.txt"));
        assert!(!record.changed);
    }

    #[test]
    fn test_unchanged_records_are_skipped() {
        let (_temp_dir, mut ledger) = setup(&["keep.txt"]);
        preview(&mut ledger, vec![OperationSpec::replace("nomatch", "x")]);

        let report = commit(&mut ledger, &CommitOptions::default());
        assert_eq!(report, RenameReport::default());
    }

    #[test]
    fn test_second_commit_is_noop() {
        let (_temp_dir, mut ledger) = setup(&["a.txt"]);
        preview(&mut ledger, vec![OperationSpec::suffix("_v2")]);

        assert_eq!(commit(&mut ledger, &CommitOptions::default()).success_count, 1);
        let second = commit(&mut ledger, &CommitOptions::default());
        assert_eq!(second.success_count, 0);
        assert!(second.errors.is_empty());
    }

    #[test]
    fn test_existing_target_is_never_overwritten() {
        let (temp_dir, mut ledger) = setup(&["a.txt"]);
        fs::write(temp_dir.path().join("b.txt"), "keep me").unwrap();
        preview(&mut ledger, vec![OperationSpec::replace("a", "b")]);

        let report = commit(&mut ledger, &CommitOptions::default());

        assert_eq!(report.success_count, 0);
        assert_eq!(
            report.errors,
            vec!["Cannot rename 'a.txt': target 'b.txt' already exists".to_string()]
        );
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("b.txt")).unwrap(),
            "keep me"
        );
        assert!(temp_dir.path().join("a.txt").exists());
        assert!(ledger.records()[0].changed);
    }

    #[test]
    fn test_swapped_names_both_conflict() {
        let (temp_dir, mut ledger) = setup(&["a", "b"]);
        ledger.apply_preview(vec!["b".to_string(), "a".to_string()]);

        let report = commit(&mut ledger, &CommitOptions::default());

        assert_eq!(report.success_count, 0);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(fs::read_to_string(temp_dir.path().join("a")).unwrap(), "a");
        assert_eq!(fs::read_to_string(temp_dir.path().join("b")).unwrap(), "b");
    }

    #[test]
    fn test_missing_source_reports_failure() {
        let (temp_dir, mut ledger) = setup(&["gone.txt", "here.txt"]);
        preview(&mut ledger, vec![OperationSpec::prefix("new_")]);
        fs::remove_file(temp_dir.path().join("gone.txt")).unwrap();

        let report = commit(&mut ledger, &CommitOptions::default());

        assert_eq!(report.success_count, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Failed to rename 'gone.txt': "));
        assert!(temp_dir.path().join("new_here.txt").exists());
    }

    #[test]
    fn test_invalid_target_names_are_rejected() {
        let (temp_dir, mut ledger) = setup(&["a.txt", "b.txt"]);
        ledger.apply_preview(vec!["sub/a.txt".to_string(), String::new()]);

        let report = commit(&mut ledger, &CommitOptions::default());

        assert_eq!(
            report.errors,
            vec![
                "Cannot rename 'a.txt': 'sub/a.txt' is not a valid file name".to_string(),
                "Cannot rename 'b.txt': '' is not a valid file name".to_string(),
            ]
        );
        assert!(temp_dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_interrupt_skips_remaining() {
        let (temp_dir, mut ledger) = setup(&["a", "b"]);
        preview(&mut ledger, vec![OperationSpec::suffix("1")]);

        let flag = Arc::new(AtomicBool::new(true));
        let options = CommitOptions {
            interrupt: Some(flag),
            ..CommitOptions::default()
        };
        let report = commit(&mut ledger, &options);

        assert_eq!(report.success_count, 0);
        assert_eq!(
            report.errors,
            vec![
                "Skipped 'a': interrupted".to_string(),
                "Skipped 'b': interrupted".to_string(),
            ]
        );
        assert!(temp_dir.path().join("a").exists());
    }

    #[test]
    fn test_case_only_rename() {
        let (temp_dir, mut ledger) = setup(&["photo.jpg"]);
        preview(
            &mut ledger,
            vec![OperationSpec::change_case(crate::operation::CaseMode::Upper)],
        );

        let report = commit(&mut ledger, &CommitOptions::default());

        assert!(report.is_clean(), "{:?}", report.errors);
        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["PHOTO.JPG".to_string()]);
    }

    #[test]
    fn test_log_file_records_attempts() {
        let (temp_dir, mut ledger) = setup(&["a.txt"]);
        fs::write(temp_dir.path().join("x_a.txt"), "").unwrap();
        preview(&mut ledger, vec![OperationSpec::prefix("x_")]);

        let log_path = temp_dir.path().join("logs").join("rename.log");
        let options = CommitOptions {
            log_file: Some(log_path.clone()),
            ..CommitOptions::default()
        };
        commit(&mut ledger, &options);

        let log = fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("Starting commit of 1 file(s)"));
        assert!(log.contains("Cannot rename 'a.txt': target 'x_a.txt' already exists"));
        assert!(log.lines().all(|line| line.starts_with('[')));
    }

    #[test]
    fn test_valid_file_names() {
        assert!(is_valid_file_name("a.txt"));
        assert!(is_valid_file_name(".hidden"));
        assert!(is_valid_file_name("..."));
        assert!(!is_valid_file_name(""));
        assert!(!is_valid_file_name("."));
        assert!(!is_valid_file_name(".."));
        assert!(!is_valid_file_name("a/b"));
    }

    #[test]
    fn test_two_step_rename_never_overwrites_temp_name() {
        let temp_dir = TempDir::new().unwrap();
        let from = temp_dir.path().join("photo.jpg");
        let to = temp_dir.path().join("PHOTO.JPG");
        fs::write(&from, "photo").unwrap();
        let temp = temp_name_for(&from);
        fs::write(&temp, "someone else's").unwrap();

        let err = perform_rename(&from, &to, true, &mut CommitLog::disabled()).unwrap_err();

        assert!(format!("{err:#}").contains("already exists"));
        assert_eq!(fs::read_to_string(&temp).unwrap(), "someone else's");
        assert_eq!(fs::read_to_string(&from).unwrap(), "photo");
    }

    #[test]
    fn test_two_step_rename_restores_on_failure() {
        let temp_dir = TempDir::new().unwrap();
        let from = temp_dir.path().join("photo.jpg");
        let to = temp_dir.path().join("missing").join("PHOTO.JPG");
        fs::write(&from, "photo").unwrap();

        let result = perform_rename(&from, &to, true, &mut CommitLog::disabled());

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&from).unwrap(), "photo");
        assert!(!temp_name_for(&from).exists());
    }

    #[test]
    fn test_case_probe_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let _ = detect_case_insensitive_fs(temp_dir.path());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
