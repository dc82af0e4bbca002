use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// One tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path of the file as it currently exists on disk.
    pub original_path: PathBuf,
    pub directory: PathBuf,
    pub original_name: String,
    /// Name the file will get on commit. Equal to `original_name` until a preview runs.
    pub new_name: String,
    /// Whether `new_name` differs from `original_name`.
    pub changed: bool,
}

impl FileRecord {
    /// Build a record for `path`. Returns `None` if the path has no UTF-8 file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let original_path = absolutize(path);
        let original_name = original_path.file_name()?.to_str()?.to_string();
        let directory = original_path.parent()?.to_path_buf();

        Some(Self {
            original_path,
            directory,
            new_name: original_name.clone(),
            original_name,
            changed: false,
        })
    }

    pub fn target_path(&self) -> PathBuf {
        self.directory.join(&self.new_name)
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Row shown to the user for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub original_name: String,
    pub preview_name: String,
    pub changed: bool,
}

/// Outcome of [`Ledger::add_files`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddSummary {
    pub added: usize,
    /// Paths that were missing, not regular files, unnamed, or already tracked.
    pub skipped: usize,
}

/// The ordered set of files being renamed.
///
/// Paths are unique. Every mutation bumps `revision`, which preview batches use to
/// detect that the file list changed underneath them.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<FileRecord>,
    paths: HashSet<PathBuf>,
    revision: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add existing regular files in order, skipping anything else and duplicates.
    pub fn add_files<I, P>(&mut self, paths: I) -> AddSummary
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut summary = AddSummary::default();
        for path in paths {
            if self.add_file(path.as_ref()) {
                summary.added += 1;
            } else {
                summary.skipped += 1;
            }
        }
        summary
    }

    /// Add one file. Returns false if it is not a regular file or is already tracked.
    pub fn add_file(&mut self, path: &Path) -> bool {
        let is_file = fs::metadata(path).is_ok_and(|m| m.is_file());
        if !is_file {
            return false;
        }
        let Some(record) = FileRecord::from_path(path) else {
            return false;
        };
        if !self.paths.insert(record.original_path.clone()) {
            return false;
        }
        self.records.push(record);
        self.revision += 1;
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<FileRecord> {
        if index >= self.records.len() {
            return None;
        }
        let record = self.records.remove(index);
        self.paths.remove(&record.original_path);
        self.revision += 1;
        Some(record)
    }

    /// Remove every record whose path is in `paths`. Returns how many were removed.
    pub fn remove_paths(&mut self, paths: &[PathBuf]) -> usize {
        let doomed: HashSet<PathBuf> = paths.iter().map(|p| absolutize(p)).collect();
        let before = self.records.len();
        self.records.retain(|r| !doomed.contains(&r.original_path));
        let removed = before - self.records.len();
        if removed > 0 {
            for path in &doomed {
                self.paths.remove(path);
            }
            self.revision += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.paths.clear();
        self.revision += 1;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&FileRecord> {
        self.records.get(index)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&absolutize(path))
    }

    pub fn changed_count(&self) -> usize {
        self.records.iter().filter(|r| r.changed).count()
    }

    pub fn preview_rows(&self) -> Vec<PreviewRow> {
        self.records
            .iter()
            .map(|r| PreviewRow {
                original_name: r.original_name.clone(),
                preview_name: r.new_name.clone(),
                changed: r.changed,
            })
            .collect()
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    /// `(index, original_name)` for every record, in order.
    pub(crate) fn snapshot_names(&self) -> Vec<(usize, String)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.original_name.clone()))
            .collect()
    }

    /// Store preview results by position. Caller guarantees `names.len() == self.len()`.
    pub(crate) fn apply_preview(&mut self, names: Vec<String>) {
        debug_assert_eq!(names.len(), self.records.len());
        for (record, name) in self.records.iter_mut().zip(names) {
            record.changed = name != record.original_name;
            record.new_name = name;
        }
    }

    /// Record that the file at `index` now lives at `new_path` under its new name.
    pub(crate) fn mark_renamed(&mut self, index: usize, new_path: PathBuf) {
        let Some(record) = self.records.get_mut(index) else {
            return;
        };
        self.paths.remove(&record.original_path);
        self.paths.insert(new_path.clone());
        record.original_path = new_path;
        record.original_name = record.new_name.clone();
        record.changed = false;
        self.revision += 1;
    }
}
