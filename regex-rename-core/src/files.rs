use crate::ledger::{AddSummary, Ledger};
use anyhow::{Context, Result};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Expand `paths` into a flat list of candidate files.
///
/// Files are kept in the order given. A directory contributes the regular files directly
/// inside it (or below it, with `recursive`), sorted by name. Paths that don't exist are
/// passed through so the ledger can count them as skipped.
pub fn collect_paths(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut collected = Vec::new();

    for path in paths {
        if !path.is_dir() {
            collected.push(path.clone());
            continue;
        }

        let mut walker = WalkDir::new(path).min_depth(1).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        for entry in walker {
            let entry = entry
                .with_context(|| format!("Failed to read directory {}", path.display()))?;
            if entry.file_type().is_file() {
                collected.push(entry.into_path());
            }
        }
    }

    Ok(collected)
}

/// Build a ledger from command-line style paths.
pub fn load_ledger(paths: &[PathBuf], recursive: bool) -> Result<(Ledger, AddSummary)> {
    let files = collect_paths(paths, recursive)?;
    let mut ledger = Ledger::new();
    let summary = ledger.add_files(files.iter().map(PathBuf::as_path));
    Ok((ledger, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.txt"), "").unwrap();
        fs::write(temp_dir.path().join("a.txt"), "").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested").join("c.txt"), "").unwrap();
        temp_dir
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_directory_is_sorted_and_shallow() {
        let temp_dir = tree();
        let paths = collect_paths(&[temp_dir.path().to_path_buf()], false).unwrap();
        assert_eq!(names(&paths), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_recursive_walk() {
        let temp_dir = tree();
        let paths = collect_paths(&[temp_dir.path().to_path_buf()], true).unwrap();
        assert_eq!(names(&paths), vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_explicit_files_keep_order() {
        let temp_dir = tree();
        let b = temp_dir.path().join("b.txt");
        let a = temp_dir.path().join("a.txt");
        let missing = temp_dir.path().join("missing");

        let paths = collect_paths(&[b.clone(), a.clone(), missing.clone()], false).unwrap();
        assert_eq!(paths, vec![b, a, missing]);
    }

    #[test]
    fn test_load_ledger_counts_skipped() {
        let temp_dir = tree();
        let a = temp_dir.path().join("a.txt");
        let missing = temp_dir.path().join("missing");

        let (ledger, summary) =
            load_ledger(&[temp_dir.path().to_path_buf(), a, missing], false).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(summary.added, 2);
        // a.txt again, plus the missing path
        assert_eq!(summary.skipped, 2);
    }
}
