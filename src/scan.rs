//! Recursive archive folder scan.
//!
//! Produces the candidate file set for a sync pass: every file under the
//! archive root with a supported extension, together with its modification
//! fingerprint. Identity within the store is the bare file name, matching
//! how the archive is curated (one flat namespace of sermon files).

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::ArchiveConfig;
use crate::extract::SUPPORTED_EXTENSIONS;

/// One candidate file found by the scan.
#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub path: PathBuf,
    /// Bare file name; the store's upsert key.
    pub file_name: String,
    /// Modification time in seconds since the epoch (fractional). Used only
    /// for change detection, never for display.
    pub modified: f64,
}

/// Recursively enumerates supported files under the archive root.
pub fn scan_archive(config: &ArchiveConfig) -> Result<Vec<ScanEntry>> {
    let root = &config.root;
    if !root.exists() {
        bail!("archive root does not exist: {}", root.display());
    }

    let exclude_set = build_globset(&config.exclude_globs)?;

    let mut entries = Vec::new();
    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !has_supported_extension(path) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(relative.to_string_lossy().as_ref()) {
            continue;
        }

        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => continue,
        };
        let modified = modification_fingerprint(path)?;

        entries.push(ScanEntry {
            path: path.to_path_buf(),
            file_name,
            modified,
        });
    }

    // Deterministic ordering across runs.
    entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(entries)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn modification_fingerprint(path: &Path) -> Result<f64> {
    let metadata = std::fs::metadata(path)?;
    let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArchiveConfig;

    fn archive_config(root: &Path) -> ArchiveConfig {
        ArchiveConfig {
            root: root.to_path_buf(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }

    #[test]
    fn picks_up_supported_extensions_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("2023")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("2023").join("b.DOCX"), "b").unwrap();
        std::fs::write(dir.path().join("skip.md"), "nope").unwrap();

        let entries = scan_archive(&archive_config(dir.path())).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.DOCX"]);
    }

    #[test]
    fn exclude_globs_filter_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("drafts")).unwrap();
        std::fs::write(dir.path().join("keep.txt"), "k").unwrap();
        std::fs::write(dir.path().join("drafts").join("drop.txt"), "d").unwrap();

        let mut config = archive_config(dir.path());
        config.exclude_globs = vec!["drafts/**".to_string()];
        let entries = scan_archive(&config).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "keep.txt");
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = archive_config(&dir.path().join("nope"));
        assert!(scan_archive(&config).is_err());
    }
}
