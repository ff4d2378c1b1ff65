//! Incremental sync pipeline orchestration.
//!
//! Coordinates the full pass: folder scan → diff against the fingerprint
//! cache → concurrent extraction+parsing → ordered transactional upserts →
//! deletion reconciliation. A pass always runs to completion and reports
//! counts; one bad file never aborts it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::books;
use crate::config::Config;
use crate::db;
use crate::extract;
use crate::meta;
use crate::migrate;
use crate::models::ParsedFile;
use crate::progress::{SyncProgressEvent, SyncProgressReporter};
use crate::scan::{self, ScanEntry};

/// Outcome of one sync pass.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Files with supported extensions found in the archive.
    pub total: u64,
    /// Records upserted this pass.
    pub updated: u64,
    /// Records deleted because their file disappeared.
    pub deleted: u64,
    /// Human-readable summary for the caller's status line.
    pub message: String,
}

/// Runs one sync pass over the configured archive folder.
///
/// Unchanged files (same mtime fingerprint as the cached record) are skipped
/// entirely, so repeated syncs on a stable archive do no extraction work.
/// Files whose processing fails are omitted this pass and retried on the
/// next one, since their cached fingerprint still differs.
pub async fn run_sync(
    config: &Config,
    reporter: &dyn SyncProgressReporter,
) -> Result<SyncReport> {
    let pool = db::connect(config).await?;
    migrate::run_migrations(&pool).await?;

    reporter.report(SyncProgressEvent::Scanning);
    let entries = scan::scan_archive(&config.archive)?;
    let total = entries.len() as u64;

    // (file_name -> fingerprint) for every existing record, loaded in bulk.
    let cache: HashMap<String, f64> =
        sqlx::query_as::<_, (String, f64)>("SELECT file_name, last_modified FROM sermons")
            .fetch_all(&pool)
            .await?
            .into_iter()
            .collect();

    let current_names: HashSet<&str> = entries.iter().map(|e| e.file_name.as_str()).collect();

    let deleted = reconcile_deletions(&pool, &cache, &current_names).await?;

    let to_process: Vec<ScanEntry> = entries
        .into_iter()
        .filter(|e| cache.get(&e.file_name) != Some(&e.modified))
        .collect();

    if to_process.is_empty() {
        let report = SyncReport {
            total,
            updated: 0,
            deleted,
            message: summary_message(0, total, deleted),
        };
        pool.close().await;
        return Ok(report);
    }

    let results = process_concurrently(
        to_process,
        config.sync.workers,
        config.search.window_chars,
        total,
        reporter,
    )
    .await;

    let updated = commit_results(&pool, &results, config.sync.commit_batch).await?;

    let report = SyncReport {
        total,
        updated,
        deleted,
        message: summary_message(updated, total, deleted),
    };
    pool.close().await;
    Ok(report)
}

/// Deletes records whose file no longer exists in the archive.
async fn reconcile_deletions(
    pool: &SqlitePool,
    cache: &HashMap<String, f64>,
    current_names: &HashSet<&str>,
) -> Result<u64> {
    let stale: Vec<&str> = cache
        .keys()
        .map(String::as_str)
        .filter(|name| !current_names.contains(name))
        .collect();
    if stale.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut deleted = 0u64;
    for name in stale {
        sqlx::query("DELETE FROM sermons WHERE file_name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        deleted += 1;
    }
    tx.commit().await?;
    Ok(deleted)
}

/// Extraction + metadata for one file. Pure with respect to the store; runs
/// on a blocking worker.
fn process_file(entry: &ScanEntry, window_chars: usize) -> ParsedFile {
    let content = extract::extract_text(&entry.path);
    let title = meta::title_from_file_name(&entry.file_name);
    let date = meta::parse_date(&entry.file_name);
    let (tags, chapter) = books::extract_tags(&content, &title, window_chars);

    ParsedFile {
        file_name: entry.file_name.clone(),
        title,
        date,
        content,
        bible_tags: books::join_tags(&tags),
        bible_chapter: i64::from(chapter),
        last_modified: entry.modified,
    }
}

/// Distributes changed files across a bounded blocking pool. Each worker
/// owns its file end-to-end; a failed file is logged, skipped, and left
/// eligible for retry on the next pass.
async fn process_concurrently(
    to_process: Vec<ScanEntry>,
    workers: usize,
    window_chars: usize,
    total: u64,
    reporter: &dyn SyncProgressReporter,
) -> Vec<ParsedFile> {
    let update_total = to_process.len() as u64;
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));

    let mut handles = Vec::with_capacity(to_process.len());
    for entry in to_process {
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let file_name = entry.file_name.clone();
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (file_name, None),
            };
            match tokio::task::spawn_blocking(move || process_file(&entry, window_chars)).await {
                Ok(parsed) => (file_name, Some(parsed)),
                Err(e) => {
                    warn!(file = %file_name, error = %e, "processing failed; retrying next sync");
                    (file_name, None)
                }
            }
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    let mut completed = 0u64;
    for handle in handles {
        completed += 1;
        match handle.await {
            Ok((file_name, parsed)) => {
                reporter.report(SyncProgressEvent::Processing {
                    file_name,
                    done: total - update_total + completed,
                    total,
                });
                if let Some(parsed) = parsed {
                    results.push(parsed);
                }
            }
            Err(e) => {
                warn!(error = %e, "sync worker task failed");
            }
        }
    }
    results
}

/// Single-writer upsert loop, committing every `commit_batch` rows so a
/// mid-pass crash keeps the flushed prefix.
async fn commit_results(
    pool: &SqlitePool,
    results: &[ParsedFile],
    commit_batch: usize,
) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut updated = 0u64;

    for parsed in results {
        sqlx::query(
            r#"
            INSERT INTO sermons (file_name, title, date, content, bible_tags, bible_chapter, last_modified)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(file_name) DO UPDATE SET
                title = excluded.title,
                date = excluded.date,
                content = excluded.content,
                bible_tags = excluded.bible_tags,
                bible_chapter = excluded.bible_chapter,
                last_modified = excluded.last_modified
            "#,
        )
        .bind(&parsed.file_name)
        .bind(&parsed.title)
        .bind(&parsed.date)
        .bind(&parsed.content)
        .bind(&parsed.bible_tags)
        .bind(parsed.bible_chapter)
        .bind(parsed.last_modified)
        .execute(&mut *tx)
        .await?;

        updated += 1;
        if updated % commit_batch as u64 == 0 {
            tx.commit().await?;
            tx = pool.begin().await?;
        }
    }

    tx.commit().await?;
    Ok(updated)
}

fn summary_message(updated: u64, total: u64, deleted: u64) -> String {
    let mut msg = format!("{} of {} files updated", updated, total);
    if deleted > 0 {
        msg.push_str(&format!(", {} deleted", deleted));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArchiveConfig, DbConfig, SearchConfig, SyncConfig};
    use crate::progress::NoProgress;
    use std::path::Path;

    fn test_config(root: &Path, db_dir: &Path) -> Config {
        Config {
            db: DbConfig {
                path: db_dir.join("library.db"),
            },
            archive: ArchiveConfig {
                root: root.to_path_buf(),
                exclude_globs: Vec::new(),
                follow_symlinks: false,
            },
            sync: SyncConfig::default(),
            search: SearchConfig::default(),
        }
    }

    #[tokio::test]
    async fn second_sync_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive");
        std::fs::create_dir_all(&archive).unwrap();
        std::fs::write(archive.join("230521_창세기 1장.txt"), "창세기 1장 묵상").unwrap();
        std::fs::write(archive.join("note.txt"), "no date here").unwrap();

        let config = test_config(&archive, dir.path());
        let first = run_sync(&config, &NoProgress).await.unwrap();
        assert_eq!(first.total, 2);
        assert_eq!(first.updated, 2);
        assert_eq!(first.deleted, 0);

        let second = run_sync(&config, &NoProgress).await.unwrap();
        assert_eq!(second.updated, 0);
        assert_eq!(second.deleted, 0);
    }

    #[tokio::test]
    async fn removed_file_is_reconciled() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive");
        std::fs::create_dir_all(&archive).unwrap();
        let doomed = archive.join("doomed.txt");
        std::fs::write(&doomed, "soon gone").unwrap();
        std::fs::write(archive.join("stays.txt"), "still here").unwrap();

        let config = test_config(&archive, dir.path());
        run_sync(&config, &NoProgress).await.unwrap();

        std::fs::remove_file(&doomed).unwrap();
        let report = run_sync(&config, &NoProgress).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(report.updated, 0);

        let pool = db::connect(&config).await.unwrap();
        let names: Vec<(String,)> = sqlx::query_as("SELECT file_name FROM sermons")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(names, vec![("stays.txt".to_string(),)]);
        pool.close().await;
    }

    #[tokio::test]
    async fn touched_file_is_reprocessed() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive");
        std::fs::create_dir_all(&archive).unwrap();
        let path = archive.join("edit.txt");
        std::fs::write(&path, "first draft").unwrap();

        let config = test_config(&archive, dir.path());
        run_sync(&config, &NoProgress).await.unwrap();

        // Rewriting bumps the mtime fingerprint.
        std::thread::sleep(std::time::Duration::from_millis(20));
        std::fs::write(&path, "second draft").unwrap();
        let report = run_sync(&config, &NoProgress).await.unwrap();
        assert_eq!(report.updated, 1);

        let pool = db::connect(&config).await.unwrap();
        let (content,): (String,) =
            sqlx::query_as("SELECT content FROM sermons WHERE file_name = 'edit.txt'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(content, "second draft");
        pool.close().await;
    }

    #[tokio::test]
    async fn corrupt_file_still_gets_a_record_with_empty_content() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive");
        std::fs::create_dir_all(&archive).unwrap();
        std::fs::write(archive.join("broken.docx"), b"not a zip at all").unwrap();

        let config = test_config(&archive, dir.path());
        let report = run_sync(&config, &NoProgress).await.unwrap();
        assert_eq!(report.updated, 1);

        let pool = db::connect(&config).await.unwrap();
        let (content,): (String,) =
            sqlx::query_as("SELECT content FROM sermons WHERE file_name = 'broken.docx'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(content, "");
        pool.close().await;
    }

    #[test]
    fn summary_mentions_deletions_only_when_present() {
        assert_eq!(summary_message(3, 10, 0), "3 of 10 files updated");
        assert_eq!(summary_message(0, 10, 2), "0 of 10 files updated, 2 deleted");
    }
}
