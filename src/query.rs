//! Read-side of the store: filtered search, canonical ordering, pagination,
//! and aggregate statistics.
//!
//! Queries read the store independently of sync; WAL journaling means an
//! in-progress sync pass never blocks them.

use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::books;
use crate::models::SermonRecord;

const SELECT_COLUMNS: &str = "SELECT file_name, title, date, content, bible_tags, \
     bible_chapter, last_modified FROM sermons";

/// Filtered search over title/content substrings and tag overlap.
///
/// `book_filter` uses OR semantics: a record matches when its tag set
/// overlaps any requested book. With `sort_by_date` the store sorts by date
/// descending; otherwise results come back in canonical scripture order
/// (book position, then chapter), untagged records last.
pub async fn search(
    pool: &SqlitePool,
    query: &str,
    book_filter: &[String],
    sort_by_date: bool,
) -> Result<Vec<SermonRecord>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
    qb.push(" WHERE 1=1");

    if !query.is_empty() {
        let like = format!("%{}%", query);
        qb.push(" AND (title LIKE ");
        qb.push_bind(like.clone());
        qb.push(" OR content LIKE ");
        qb.push_bind(like);
        qb.push(")");
    }

    if !book_filter.is_empty() {
        qb.push(" AND (");
        for (i, book) in book_filter.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("bible_tags LIKE ");
            qb.push_bind(format!("%{}%", book));
        }
        qb.push(")");
    }

    if sort_by_date {
        qb.push(" ORDER BY date DESC");
    }

    let mut rows: Vec<SermonRecord> = qb.build_query_as().fetch_all(pool).await?;
    if !sort_by_date {
        rows.sort_by_key(canonical_sort_key);
    }
    Ok(rows)
}

/// Sort key for canonical ordering: position of the first tag in the 66-book
/// order, then chapter. Records with no tag (or an unknown first tag) sort
/// after every tagged record.
fn canonical_sort_key(record: &SermonRecord) -> (usize, i64) {
    match record.first_tag().and_then(books::canonical_index) {
        Some(index) => (index, record.bible_chapter),
        None => (books::CANONICAL_ORDER.len(), 0),
    }
}

/// Every record, sorted by date. Records without a date sort last in either
/// direction.
pub async fn list_all(pool: &SqlitePool, descending: bool) -> Result<Vec<SermonRecord>> {
    let sql = if descending {
        format!("{} ORDER BY date IS NULL, date DESC", SELECT_COLUMNS)
    } else {
        format!("{} ORDER BY date IS NULL, date ASC", SELECT_COLUMNS)
    };
    Ok(sqlx::query_as(&sql).fetch_all(pool).await?)
}

/// One page of a result slice plus the totals needed for page controls.
#[derive(Debug)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total: usize,
    pub total_pages: usize,
    pub index: usize,
}

/// Fixed-size pagination over an already-sorted result set.
pub fn paginate<T>(rows: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let total = rows.len();
    let start = page.saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);
    Page {
        items: &rows[start..end],
        total,
        total_pages: total.div_ceil(per_page),
        index: page,
    }
}

/// Aggregate index statistics.
#[derive(Debug, Clone)]
pub struct LibraryStats {
    pub total: i64,
    pub untagged: i64,
    /// (canonical name, record count) for every book, in canonical order.
    pub book_counts: Vec<(String, i64)>,
    pub old_testament_total: i64,
    pub new_testament_total: i64,
}

/// Computes totals, the untagged count, and per-book frequencies split into
/// Old/New Testament sums.
pub async fn stats(pool: &SqlitePool) -> Result<LibraryStats> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sermons")
        .fetch_one(pool)
        .await?;
    let untagged: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sermons WHERE bible_tags = ''")
        .fetch_one(pool)
        .await?;

    let tag_rows: Vec<(String,)> = sqlx::query_as("SELECT bible_tags FROM sermons")
        .fetch_all(pool)
        .await?;

    let mut counts: std::collections::HashMap<&str, i64> = std::collections::HashMap::new();
    for (tags,) in &tag_rows {
        for tag in tags.split(',').filter(|t| !t.is_empty()) {
            // Anything outside the canonical list is ignored, not counted.
            if books::canonical_index(tag).is_some() {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }
    }

    let mut old_testament_total = 0i64;
    let mut new_testament_total = 0i64;
    let book_counts: Vec<(String, i64)> = books::CANONICAL_ORDER
        .iter()
        .enumerate()
        .map(|(i, book)| {
            let count = counts.get(*book).copied().unwrap_or(0);
            if i < books::OLD_TESTAMENT_COUNT {
                old_testament_total += count;
            } else {
                new_testament_total += count;
            }
            ((*book).to_string(), count)
        })
        .collect();

    Ok(LibraryStats {
        total,
        untagged,
        book_counts,
        old_testament_total,
        new_testament_total,
    })
}

/// Concatenation of all stored content, space-joined, for downstream keyword
/// and visualization use.
pub async fn all_text(pool: &SqlitePool) -> Result<String> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT content FROM sermons")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(content,)| content)
        .collect::<Vec<_>>()
        .join(" "))
}
