use anyhow::Result;
use sqlx::SqlitePool;

/// Creates the schema. Idempotent; `sermon init` and every sync call it.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sermons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_name TEXT UNIQUE NOT NULL,
            title TEXT NOT NULL,
            date TEXT,
            content TEXT NOT NULL DEFAULT '',
            bible_tags TEXT NOT NULL DEFAULT '',
            bible_chapter INTEGER NOT NULL DEFAULT 0,
            last_modified REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Stores created before chapter tracking lack this column; the ALTER
    // fails with "duplicate column" everywhere else, which is fine.
    let _ = sqlx::query("ALTER TABLE sermons ADD COLUMN bible_chapter INTEGER NOT NULL DEFAULT 0")
        .execute(pool)
        .await;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sermons_date ON sermons(date DESC)")
        .execute(pool)
        .await?;

    Ok(())
}
