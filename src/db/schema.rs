//! Database schema initialization

use anyhow::Result;
use sqlx::SqlitePool;

/// Initialize the feedback tables
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- One row per annotation submission
CREATE TABLE IF NOT EXISTS annotation_submissions (
    id TEXT PRIMARY KEY,
    entry_id TEXT NOT NULL,
    task_type TEXT,
    row_data TEXT NOT NULL DEFAULT 'null',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_submissions_entry ON annotation_submissions(entry_id);

-- Labeled spans, offsets in UTF-16 code units
CREATE TABLE IF NOT EXISTS span_annotations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    submission_id TEXT NOT NULL REFERENCES annotation_submissions(id) ON DELETE CASCADE,
    entry_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    span_start INTEGER NOT NULL,
    span_end INTEGER NOT NULL,
    error_type TEXT NOT NULL,

    CHECK (span_start < span_end)
);

CREATE INDEX IF NOT EXISTS idx_spans_entry ON span_annotations(entry_id);
CREATE INDEX IF NOT EXISTS idx_spans_error_type ON span_annotations(error_type);

-- Rating comments
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    entry_id TEXT NOT NULL,
    row_data TEXT NOT NULL DEFAULT 'null',
    question TEXT NOT NULL,
    feedback TEXT NOT NULL,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_entry ON comments(entry_id);
"#;
