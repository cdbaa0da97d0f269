//! Feedback database operations

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::annotations::{AnnotationRecord, ErrorCategory};
use crate::feedback::{AnnotationSubmission, CommentSubmission, FeedbackSink};

/// Stored annotation submission
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredSubmission {
    pub id: String,
    pub entry_id: String,
    pub task_type: Option<String>,
    /// JSON text of the result row
    pub row_data: String,
    pub created_at: String,
}

/// Stored span annotation
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredSpan {
    pub submission_id: String,
    pub entry_id: String,
    pub position: i64,
    pub span_start: i64,
    pub span_end: i64,
    pub error_type: String,
}

impl StoredSpan {
    pub fn to_record(&self) -> Result<AnnotationRecord> {
        Ok(AnnotationRecord {
            start: usize::try_from(self.span_start)?,
            end: usize::try_from(self.span_end)?,
            error_type: ErrorCategory::from_label(&self.error_type)?,
        })
    }
}

/// Stored rating comment
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredComment {
    pub id: String,
    pub entry_id: String,
    pub row_data: String,
    pub question: String,
    pub feedback: String,
    pub rating: i64,
    pub created_at: String,
}

/// Span count for one category label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub error_type: String,
    pub count: i64,
}

/// Feedback repository
#[derive(Debug, Clone)]
pub struct FeedbackRepository {
    pool: SqlitePool,
}

impl FeedbackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store a submission and its spans in one transaction
    pub async fn save_annotations(&self, submission: &AnnotationSubmission) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let row_data = serde_json::to_string(&submission.row_data)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO annotation_submissions (id, entry_id, task_type, row_data, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&submission.entry_id)
        .bind(submission.task_type.map(|t| t.as_str()))
        .bind(&row_data)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for (position, record) in submission.annotations.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO span_annotations (submission_id, entry_id, position, span_start, span_end, error_type)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&submission.entry_id)
            .bind(i64::try_from(position)?)
            .bind(i64::try_from(record.start)?)
            .bind(i64::try_from(record.end)?)
            .bind(record.error_type.label())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("storing span {} of entry {}", position, submission.entry_id))?;
        }

        tx.commit().await?;
        debug!(
            "Saved submission {} with {} spans for entry {}",
            id,
            submission.annotations.len(),
            submission.entry_id
        );

        Ok(id)
    }

    /// Submissions for an entry, newest first
    pub async fn list_submissions(&self, entry_id: &str) -> Result<Vec<StoredSubmission>> {
        let submissions = sqlx::query_as::<_, StoredSubmission>(
            r#"
            SELECT id, entry_id, task_type, row_data, created_at
            FROM annotation_submissions
            WHERE entry_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }

    /// All stored spans for an entry, in submission order
    pub async fn list_annotations(&self, entry_id: &str) -> Result<Vec<StoredSpan>> {
        let spans = sqlx::query_as::<_, StoredSpan>(
            r#"
            SELECT submission_id, entry_id, position, span_start, span_end, error_type
            FROM span_annotations
            WHERE entry_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(spans)
    }

    /// Records of the most recent submission for an entry
    pub async fn latest_records(&self, entry_id: &str) -> Result<Vec<AnnotationRecord>> {
        let Some(latest) = self.list_submissions(entry_id).await?.into_iter().next() else {
            return Ok(Vec::new());
        };

        let spans = sqlx::query_as::<_, StoredSpan>(
            r#"
            SELECT submission_id, entry_id, position, span_start, span_end, error_type
            FROM span_annotations
            WHERE submission_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(&latest.id)
        .fetch_all(&self.pool)
        .await?;

        spans.iter().map(StoredSpan::to_record).collect()
    }

    /// Count submissions, optionally for one entry
    pub async fn count_submissions(&self, entry_id: Option<&str>) -> Result<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM annotation_submissions
            WHERE ? IS NULL OR entry_id = ?
            "#,
        )
        .bind(entry_id)
        .bind(entry_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Stored spans per category, most frequent first
    pub async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        let counts = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT error_type, COUNT(*) AS count
            FROM span_annotations
            GROUP BY error_type
            ORDER BY count DESC, error_type ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Store a rating comment
    pub async fn save_comment(&self, comment: &CommentSubmission) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let row_data = serde_json::to_string(&comment.row_data)?;

        sqlx::query(
            r#"
            INSERT INTO comments (id, entry_id, row_data, question, feedback, rating, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&comment.entry_id)
        .bind(&row_data)
        .bind(&comment.question)
        .bind(&comment.feedback)
        .bind(i64::from(comment.rating))
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Comments for an entry, oldest first
    pub async fn list_comments(&self, entry_id: &str) -> Result<Vec<StoredComment>> {
        let comments = sqlx::query_as::<_, StoredComment>(
            r#"
            SELECT id, entry_id, row_data, question, feedback, rating, created_at
            FROM comments
            WHERE entry_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Delete all feedback for an entry; returns the number of rows removed
    pub async fn delete_for_entry(&self, entry_id: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;

        for sql in [
            "DELETE FROM span_annotations WHERE entry_id = ?",
            "DELETE FROM annotation_submissions WHERE entry_id = ?",
            "DELETE FROM comments WHERE entry_id = ?",
        ] {
            removed += sqlx::query(sql)
                .bind(entry_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;

        Ok(removed)
    }
}

#[async_trait]
impl FeedbackSink for FeedbackRepository {
    async fn submit_annotations(&self, submission: &AnnotationSubmission) -> Result<String> {
        self.save_annotations(submission).await
    }

    async fn submit_comment(&self, comment: &CommentSubmission) -> Result<String> {
        self.save_comment(comment).await
    }
}
