//! Feedback payloads
//!
//! These mirror the JSON bodies the review form posts:
//! `POST /api/annotation` and `POST /api/comments`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotations::{AnnotationRecord, TaskType};
use crate::error::FeedbackError;

/// Inline error annotations for one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSubmission {
    pub entry_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    /// The full result row the annotations refer to
    #[serde(default)]
    pub row_data: Value,
    pub annotations: Vec<AnnotationRecord>,
}

/// Rating plus free-text feedback for one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSubmission {
    pub entry_id: String,
    #[serde(default)]
    pub row_data: Value,
    pub question: String,
    pub feedback: String,
    /// Star rating, 1 to 5
    pub rating: u8,
}

impl CommentSubmission {
    /// Check the submission against the review form rules for `task`
    pub fn validate(&self, task: TaskType) -> Result<(), FeedbackError> {
        if !(1..=5).contains(&self.rating) {
            return Err(FeedbackError::InvalidRating(self.rating));
        }
        if !task.questions().contains(&self.question.as_str()) {
            return Err(FeedbackError::UnknownQuestion {
                task: task.to_string(),
                question: self.question.clone(),
            });
        }
        if self.feedback.trim().is_empty() {
            return Err(FeedbackError::EmptyFeedback);
        }
        Ok(())
    }
}

/// Acknowledgement of a stored submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub id: String,
    pub entry_id: String,
    /// Number of annotations stored; zero for comments
    pub annotation_count: usize,
    pub submitted_at: DateTime<Utc>,
}
