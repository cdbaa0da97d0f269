//! Submitting feedback to the persistence collaborator

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{error, info};

use super::types::{AnnotationSubmission, CommentSubmission, SubmissionReceipt};
use crate::annotations::TaskType;
use crate::error::SubmissionError;
use crate::session::ReviewSession;

/// Where feedback ends up
///
/// Implementations return the id of the stored record.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn submit_annotations(&self, submission: &AnnotationSubmission) -> anyhow::Result<String>;

    async fn submit_comment(&self, comment: &CommentSubmission) -> anyhow::Result<String>;
}

/// Sends session feedback to a sink, one submission per entry at a time
pub struct Submitter<S> {
    sink: S,
    in_flight: Mutex<HashSet<String>>,
}

impl<S: FeedbackSink> Submitter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Whether a submission of `kind` is pending for `entry_id`
    pub fn is_in_flight(&self, kind: SubmissionKind, entry_id: &str) -> bool {
        self.in_flight.lock().contains(&kind.key(entry_id))
    }

    /// Submit the session's annotations
    ///
    /// On failure the session is left as it was so the reviewer can retry.
    /// With `reset_on_success` the annotations are cleared once stored.
    pub async fn submit_session(
        &self,
        session: &mut ReviewSession,
        reset_on_success: bool,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let entry_id = session.entry_id().to_string();
        let submission = session
            .annotation_submission()
            .ok_or_else(|| SubmissionError::NothingToSubmit(entry_id.clone()))?;

        let _guard = self.claim(SubmissionKind::Annotations, &entry_id)?;

        let id = self.sink.submit_annotations(&submission).await.map_err(|e| {
            error!("Annotation submission for entry {} failed: {:#}", entry_id, e);
            SubmissionError::Sink(e)
        })?;

        let annotation_count = submission.annotations.len();
        info!("Stored {} annotations for entry {}", annotation_count, entry_id);

        if reset_on_success {
            session.clear();
        }

        Ok(SubmissionReceipt {
            id,
            entry_id,
            annotation_count,
            submitted_at: Utc::now(),
        })
    }

    /// Validate and submit a rating comment
    pub async fn submit_comment(
        &self,
        task: TaskType,
        comment: &CommentSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        comment.validate(task)?;

        let _guard = self.claim(SubmissionKind::Comment, &comment.entry_id)?;

        let id = self.sink.submit_comment(comment).await.map_err(|e| {
            error!("Comment submission for entry {} failed: {:#}", comment.entry_id, e);
            SubmissionError::Sink(e)
        })?;

        info!("Stored comment for entry {}", comment.entry_id);

        Ok(SubmissionReceipt {
            id,
            entry_id: comment.entry_id.clone(),
            annotation_count: 0,
            submitted_at: Utc::now(),
        })
    }

    fn claim(&self, kind: SubmissionKind, entry_id: &str) -> Result<InFlightGuard<'_>, SubmissionError> {
        let key = kind.key(entry_id);
        if !self.in_flight.lock().insert(key.clone()) {
            return Err(SubmissionError::InFlight(entry_id.to_string()));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            key,
        })
    }
}

/// Which form a submission came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Annotations,
    Comment,
}

impl SubmissionKind {
    fn key(self, entry_id: &str) -> String {
        match self {
            SubmissionKind::Annotations => format!("annotations:{}", entry_id),
            SubmissionKind::Comment => format!("comment:{}", entry_id),
        }
    }
}

/// Releases the entry when the submission finishes or is dropped
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}
