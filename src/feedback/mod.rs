//! Feedback submission
//!
//! - `types`: annotation and comment payloads
//! - `submit`: the sink seam and the per-entry submitter

mod submit;
mod types;

pub use submit::{FeedbackSink, SubmissionKind, Submitter};
pub use types::{AnnotationSubmission, CommentSubmission, SubmissionReceipt};
