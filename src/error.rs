//! Error types for the annotation engine

use thiserror::Error;

/// Engine-wide result type
pub type Result<T> = std::result::Result<T, AnnotationError>;

/// Errors raised by the annotation store and span validation.
///
/// All of these are local and recoverable: the caller typically disables
/// the triggering action or ignores the attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Category {category} is not available for {task} review")]
    CategoryNotAllowed { category: String, task: String },

    #[error("Index {index} out of range for {len} annotations")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid span [{start}, {end}): start must be less than end")]
    InvalidSpan { start: usize, end: usize },

    #[error("Span [{start}, {end}) exceeds text length {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Span boundary {offset} splits a surrogate pair")]
    SplitCharacter { offset: usize },
}

/// Errors produced while reading rendered container markup
#[derive(Error, Debug)]
pub enum HtmlError {
    #[error("HTML rewrite failed: {0}")]
    Rewrite(String),
}

/// Validation errors for feedback payloads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Question is not part of the {task} question set: {question}")]
    UnknownQuestion { task: String, question: String },

    #[error("Feedback text is empty")]
    EmptyFeedback,

    #[error("Unknown task type: {0}")]
    UnknownTask(String),
}

/// Errors returned by the submitter
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("A submission for entry {0} is already in flight")]
    InFlight(String),

    #[error("No annotations to submit for entry {0}")]
    NothingToSubmit(String),

    #[error("Invalid feedback: {0}")]
    Invalid(#[from] FeedbackError),

    #[error("Feedback sink error: {0}")]
    Sink(#[from] anyhow::Error),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}
