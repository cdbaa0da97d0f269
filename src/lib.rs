//! Review Annotator
//!
//! Span annotation engine for reviewing model outputs: reviewers select
//! text, label it with an error category, and the labeled text is rendered
//! back as non-overlapping highlighted segments.
//!
//! - `annotations`: offsets, categories and the annotation store
//! - `render`: "last wins" segmentation
//! - `selection`: host selections and text quotes to offsets
//! - `html`: highlight markup and container parsing
//! - `session`: one reviewer session per entry
//! - `feedback` / `db`: submission and SQLite persistence

pub mod annotations;
pub mod config;
pub mod db;
pub mod error;
pub mod feedback;
pub mod html;
pub mod render;
pub mod selection;
pub mod session;
pub mod telemetry;

pub use annotations::{
    Annotation, AnnotationRecord, AnnotationStore, ErrorCategory, MergePolicy, SourceText, Span, TaskType,
};
pub use config::Config;
pub use error::{AnnotationError, Result};
pub use render::{render, Segment};
pub use session::ReviewSession;
