//! Annotation module
//!
//! Character-offset error-span annotations over an immutable source text.
//!
//! # Features
//!
//! - UTF-16 addressed source text, matching browser selection offsets
//! - Static error-category table (label, color, task scope)
//! - Task types with their inline field, review questions and extensions
//! - Ordered annotation sets with two overlap policies:
//!   - Append: keep everything, resolve overlaps when rendering
//!   - Merge: fold overlapping same-category spans into one

mod category;
mod store;
mod text;
mod types;

pub use category::{color_for_label, CategoryInfo, CategoryScope, ErrorCategory, TaskType, FALLBACK_COLOR};
pub use store::{AnnotationObserver, AnnotationSet, AnnotationStore, MergePolicy};
pub use text::{utf16_len, SourceText};
pub use types::{Annotation, AnnotationRecord, Span};
