//! Span and annotation value types
//!
//! `AnnotationRecord` is the wire shape handed to the host form and included
//! in `POST /api/annotation` payloads: `{ "start", "end", "errorType" }`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnnotationError;

use super::category::ErrorCategory;

/// Half-open UTF-16 interval `[start, end)` with `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct Span {
    start: usize,
    end: usize,
}

#[derive(Deserialize)]
struct RawSpan {
    start: usize,
    end: usize,
}

impl TryFrom<RawSpan> for Span {
    type Error = AnnotationError;

    fn try_from(raw: RawSpan) -> Result<Self, Self::Error> {
        Span::new(raw.start, raw.end)
    }
}

impl Span {
    /// Create a span; zero-width and reversed spans are rejected
    pub fn new(start: usize, end: usize) -> Result<Self, AnnotationError> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(AnnotationError::InvalidSpan { start, end })
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false: a span covers at least one code unit
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Share at least one position
    pub fn intersects(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Overlap or abut; the test used when merging same-category spans
    pub fn touches(&self, other: &Span) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Smallest span covering both
    pub fn union(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A span labeled with an error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    pub span: Span,
    pub category: ErrorCategory,
}

impl Annotation {
    pub fn new(span: Span, category: ErrorCategory) -> Self {
        Self { span, category }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn to_record(&self) -> AnnotationRecord {
        AnnotationRecord {
            start: self.span.start,
            end: self.span.end,
            error_type: self.category,
        }
    }
}

/// Flat annotation record exchanged with the host and the feedback API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "errorType")]
    pub error_type: ErrorCategory,
}

impl TryFrom<AnnotationRecord> for Annotation {
    type Error = AnnotationError;

    fn try_from(record: AnnotationRecord) -> Result<Self, Self::Error> {
        Ok(Annotation {
            span: Span::new(record.start, record.end)?,
            category: record.error_type,
        })
    }
}

impl From<&Annotation> for AnnotationRecord {
    fn from(annotation: &Annotation) -> Self {
        annotation.to_record()
    }
}
