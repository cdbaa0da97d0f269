//! Segmentation of annotated text
//!
//! Produces maximal runs of text that share one visible label. Where
//! annotations overlap, the most recently added one wins.
//!
//! The scan is a sweep over span boundaries rather than over characters:
//! start/end events are sorted once, an ordered map holds the annotations
//! active at the cursor keyed by precedence, and the winner is its last
//! entry. Cost is O((n + m) log m) for m annotations.

use std::collections::BTreeMap;

use crate::annotations::{AnnotationSet, ErrorCategory, SourceText, Span};

/// One rendered run of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub span: Span,
    pub text: &'a str,
    /// Winning category, `None` for unlabeled text
    pub category: Option<ErrorCategory>,
}

impl<'a> Segment<'a> {
    pub fn is_labeled(&self) -> bool {
        self.category.is_some()
    }

    /// Highlight color for labeled segments
    pub fn color(&self) -> Option<&'static str> {
        self.category.map(ErrorCategory::color)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Start,
    End,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    pos: usize,
    kind: EventKind,
    precedence: u64,
    category: ErrorCategory,
}

/// Lazy iterator over the segments of a text
///
/// Cloning yields an independent iterator from the same position; call
/// [`render`] again to restart from the beginning.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a SourceText,
    events: Vec<Event>,
    next_event: usize,
    active: BTreeMap<u64, ErrorCategory>,
    cursor: usize,
}

/// Segment `text` under the annotations in `set`
///
/// Boundaries that do not fall on a character are moved forward to the
/// next one, so the segments always cover the whole text.
pub fn render<'a>(text: &'a SourceText, set: &AnnotationSet) -> Segments<'a> {
    let mut events: Vec<Event> = set
        .winner_order()
        .flat_map(|(precedence, a)| {
            [
                Event {
                    pos: text.ceil_position(a.start()),
                    kind: EventKind::Start,
                    precedence,
                    category: a.category,
                },
                Event {
                    pos: text.ceil_position(a.end()),
                    kind: EventKind::End,
                    precedence,
                    category: a.category,
                },
            ]
        })
        .collect();
    events.sort_by_key(|e| e.pos);

    Segments {
        text,
        events,
        next_event: 0,
        active: BTreeMap::new(),
        cursor: 0,
    }
}

impl<'a> Segments<'a> {
    /// Apply every event located at `pos`
    fn advance_to(&mut self, pos: usize) {
        while let Some(event) = self.events.get(self.next_event) {
            if event.pos != pos {
                break;
            }
            match event.kind {
                EventKind::Start => {
                    self.active.insert(event.precedence, event.category);
                }
                EventKind::End => {
                    self.active.remove(&event.precedence);
                }
            }
            self.next_event += 1;
        }
    }

    fn winner(&self) -> Option<ErrorCategory> {
        self.active.values().next_back().copied()
    }

    fn next_boundary(&self) -> usize {
        self.events
            .get(self.next_event)
            .map(|e| e.pos)
            .unwrap_or(usize::MAX)
            .min(self.text.len())
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.text.len();
        if self.cursor >= len {
            return None;
        }

        let start = self.cursor;
        self.advance_to(start);
        let label = self.winner();

        let end = loop {
            let boundary = self.next_boundary();
            if boundary >= len {
                break len;
            }
            self.advance_to(boundary);
            if self.winner() != label {
                break boundary;
            }
        };
        self.cursor = end;

        let span = Span::new(start, end).ok()?;
        let text = self.text.slice(span)?;
        Some(Segment {
            span,
            text,
            category: label,
        })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::annotations::{Annotation, MergePolicy};
    use proptest::prelude::*;

    /// Per-position reference: the latest-added covering annotation wins
    fn naive_labels(text: &SourceText, set: &AnnotationSet) -> Vec<Option<ErrorCategory>> {
        (0..text.len())
            .map(|pos| {
                set.winner_order()
                    .filter(|(_, a)| a.span.contains(pos))
                    .max_by_key(|(precedence, _)| *precedence)
                    .map(|(_, a)| a.category)
            })
            .collect()
    }

    fn category_strategy() -> impl Strategy<Value = ErrorCategory> {
        prop_oneof![
            Just(ErrorCategory::GrammarError),
            Just(ErrorCategory::SpellingError),
            Just(ErrorCategory::Ambiguity),
        ]
    }

    fn policy_strategy() -> impl Strategy<Value = MergePolicy> {
        prop_oneof![Just(MergePolicy::Append), Just(MergePolicy::Merge)]
    }

    fn scenario() -> impl Strategy<Value = (String, Vec<(usize, usize, ErrorCategory)>, MergePolicy)> {
        ("[a-z ]{1,60}", policy_strategy()).prop_flat_map(|(text, policy)| {
            let len = text.len();
            let annotation = (0..len, 1..=len, category_strategy()).prop_map(move |(start, width, category)| {
                (start, (start + width).min(len), category)
            });
            (
                Just(text),
                prop::collection::vec(annotation, 0..12),
                Just(policy),
            )
        })
    }

    fn build(adds: &[(usize, usize, ErrorCategory)], policy: MergePolicy) -> AnnotationSet {
        let mut set = AnnotationSet::new();
        for &(start, end, category) in adds {
            set.insert(Annotation::new(Span::new(start, end).unwrap(), category), policy);
        }
        set
    }

    proptest! {
        /// Concatenated segment text reproduces the source exactly.
        #[test]
        fn round_trip((text, adds, policy) in scenario()) {
            let source = SourceText::new(text.clone());
            let set = build(&adds, policy);
            let joined: String = render(&source, &set).map(|s| s.text).collect();
            prop_assert_eq!(joined, text);
        }

        /// Segments partition [0, len) left to right with no gaps or overlaps.
        #[test]
        fn segments_partition_text((text, adds, policy) in scenario()) {
            let source = SourceText::new(text);
            let set = build(&adds, policy);
            let mut expected_start = 0;
            for segment in render(&source, &set) {
                prop_assert_eq!(segment.span.start(), expected_start);
                expected_start = segment.span.end();
            }
            prop_assert_eq!(expected_start, source.len());
        }

        /// Neighbouring segments never share a label.
        #[test]
        fn segments_are_maximal((text, adds, policy) in scenario()) {
            let source = SourceText::new(text);
            let set = build(&adds, policy);
            let segments: Vec<_> = render(&source, &set).collect();
            for pair in segments.windows(2) {
                prop_assert_ne!(pair[0].category, pair[1].category);
            }
        }

        /// The sweep agrees with a per-character scan.
        #[test]
        fn matches_naive_scan((text, adds, policy) in scenario()) {
            let source = SourceText::new(text);
            let set = build(&adds, policy);
            let mut labels = Vec::new();
            for segment in render(&source, &set) {
                labels.extend(std::iter::repeat(segment.category).take(segment.span.len()));
            }
            prop_assert_eq!(labels, naive_labels(&source, &set));
        }
    }
}
