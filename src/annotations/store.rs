//! In-memory annotation storage
//!
//! `AnnotationSet` is a plain value: an ordered list of annotations kept
//! sorted by start offset (stable, so equal starts keep insertion order).
//! Each entry also carries an insertion sequence number, which is what the
//! renderer uses for "last annotation wins".
//!
//! `AnnotationStore` binds a set to one source text and task type, validates
//! input, applies the merge policy, and notifies an observer after every
//! successful mutation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotationError, ConfigError, Result};

use super::category::{ErrorCategory, TaskType};
use super::text::SourceText;
use super::types::{Annotation, AnnotationRecord, Span};

/// How overlapping annotations are handled on insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Append as-is; overlaps are resolved only when rendering
    Append,
    /// Fold every same-category annotation that overlaps or abuts the new
    /// span into a single annotation covering all of them
    #[default]
    Merge,
}

impl FromStr for MergePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" | "append-only" => Ok(MergePolicy::Append),
            "merge" | "same-category-merge" => Ok(MergePolicy::Merge),
            _ => Err(ConfigError::InvalidValue {
                var: "MERGE_POLICY",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    seq: u64,
    annotation: Annotation,
}

/// Ordered collection of annotations for one review session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert under `policy`, returning the position of the stored
    /// annotation in the sorted view.
    ///
    /// The caller is responsible for validating the span against the text.
    pub fn insert(&mut self, annotation: Annotation, policy: MergePolicy) -> usize {
        let annotation = match policy {
            MergePolicy::Append => annotation,
            MergePolicy::Merge => self.absorb_same_category(annotation),
        };

        let seq = self.next_seq;
        self.next_seq += 1;

        let index = self
            .entries
            .partition_point(|e| e.annotation.start() <= annotation.start());
        self.entries.insert(index, Entry { seq, annotation });
        index
    }

    /// Remove every same-category entry touching `annotation` and return
    /// the union of all of them
    fn absorb_same_category(&mut self, annotation: Annotation) -> Annotation {
        let mut span = annotation.span;
        let before = self.entries.len();
        self.entries.retain(|e| {
            let absorbed =
                e.annotation.category == annotation.category && e.annotation.span.touches(&annotation.span);
            if absorbed {
                span = span.union(&e.annotation.span);
            }
            !absorbed
        });

        let merged = before - self.entries.len();
        if merged > 0 {
            tracing::debug!(
                "Merged {} {} annotation(s) into {}",
                merged,
                annotation.category,
                span
            );
        }

        Annotation::new(span, annotation.category)
    }

    /// Remove the annotation at `index` of the sorted view
    pub fn remove(&mut self, index: usize) -> Result<Annotation> {
        if index >= self.entries.len() {
            return Err(AnnotationError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index).annotation)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.entries.get(index).map(|e| &e.annotation)
    }

    /// Annotations sorted by start offset
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.entries.iter().map(|e| &e.annotation)
    }

    /// Owned copy of the sorted view
    pub fn all(&self) -> Vec<Annotation> {
        self.iter().copied().collect()
    }

    /// Wire records in sorted order
    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.iter().map(Annotation::to_record).collect()
    }

    /// Annotations paired with their precedence; higher values were added
    /// later and win where they overlap earlier ones
    pub fn winner_order(&self) -> impl Iterator<Item = (u64, &Annotation)> + '_ {
        self.entries.iter().map(|e| (e.seq, &e.annotation))
    }
}

/// Receives the full record list after every mutation
pub trait AnnotationObserver {
    fn annotations_changed(&mut self, records: &[AnnotationRecord]);
}

impl<F> AnnotationObserver for F
where
    F: FnMut(&[AnnotationRecord]),
{
    fn annotations_changed(&mut self, records: &[AnnotationRecord]) {
        self(records)
    }
}

/// Annotation set bound to one text under review
pub struct AnnotationStore {
    text: SourceText,
    task: TaskType,
    policy: MergePolicy,
    set: AnnotationSet,
    observer: Option<Box<dyn AnnotationObserver + Send>>,
}

impl AnnotationStore {
    pub fn new(text: SourceText, task: TaskType, policy: MergePolicy) -> Self {
        Self {
            text,
            task,
            policy,
            set: AnnotationSet::new(),
            observer: None,
        }
    }

    /// Register the observer notified after each mutation, replacing any
    /// previous one
    pub fn subscribe(&mut self, observer: impl AnnotationObserver + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn text(&self) -> &SourceText {
        &self.text
    }

    pub fn task(&self) -> TaskType {
        self.task
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn set(&self) -> &AnnotationSet {
        &self.set
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Label `span` with `category`
    pub fn add(&mut self, span: Span, category: ErrorCategory) -> Result<usize> {
        self.text.check_span(span)?;
        self.task.check_category(category)?;

        let index = self.set.insert(Annotation::new(span, category), self.policy);
        tracing::debug!("Added {} annotation at {}", category, span);
        self.notify();
        Ok(index)
    }

    /// Label `span` with a category given by its display label
    pub fn add_labeled(&mut self, span: Span, label: &str) -> Result<usize> {
        let category = ErrorCategory::from_label(label)?;
        self.add(span, category)
    }

    pub fn remove(&mut self, index: usize) -> Result<Annotation> {
        let removed = self.set.remove(index)?;
        tracing::debug!("Removed {} annotation at {}", removed.category, removed.span);
        self.notify();
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.set.clear();
        tracing::debug!("Cleared annotations");
        self.notify();
    }

    /// Replace the source text; existing annotations no longer apply
    pub fn reset_text(&mut self, text: SourceText) {
        self.text = text;
        self.set.clear();
        tracing::debug!("Source text replaced, annotations cleared");
        self.notify();
    }

    /// Annotations sorted by start offset
    pub fn all(&self) -> Vec<Annotation> {
        self.set.all()
    }

    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.set.records()
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer.annotations_changed(&self.set.records());
        }
    }
}

impl fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("text", &self.text)
            .field("task", &self.task)
            .field("policy", &self.policy)
            .field("set", &self.set)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn span(start: usize, end: usize) -> Span {
        Span::new(start, end).unwrap()
    }

    fn fox_store(policy: MergePolicy) -> AnnotationStore {
        AnnotationStore::new(
            SourceText::new("The quick brown fox"),
            TaskType::Generation,
            policy,
        )
    }

    #[test]
    fn test_add_and_remove() {
        let mut store = fox_store(MergePolicy::Merge);
        store.add(span(4, 9), ErrorCategory::GrammarError).unwrap();
        assert_eq!(store.len(), 1);

        store.remove(0).unwrap();
        assert!(store.all().is_empty());
    }

    #[test]
    fn test_same_category_overlap_merges() {
        let mut store = fox_store(MergePolicy::Merge);
        store.add(span(4, 9), ErrorCategory::GrammarError).unwrap();
        store.add(span(7, 12), ErrorCategory::GrammarError).unwrap();

        assert_eq!(
            store.all(),
            vec![Annotation::new(span(4, 12), ErrorCategory::GrammarError)]
        );
    }

    #[test]
    fn test_merge_bridges_several_annotations() {
        let mut store = fox_store(MergePolicy::Merge);
        store.add(span(0, 3), ErrorCategory::Redundancy).unwrap();
        store.add(span(10, 15), ErrorCategory::Redundancy).unwrap();
        store.add(span(5, 7), ErrorCategory::GrammarError).unwrap();
        store.add(span(3, 10), ErrorCategory::Redundancy).unwrap();

        assert_eq!(
            store.all(),
            vec![
                Annotation::new(span(0, 15), ErrorCategory::Redundancy),
                Annotation::new(span(5, 7), ErrorCategory::GrammarError),
            ]
        );
    }

    #[test]
    fn test_different_categories_coexist() {
        let mut store = fox_store(MergePolicy::Merge);
        store.add(span(0, 3), ErrorCategory::GrammarError).unwrap();
        store.add(span(1, 2), ErrorCategory::SpellingError).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_append_policy_keeps_duplicates() {
        let mut store = fox_store(MergePolicy::Append);
        store.add(span(4, 9), ErrorCategory::GrammarError).unwrap();
        store.add(span(4, 9), ErrorCategory::GrammarError).unwrap();
        store.add(span(7, 12), ErrorCategory::GrammarError).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_sorted_view_is_stable() {
        let mut store = fox_store(MergePolicy::Append);
        store.add(span(10, 12), ErrorCategory::Redundancy).unwrap();
        store.add(span(4, 9), ErrorCategory::GrammarError).unwrap();
        store.add(span(4, 6), ErrorCategory::Ambiguity).unwrap();

        let categories: Vec<_> = store.all().iter().map(|a| a.category).collect();
        assert_eq!(
            categories,
            vec![
                ErrorCategory::GrammarError,
                ErrorCategory::Ambiguity,
                ErrorCategory::Redundancy
            ]
        );
    }

    #[test]
    fn test_remove_uses_sorted_index() {
        let mut store = fox_store(MergePolicy::Append);
        store.add(span(10, 12), ErrorCategory::Redundancy).unwrap();
        store.add(span(0, 3), ErrorCategory::GrammarError).unwrap();

        let removed = store.remove(0).unwrap();
        assert_eq!(removed.category, ErrorCategory::GrammarError);
        assert_eq!(store.all()[0].category, ErrorCategory::Redundancy);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut store = fox_store(MergePolicy::Merge);
        assert_eq!(
            store.remove(0),
            Err(AnnotationError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let mut store = fox_store(MergePolicy::Merge);
        assert!(matches!(
            store.add_labeled(span(0, 3), "Vibes"),
            Err(AnnotationError::InvalidCategory(_))
        ));
        assert!(matches!(
            store.add(span(0, 40), ErrorCategory::GrammarError),
            Err(AnnotationError::SpanOutOfBounds { .. })
        ));
        assert!(matches!(
            store.add(span(0, 3), ErrorCategory::Mistranslation),
            Err(AnnotationError::CategoryNotAllowed { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_observer_sees_every_mutation() {
        let seen: Arc<Mutex<Vec<usize>>> = Arc::default();
        let sink = Arc::clone(&seen);

        let mut store = fox_store(MergePolicy::Merge);
        store.subscribe(move |records: &[AnnotationRecord]| {
            sink.lock().unwrap().push(records.len());
        });

        store.add(span(4, 9), ErrorCategory::GrammarError).unwrap();
        store.add(span(10, 15), ErrorCategory::Redundancy).unwrap();
        let _ = store.add(span(10, 99), ErrorCategory::Redundancy);
        store.remove(1).unwrap();
        store.clear();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_merged_annotation_takes_latest_precedence() {
        let mut set = AnnotationSet::new();
        set.insert(Annotation::new(span(0, 4), ErrorCategory::GrammarError), MergePolicy::Merge);
        set.insert(Annotation::new(span(2, 6), ErrorCategory::Redundancy), MergePolicy::Merge);
        set.insert(Annotation::new(span(3, 5), ErrorCategory::GrammarError), MergePolicy::Merge);

        let grammar_seq = set
            .winner_order()
            .find(|(_, a)| a.category == ErrorCategory::GrammarError)
            .map(|(seq, _)| seq)
            .unwrap();
        let redundancy_seq = set
            .winner_order()
            .find(|(_, a)| a.category == ErrorCategory::Redundancy)
            .map(|(seq, _)| seq)
            .unwrap();
        assert!(grammar_seq > redundancy_seq);
    }

    #[test]
    fn test_merge_policy_parse() {
        assert_eq!("append".parse::<MergePolicy>(), Ok(MergePolicy::Append));
        assert_eq!(" Merge ".parse::<MergePolicy>(), Ok(MergePolicy::Merge));
        assert!("union".parse::<MergePolicy>().is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const TEXT_LEN: usize = 40;

    fn category_strategy() -> impl Strategy<Value = ErrorCategory> {
        prop_oneof![
            Just(ErrorCategory::GrammarError),
            Just(ErrorCategory::SpellingError),
            Just(ErrorCategory::Redundancy),
        ]
    }

    fn annotation_strategy() -> impl Strategy<Value = Annotation> {
        (0..TEXT_LEN, 1..=10usize, category_strategy()).prop_map(|(start, width, category)| {
            let end = (start + width).min(TEXT_LEN).max(start + 1);
            Annotation::new(Span::new(start, end).unwrap(), category)
        })
    }

    proptest! {
        /// No two same-category annotations overlap or abut after merging.
        #[test]
        fn merge_leaves_same_category_disjoint(adds in prop::collection::vec(annotation_strategy(), 0..30)) {
            let mut set = AnnotationSet::new();
            for a in adds {
                set.insert(a, MergePolicy::Merge);
            }
            let all = set.all();
            for (i, a) in all.iter().enumerate() {
                for b in &all[i + 1..] {
                    if a.category == b.category {
                        prop_assert!(!a.span.touches(&b.span), "{:?} touches {:?}", a, b);
                    }
                }
            }
        }

        /// Merging never loses coverage of any labeled position.
        #[test]
        fn merge_preserves_coverage(adds in prop::collection::vec(annotation_strategy(), 1..30)) {
            let mut set = AnnotationSet::new();
            for a in &adds {
                set.insert(*a, MergePolicy::Merge);
            }
            for a in &adds {
                for pos in a.span.start()..a.span.end() {
                    prop_assert!(set
                        .iter()
                        .any(|b| b.category == a.category && b.span.contains(pos)));
                }
            }
        }

        /// The sorted view is ordered by start and keeps insertion order on ties.
        #[test]
        fn sorted_view_is_stable(adds in prop::collection::vec(annotation_strategy(), 0..30)) {
            let mut set = AnnotationSet::new();
            for a in adds {
                set.insert(a, MergePolicy::Append);
            }
            let entries: Vec<_> = set.winner_order().collect();
            for pair in entries.windows(2) {
                let (seq_a, a) = pair[0];
                let (seq_b, b) = pair[1];
                prop_assert!(a.start() <= b.start());
                if a.start() == b.start() {
                    prop_assert!(seq_a < seq_b);
                }
            }
        }
    }
}
