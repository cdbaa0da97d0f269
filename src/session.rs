//! Review session for one entry
//!
//! Owns the text under review, the reviewer's current category choice, the
//! pending selection and the annotation store. This is the surface a
//! feedback form drives: capture a selection, label it, remove or clear
//! labels, render, and build the submission payload.

use serde_json::Value;

use crate::annotations::{
    Annotation, AnnotationObserver, AnnotationRecord, AnnotationStore, ErrorCategory, MergePolicy,
    SourceText, Span, TaskType,
};
use crate::error::Result;
use crate::feedback::AnnotationSubmission;
use crate::html::{render_html, HighlightConfig};
use crate::render::{render, Segments};
use crate::selection::{map_selection, TextContainer, TextQuote, TextSelection};

/// Text shown when a row lacks the task's inline field
pub const MISSING_TEXT: &str = "No text available";

#[derive(Debug)]
pub struct ReviewSession {
    entry_id: String,
    row_data: Value,
    store: AnnotationStore,
    category: Option<ErrorCategory>,
    pending: Option<Span>,
}

impl ReviewSession {
    /// Start a session over raw text
    pub fn new(entry_id: impl Into<String>, task: TaskType, text: &str, policy: MergePolicy) -> Self {
        Self {
            entry_id: entry_id.into(),
            row_data: Value::Null,
            store: AnnotationStore::new(SourceText::new(text), task, policy),
            category: None,
            pending: None,
        }
    }

    /// Start a session over a result row, annotating the task's inline field
    pub fn from_row(entry_id: impl Into<String>, task: TaskType, row: Value, policy: MergePolicy) -> Self {
        let text = inline_text(&row, task);
        let mut session = Self::new(entry_id, task, &text, policy);
        session.row_data = row;
        session
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn task(&self) -> TaskType {
        self.store.task()
    }

    pub fn text(&self) -> &SourceText {
        self.store.text()
    }

    pub fn row_data(&self) -> &Value {
        &self.row_data
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn subscribe(&mut self, observer: impl AnnotationObserver + Send + 'static) {
        self.store.subscribe(observer);
    }

    /// Choose the category applied by the next `label_selection`
    pub fn select_category(&mut self, category: ErrorCategory) -> Result<()> {
        self.store.task().check_category(category)?;
        self.category = Some(category);
        Ok(())
    }

    /// Choose the category by its display label
    pub fn select_category_label(&mut self, label: &str) -> Result<()> {
        self.select_category(ErrorCategory::from_label(label)?)
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.category
    }

    /// Record the host selection; returns the mapped span, if any
    pub fn capture_selection(&mut self, container: &TextContainer, selection: &TextSelection) -> Option<Span> {
        self.pending = map_selection(self.store.text(), container, selection);
        self.pending
    }

    /// Record a selection reported as selected text
    pub fn capture_quote(&mut self, quote: &TextQuote) -> Option<Span> {
        self.pending = quote.locate(self.store.text()).map(|found| found.span);
        self.pending
    }

    pub fn pending_selection(&self) -> Option<Span> {
        self.pending
    }

    /// Label the pending selection with the current category
    ///
    /// Without both a pending selection and a category this is a no-op and
    /// returns `Ok(None)`. On success the pending selection is consumed.
    pub fn label_selection(&mut self) -> Result<Option<usize>> {
        let (Some(span), Some(category)) = (self.pending, self.category) else {
            return Ok(None);
        };
        let index = self.store.add(span, category)?;
        self.pending = None;
        Ok(Some(index))
    }

    pub fn add(&mut self, span: Span, category: ErrorCategory) -> Result<usize> {
        self.store.add(span, category)
    }

    pub fn remove(&mut self, index: usize) -> Result<Annotation> {
        self.store.remove(index)
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Swap in a new text; annotations and the pending selection are dropped
    pub fn replace_text(&mut self, text: &str) {
        self.store.reset_text(SourceText::new(text));
        self.pending = None;
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.store.all()
    }

    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.store.records()
    }

    pub fn render(&self) -> Segments<'_> {
        render(self.store.text(), self.store.set())
    }

    pub fn render_html(&self, config: &HighlightConfig) -> String {
        render_html(self.render(), config)
    }

    /// Payload for the annotation API, `None` when nothing is labeled
    pub fn annotation_submission(&self) -> Option<AnnotationSubmission> {
        if self.store.is_empty() {
            return None;
        }
        Some(AnnotationSubmission {
            entry_id: self.entry_id.clone(),
            task_type: Some(self.store.task()),
            row_data: self.row_data.clone(),
            annotations: self.store.records(),
        })
    }
}

/// Text of the task's inline field, stringifying non-string values
fn inline_text(row: &Value, task: TaskType) -> String {
    match row.get(task.inline_field()) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | None => MISSING_TEXT.to_string(),
        Some(Value::String(_)) => MISSING_TEXT.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnnotationError;
    use crate::selection::SelectionPoint;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn fox_session() -> ReviewSession {
        ReviewSession::new("entry-1", TaskType::Generation, "The quick brown fox", MergePolicy::Merge)
    }

    #[test]
    fn test_label_flow() {
        let mut session = fox_session();
        let container = TextContainer::from_segments(session.render());

        session.select_category(ErrorCategory::GrammarError).unwrap();
        let span = session.capture_selection(&container, &TextSelection::within(0, 4, 9));
        assert_eq!(span, Some(Span::new(4, 9).unwrap()));

        assert_eq!(session.label_selection().unwrap(), Some(0));
        assert_eq!(session.pending_selection(), None);

        let texts: Vec<_> = session.render().map(|s| s.text).collect();
        assert_eq!(texts, vec!["The ", "quick", " brown fox"]);
    }

    #[test]
    fn test_label_without_selection_is_noop() {
        let mut session = fox_session();
        session.select_category(ErrorCategory::Redundancy).unwrap();
        assert_eq!(session.label_selection().unwrap(), None);

        let mut session = fox_session();
        let container = TextContainer::from_segments(session.render());
        session.capture_selection(&container, &TextSelection::within(0, 0, 3));
        assert_eq!(session.label_selection().unwrap(), None);
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_second_selection_spans_highlight_boundary() {
        let mut session = fox_session();
        session.add(Span::new(4, 9).unwrap(), ErrorCategory::GrammarError).unwrap();

        let container = TextContainer::from_segments(session.render());
        let selection = TextSelection::new(
            SelectionPoint::InText { node: 1, offset: 3 },
            SelectionPoint::InText { node: 2, offset: 6 },
        );
        session.select_category(ErrorCategory::SpellingError).unwrap();
        session.capture_selection(&container, &selection);
        session.label_selection().unwrap();

        assert_eq!(
            session.annotations()[1],
            Annotation::new(Span::new(7, 15).unwrap(), ErrorCategory::SpellingError)
        );
    }

    #[test]
    fn test_category_must_fit_task() {
        let mut session = fox_session();
        assert!(matches!(
            session.select_category(ErrorCategory::Mistranslation),
            Err(AnnotationError::CategoryNotAllowed { .. })
        ));
        assert!(matches!(
            session.select_category_label("Nonsense"),
            Err(AnnotationError::InvalidCategory(_))
        ));
        assert_eq!(session.category(), None);
    }

    #[test]
    fn test_capture_quote() {
        let mut session = fox_session();
        let span = session.capture_quote(&TextQuote::new("brown"));
        assert_eq!(span, Some(Span::new(10, 15).unwrap()));
    }

    #[test]
    fn test_replace_text_clears_and_keeps_observer() {
        let seen: Arc<Mutex<Vec<usize>>> = Arc::default();
        let sink = Arc::clone(&seen);

        let mut session = fox_session();
        session.subscribe(move |records: &[AnnotationRecord]| {
            sink.lock().unwrap().push(records.len());
        });
        session.add(Span::new(0, 3).unwrap(), ErrorCategory::GrammarError).unwrap();
        session.capture_quote(&TextQuote::new("fox"));

        session.replace_text("A different output");
        assert!(session.annotations().is_empty());
        assert_eq!(session.pending_selection(), None);
        assert_eq!(session.text().as_str(), "A different output");

        session.add(Span::new(2, 11).unwrap(), ErrorCategory::Ambiguity).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 0, 1]);
    }

    #[test]
    fn test_from_row_picks_inline_field() {
        let row = json!({
            "entry_id": "42",
            "model_name": "m",
            "src_text": "Hola, ¿cómo estás?",
            "hyp_text": "Hello, how are you?"
        });
        let session = ReviewSession::from_row("42", TaskType::Translation, row, MergePolicy::Merge);
        assert_eq!(session.text().as_str(), "Hello, how are you?");

        let session = ReviewSession::from_row("43", TaskType::Summarization, json!({}), MergePolicy::Merge);
        assert_eq!(session.text().as_str(), MISSING_TEXT);

        let session = ReviewSession::from_row(
            "44",
            TaskType::Classification,
            json!({"predicted_category": 3}),
            MergePolicy::Merge,
        );
        assert_eq!(session.text().as_str(), "3");
    }

    #[test]
    fn test_submission_payload() {
        let mut session = ReviewSession::from_row(
            "7",
            TaskType::Generation,
            json!({"output": "The quick brown fox"}),
            MergePolicy::Merge,
        );
        assert!(session.annotation_submission().is_none());

        session.add(Span::new(4, 9).unwrap(), ErrorCategory::GrammarError).unwrap();
        let payload = serde_json::to_value(session.annotation_submission().unwrap()).unwrap();
        assert_eq!(payload["entry_id"], "7");
        assert_eq!(payload["row_data"]["output"], "The quick brown fox");
        assert_eq!(
            payload["annotations"],
            json!([{"start": 4, "end": 9, "errorType": "Grammar Error"}])
        );
    }
}
