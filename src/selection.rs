//! Selection capture
//!
//! Maps a host text selection onto a span of the original source string.
//! Once annotations have been rendered, the container no longer holds one
//! flat text node: every highlight splits it into more fragments. Offsets
//! are therefore computed by summing the lengths of all fragments that
//! precede the selection boundary.
//!
//! When the host can only report the selected string, [`TextQuote`] falls
//! back to searching the source. Repeated substrings make that ambiguous;
//! prefix/suffix context narrows the candidates and the result reports
//! whether more than one remained.

use serde::{Deserialize, Serialize};

use crate::annotations::{utf16_len, SourceText, Span};
use crate::render::Segment;

/// Text content of a rendered container, one fragment per text node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextContainer {
    fragments: Vec<String>,
    /// UTF-16 offset where each fragment starts
    starts: Vec<usize>,
    len: usize,
}

impl TextContainer {
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut container = Self::default();
        for fragment in fragments {
            container.push(fragment.into());
        }
        container
    }

    /// Container as rendered from `segments`, one text node per segment
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = Segment<'a>>) -> Self {
        Self::from_fragments(segments.into_iter().map(|s| s.text))
    }

    pub(crate) fn push(&mut self, fragment: String) {
        if fragment.is_empty() {
            return;
        }
        self.starts.push(self.len);
        self.len += utf16_len(&fragment);
        self.fragments.push(fragment);
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Total length in UTF-16 code units
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Concatenated text of every fragment
    pub fn text(&self) -> String {
        self.fragments.concat()
    }

    /// Whether the fragments concatenate to exactly `text`
    pub fn matches(&self, text: &str) -> bool {
        let mut rest = text;
        for fragment in &self.fragments {
            match rest.strip_prefix(fragment.as_str()) {
                Some(tail) => rest = tail,
                None => return false,
            }
        }
        rest.is_empty()
    }

    /// Absolute offset of a selection point, `None` if it names a node or
    /// offset the container does not have
    fn resolve(&self, point: SelectionPoint) -> Option<usize> {
        match point {
            SelectionPoint::BeforeContainer => Some(0),
            SelectionPoint::AfterContainer => Some(self.len),
            SelectionPoint::InText { node, offset } => {
                let fragment = self.fragments.get(node)?;
                if offset > utf16_len(fragment) {
                    return None;
                }
                Some(self.starts[node] + offset)
            }
        }
    }
}

/// One end of a host selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionPoint {
    /// Somewhere before the container in document order
    BeforeContainer,
    /// Inside text node `node` of the container, `offset` UTF-16 units in
    InText { node: usize, offset: usize },
    /// Somewhere after the container in document order
    AfterContainer,
}

/// A host selection: where it was started and where it was released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSelection {
    pub anchor: SelectionPoint,
    pub focus: SelectionPoint,
}

impl TextSelection {
    pub fn new(anchor: SelectionPoint, focus: SelectionPoint) -> Self {
        Self { anchor, focus }
    }

    /// Selection within a single text node
    pub fn within(node: usize, anchor: usize, focus: usize) -> Self {
        Self {
            anchor: SelectionPoint::InText { node, offset: anchor },
            focus: SelectionPoint::InText { node, offset: focus },
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    fn is_outside(&self) -> bool {
        use SelectionPoint::{AfterContainer, BeforeContainer};
        matches!(
            (self.anchor, self.focus),
            (BeforeContainer, BeforeContainer) | (AfterContainer, AfterContainer)
        )
    }
}

/// Span of `source` covered by `selection` inside `container`
///
/// Returns `None` for a collapsed selection, a selection entirely outside
/// the container, points that do not exist in the container, a container
/// whose text differs from the source, or a span that would split a
/// character. Backwards selections are normalized.
pub fn map_selection(
    source: &SourceText,
    container: &TextContainer,
    selection: &TextSelection,
) -> Option<Span> {
    if selection.is_collapsed() || selection.is_outside() {
        return None;
    }
    if container.len() != source.len() || !container.matches(source.as_str()) {
        tracing::warn!("Rendered container text does not match the source text");
        return None;
    }

    let anchor = container.resolve(selection.anchor)?;
    let focus = container.resolve(selection.focus)?;
    let span = Span::new(anchor.min(focus), anchor.max(focus)).ok()?;

    match source.check_span(span) {
        Ok(()) => Some(span),
        Err(e) => {
            tracing::debug!("Discarding selection {}: {}", span, e);
            None
        }
    }
}

/// Selected text with optional surrounding context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuote {
    pub exact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

/// Outcome of locating a quote in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteMatch {
    /// First occurrence consistent with the context
    pub span: Span,
    /// More than one occurrence matched the context
    pub ambiguous: bool,
}

impl TextQuote {
    pub fn new(exact: impl Into<String>) -> Self {
        Self {
            exact: exact.into(),
            prefix: None,
            suffix: None,
        }
    }

    pub fn with_context(mut self, prefix: Option<&str>, suffix: Option<&str>) -> Self {
        self.prefix = prefix.map(str::to_string);
        self.suffix = suffix.map(str::to_string);
        self
    }

    /// Find the quote in `source` by string search
    pub fn locate(&self, source: &SourceText) -> Option<QuoteMatch> {
        if self.exact.is_empty() {
            return None;
        }
        let haystack = source.as_str();

        let mut candidates = haystack
            .char_indices()
            .map(|(byte, _)| byte)
            .filter(|&byte| haystack[byte..].starts_with(self.exact.as_str()))
            .filter(|&byte| self.context_matches(haystack, byte));

        let first = candidates.next()?;
        let ambiguous = candidates.next().is_some();

        let start = source.position_of_byte(first)?;
        let span = Span::new(start, start + utf16_len(&self.exact)).ok()?;
        if ambiguous {
            tracing::debug!("Quote {:?} matches more than once; using {}", self.exact, span);
        }
        Some(QuoteMatch { span, ambiguous })
    }

    fn context_matches(&self, haystack: &str, byte: usize) -> bool {
        let prefix_ok = self
            .prefix
            .as_deref()
            .map_or(true, |prefix| haystack[..byte].ends_with(prefix));
        let suffix_ok = self
            .suffix
            .as_deref()
            .map_or(true, |suffix| haystack[byte + self.exact.len()..].starts_with(suffix));
        prefix_ok && suffix_ok
    }
}
