//! Highlight markup for rendered segments
//!
//! Unlabeled segments become bare escaped text; labeled segments become a
//! `<span>` carrying the category class, data attributes and, optionally,
//! an inline background color. Every segment maps to exactly one text node,
//! so the container can be read back with [`super::parse_container`].

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Deserialize;

use crate::render::Segment;

/// Configuration for highlight markup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HighlightConfig {
    /// CSS class prefix for highlights
    pub class_prefix: String,
    /// Data attribute holding the category label
    pub category_attribute: String,
    /// Data attribute holding the segment start offset
    pub offset_attribute: String,
    /// Whether to include inline background colors
    pub include_inline_styles: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            class_prefix: "rv-highlight".to_string(),
            category_attribute: "data-error-type".to_string(),
            offset_attribute: "data-start".to_string(),
            include_inline_styles: true,
        }
    }
}

/// Render segments as the inner HTML of the review container
pub fn render_html<'a>(
    segments: impl IntoIterator<Item = Segment<'a>>,
    config: &HighlightConfig,
) -> String {
    let mut html = String::new();
    for segment in segments {
        match segment.category {
            None => html.push_str(&encode_text(segment.text)),
            Some(category) => {
                let _ = write!(
                    html,
                    "<span class=\"{prefix} {prefix}-{slug}\" {cat_attr}=\"{label}\" {off_attr}=\"{start}\"",
                    prefix = config.class_prefix,
                    slug = category.slug(),
                    cat_attr = config.category_attribute,
                    label = encode_double_quoted_attribute(category.label()),
                    off_attr = config.offset_attribute,
                    start = segment.span.start(),
                );
                if config.include_inline_styles {
                    let _ = write!(html, " style=\"background-color: {};\"", category.color());
                }
                html.push('>');
                html.push_str(&encode_text(segment.text));
                html.push_str("</span>");
            }
        }
    }
    html
}
