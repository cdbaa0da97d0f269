//! Reading a rendered container back into text nodes
//!
//! Hosts that only hold the markup they displayed can hand it back here to
//! obtain the text-node layout selection offsets refer to.

use html_escape::decode_html_entities;
use lol_html::{doc_text, rewrite_str, RewriteStrSettings};

use crate::error::HtmlError;
use crate::selection::TextContainer;

/// Collect the text nodes of `html`, decoding character references
///
/// Empty text nodes are skipped, matching how hosts report selections.
pub fn parse_container(html: &str) -> Result<TextContainer, HtmlError> {
    let mut container = TextContainer::default();
    let mut pending = String::new();

    rewrite_str(
        html,
        RewriteStrSettings {
            document_content_handlers: vec![doc_text!(|chunk| {
                pending.push_str(chunk.as_str());
                if chunk.last_in_text_node() {
                    let raw = std::mem::take(&mut pending);
                    container.push(decode_html_entities(&raw).into_owned());
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| HtmlError::Rewrite(e.to_string()))?;

    Ok(container)
}
