//! HTML processing for the review container
//!
//! - `highlight`: segment markup with category colors
//! - `container`: text-node recovery from displayed markup (lol_html)

mod container;
mod highlight;

pub use container::parse_container;
pub use highlight::{render_html, HighlightConfig};
