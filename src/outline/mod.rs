//! Jira rich-text description → restyled HTML + plain-text outline.
//!
//! The description field arrives entity-escaped. It is decoded, parsed into a
//! [`MarkupNode`] tree and walked once depth-first; every node yields its own
//! `{html, text}` pair which is appended to its parent's. Rendering never fails:
//! unknown elements pass their children through and empty constructs emit nothing.

pub mod node;
pub mod walk;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

pub use node::{Html5everParser, MarkupParser};
pub use walk::HeadingCounters;

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    pub html: String,
    pub text: String,
}

impl RenderResult {
    pub fn push(&mut self, other: RenderResult) {
        self.html.push_str(&other.html);
        self.text.push_str(&other.text);
    }
}

/// Render an escaped description with the default HTML5 parser.
pub fn render(raw_markup: &str) -> RenderResult {
    render_with(&Html5everParser, raw_markup)
}

pub fn render_with<P: MarkupParser>(parser: &P, raw_markup: &str) -> RenderResult {
    let decoded = html_escape::decode_html_entities(raw_markup);
    let root = parser.parse(&decoded);

    let mut counters = HeadingCounters::default();
    let mut result = walk::render_node(&root, 0, &mut counters);
    result.text = normalize_outline(&result.text);

    debug!(
        html_len = result.html.len(),
        text_lines = result.text.lines().count(),
        "rendered outline"
    );
    result
}

/// Collapse every blank-line run to exactly one blank line, then trim.
pub fn normalize_outline(text: &str) -> String {
    BLANK_RUN_RE.replace_all(text, "\n\n").trim().to_string()
}
