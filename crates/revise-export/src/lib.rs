//! Markdown rendering and diff-markup export for Revise documents.
//!
//! [`render`] writes a document as canonical markdown. [`export`] is the
//! same walk with live diff nodes written back as diff spans, so its output
//! re-enters the importer. A document without diff nodes renders and exports
//! to the same text.
//!
//! # Key Types
//!
//! - [`ExportOptions`] -- Exporter settings
//! - [`escape`] -- Escaping helpers shared with the diff engine

pub mod escape;
mod render;

use revise_grammar::normalize;
use revise_types::{Document, NodeId};
use serde::{Deserialize, Serialize};

use render::{DiffStyle, Renderer, TextStyle};

pub use escape::{
    code_fence, code_span, emphasis_marks, escape_text, escape_url, list_marker, Emphasis,
};

/// Exporter settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Write every diff span on a single line, as the normalizer would.
    pub collapse_spans: bool,
}

/// Render a document as canonical markdown.
///
/// Diff nodes are shown with the content an accept would keep.
pub fn render(doc: &Document) -> String {
    Renderer::new(doc, DiffStyle::Accepted, TextStyle::Markdown).document()
}

/// Export a document as diff markup with default options.
pub fn export(doc: &Document) -> String {
    export_with(doc, &ExportOptions::default())
}

/// Export a document as diff markup.
pub fn export_with(doc: &Document, options: &ExportOptions) -> String {
    let text = Renderer::new(doc, DiffStyle::Spans, TextStyle::Markdown).document();
    if options.collapse_spans {
        normalize(&text)
    } else {
        text
    }
}

/// Unformatted text of a document, blocks separated by blank lines.
pub fn plain_text(doc: &Document) -> String {
    Renderer::new(doc, DiffStyle::Accepted, TextStyle::Plain).document()
}

/// Markup for one block, diff nodes written as spans.
pub fn render_block(doc: &Document, id: NodeId) -> String {
    Renderer::new(doc, DiffStyle::Spans, TextStyle::Markdown)
        .blocks(&[id])
        .join("\n\n")
}

/// Markup for a sequence of inline nodes, diff nodes written as spans.
///
/// The first run is escaped as if it started a line.
pub fn render_inline(doc: &Document, ids: &[NodeId]) -> String {
    Renderer::new(doc, DiffStyle::Spans, TextStyle::Markdown).inline(ids, false)
}

/// Markup for inline nodes placed inside a diff span. Line breaks are
/// written as the escaped marker.
pub fn render_span_content(doc: &Document, ids: &[NodeId]) -> String {
    Renderer::new(doc, DiffStyle::Spans, TextStyle::Markdown).inline(ids, true)
}
