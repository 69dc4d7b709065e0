//! Diff markup importer for Revise.
//!
//! [`import`] turns diff markup into a live document tree:
//!
//! 1. the text is normalized;
//! 2. the block parser reads it line by line; a line holding nothing but a
//!    span with block content becomes a block diff node directly;
//! 3. the inline parser materializes every other well-formed span as an
//!    inline diff node, leaving malformed ones as literal text;
//! 4. promotion moves block content out of parents that cannot hold it;
//! 5. adjacent text runs with equal marks are merged.
//!
//! Import never fails. Input it cannot make sense of stays text.
//!
//! # Key Types
//!
//! - [`ImportOptions`] -- Importer settings
//! - [`promote`] -- The promotion pass, usable on any document

mod block;
mod inline;
pub mod promote;

use revise_grammar::normalize;
use revise_types::{Document, EngineEvent, EngineObserver, NodeKind};
use serde::{Deserialize, Serialize};

pub use promote::{needs_promotion, promote_all};

/// Importer settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Upper bound on promotion passes over the whole tree.
    pub max_promotion_rounds: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            max_promotion_rounds: 16,
        }
    }
}

/// Parser state: the document being built and the observer receiving
/// import events.
pub(crate) struct Builder<'a> {
    doc: Document,
    observer: &'a dyn EngineObserver,
    /// Set while parsing span content. Spans do not nest, so openers found
    /// there stay literal text.
    in_span: bool,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(observer: &'a dyn EngineObserver) -> Self {
        Self {
            doc: Document::new(),
            observer,
            in_span: false,
        }
    }
}

/// Import diff markup into a document.
pub fn import(text: &str, options: &ImportOptions, observer: &dyn EngineObserver) -> Document {
    let normalized = normalize(text);
    observer.on_event(&EngineEvent::Normalized {
        input_len: text.len(),
        output_len: normalized.len(),
    });

    let mut builder = Builder::new(observer);
    let root = builder.doc.root();
    let mut doc = match builder.blocks(root, &normalized) {
        Ok(()) => builder.doc,
        Err(_) => literal_document(&normalized),
    };
    promote_all(&mut doc, options.max_promotion_rounds, observer);
    for id in doc.pre_order() {
        doc.merge_adjacent_text(id);
    }
    doc
}

/// A document holding `text` as one plain paragraph.
fn literal_document(text: &str) -> Document {
    let mut doc = Document::new();
    let built = doc
        .append_new(doc.root(), NodeKind::Paragraph)
        .and_then(|paragraph| doc.append_new(paragraph, NodeKind::text(text)));
    // Both parents exist: the root always, the paragraph once appended.
    debug_assert!(built.is_ok());
    doc
}
