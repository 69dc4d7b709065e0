//! AST diff engine for Revise.
//!
//! [`compute_diff`] compares two documents that carry no diff nodes and
//! writes diff markup describing how to turn the first into the second.
//! Root blocks are aligned first; blocks of the same shape are then diffed
//! run by run, and text runs that only changed their words get a word-level
//! diff. The markup is valid importer input: importing it and accepting
//! every diff renders the same as the after document, rejecting every diff
//! renders the same as the before document.
//!
//! # Key Types
//!
//! - [`DiffOptions`] -- Granularity and replacement style
//! - [`DiffOutput`] -- Markup plus a [`DiffSummary`] of the emitted spans

mod block_diff;
mod inline_diff;
pub mod options;
mod spans;

use revise_types::Document;

use block_diff::BlockDiffer;
use inline_diff::InlineDiffer;
use spans::SpanWriter;

pub use options::{DiffOptions, DiffOutput, DiffSummary, Granularity, Replacements};

/// Diff two documents into markup and span counts.
pub fn compute_diff(before: &Document, after: &Document, options: &DiffOptions) -> DiffOutput {
    let differ = BlockDiffer {
        inline: InlineDiffer {
            before,
            after,
            granularity: options.granularity,
        },
    };
    let mut spans = SpanWriter::new(options.replacements);
    let markup = differ.diff(&mut spans).join("\n\n");
    DiffOutput {
        markup,
        summary: spans.summary(),
    }
}

/// Diff two documents into markup only.
pub fn compute_diff_markup(before: &Document, after: &Document, options: &DiffOptions) -> String {
    compute_diff(before, after, options).markup
}
