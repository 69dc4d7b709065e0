//! Diff grammar for Revise.
//!
//! Diffs travel as plain text embedded in markdown:
//!
//! - insertion `{++content++}`
//! - deletion `{--content--}`
//! - update `{~~before~>after~~}`
//!
//! Content is itself markup and may be empty. Inside a span, the two
//! characters `\n` stand for a line break.
//!
//! # Key Types
//!
//! - [`DiffSpan`] -- A span located by the escape-aware scanner
//! - [`Region`] / [`RegionKind`] -- Plain, code and span regions of a text
//! - [`normalize`] -- Idempotent rewrite of free-form markup into canonical form

pub mod normalize;
pub mod scan;
pub mod syntax;

pub use normalize::normalize;
pub use scan::{
    code_end, count_spans, find_all_outside_code, find_closer, find_outside, find_spans,
    regions, skip_atom, span_at, DiffSpan, Region, RegionKind,
};
pub use syntax::{
    closer, collapse_newlines, expand_newlines, opener, opener_kind, span_text, split_update,
    unescape, update_text, DELIMITER_LEN, ESCAPED_NEWLINE, UPDATE_SEPARATOR,
};
