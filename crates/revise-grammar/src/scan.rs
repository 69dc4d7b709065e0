//! Escape-aware scanning of diff markup.
//!
//! All positions are byte offsets. Every construct the scanner recognizes
//! starts and ends on an ASCII byte, so the offsets it returns are always
//! valid `str` boundaries.
//!
//! The scanner knows three atomic constructs:
//!
//! - a backslash followed by ASCII punctuation (an escape pair);
//! - a code run: a run of backticks closed by the next run of the same
//!   length, or a fenced block opened by three or more backticks at line
//!   start and closed by a later line holding at least as many and nothing
//!   else;
//! - a diff span: an opener and the first unescaped matching closer outside
//!   code. Spans do not nest.

use std::ops::Range;

use revise_types::DiffKind;

use crate::syntax::{closer, opener, opener_kind, split_update, DELIMITER_LEN};

/// A diff span located in a text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffSpan {
    pub kind: DiffKind,
    /// Byte range of the whole span, delimiters included.
    pub range: Range<usize>,
    /// Byte range of the content between the delimiters.
    pub inner_range: Range<usize>,
}

impl DiffSpan {
    /// The span text, delimiters included.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.clone()]
    }

    /// The content between the delimiters.
    pub fn inner<'a>(&self, source: &'a str) -> &'a str {
        &source[self.inner_range.clone()]
    }

    /// Returns `false` for update spans without exactly one separator.
    pub fn is_well_formed(&self, source: &str) -> bool {
        match self.kind {
            DiffKind::Insert | DiffKind::Delete => true,
            DiffKind::Update => split_update(self.inner(source)).is_ok(),
        }
    }
}

/// What a region of markup holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionKind {
    /// Ordinary markup, escape pairs included.
    Plain,
    /// A code span or fenced code block.
    Code,
    /// A diff span.
    Span(DiffKind),
}

/// A contiguous region of markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub range: Range<usize>,
}

/// The diff span starting exactly at `at`, if one does.
pub fn span_at(text: &str, at: usize) -> Option<DiffSpan> {
    let bytes = text.as_bytes();
    let kind = opener_kind(bytes.get(at..)?)?;
    let inner_start = at + opener(kind).len();
    let close = find_closer(text, inner_start, kind)?;
    Some(DiffSpan {
        kind,
        range: at..close + DELIMITER_LEN,
        inner_range: inner_start..close,
    })
}

/// Position of the first unescaped closer of `kind` at or after `from`,
/// skipping code runs.
pub fn find_closer(text: &str, from: usize, kind: DiffKind) -> Option<usize> {
    find_from(text, from, closer(kind), false)
}

/// Every diff span in the text, in order. Spans inside code are ignored,
/// and an opener without a closer is left alone.
pub fn find_spans(text: &str) -> Vec<DiffSpan> {
    regions(text)
        .into_iter()
        .filter(|r| matches!(r.kind, RegionKind::Span(_)))
        .filter_map(|r| span_at(text, r.range.start))
        .collect()
}

/// Number of well-formed diff spans in the text.
pub fn count_spans(text: &str) -> usize {
    find_spans(text)
        .iter()
        .filter(|s| s.is_well_formed(text))
        .count()
}

/// Split the text into plain, code and span regions covering all of it.
pub fn regions(text: &str) -> Vec<Region> {
    let bytes = text.as_bytes();
    let mut out: Vec<Region> = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(span) = span_at(text, i) {
            push_plain(&mut out, plain_start, i);
            let end = span.range.end;
            out.push(Region {
                kind: RegionKind::Span(span.kind),
                range: span.range,
            });
            i = end;
            plain_start = i;
            continue;
        }
        if bytes[i] == b'`' {
            if let Some(end) = code_end(bytes, i) {
                push_plain(&mut out, plain_start, i);
                out.push(Region {
                    kind: RegionKind::Code,
                    range: i..end,
                });
                i = end;
                plain_start = i;
                continue;
            }
        }
        i = skip_atom(bytes, i, false);
    }
    push_plain(&mut out, plain_start, bytes.len());
    out
}

/// First occurrence of `needle` at or after `from` that lies outside
/// escapes, code runs and diff spans.
pub fn find_outside(text: &str, from: usize, needle: &str) -> Option<usize> {
    find_from(text, from, needle, true)
}

/// Every occurrence of `needle` outside escapes and code runs.
pub fn find_all_outside_code(text: &str, needle: &str) -> Vec<usize> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(at) = find_from(text, from, needle, false) {
        found.push(at);
        from = at + needle.len().max(1);
    }
    found
}

/// End of the atomic construct starting at `at`, or `at + 1` for an
/// ordinary byte.
pub fn skip_atom(bytes: &[u8], at: usize, skip_spans: bool) -> usize {
    match bytes[at] {
        b'\\' if bytes.get(at + 1).is_some_and(u8::is_ascii_punctuation) => at + 2,
        b'`' => code_end(bytes, at).unwrap_or(at + run_len(bytes, at, b'`')),
        b'{' if skip_spans => {
            match opener_kind(&bytes[at..]) {
                Some(kind) => {
                    let start = at + DELIMITER_LEN;
                    find_bytes(bytes, start, closer(kind).as_bytes(), false)
                        .map(|close| close + DELIMITER_LEN)
                        .unwrap_or(at + 1)
                }
                None => at + 1,
            }
        }
        _ => at + 1,
    }
}

/// End of the code run starting at `at`, if it is closed.
///
/// A run opens a fence when it is at least three backticks long, starts a
/// line that continues onto another one, and the rest of its line holds no
/// backtick. A fence that is never closed runs to the end of the text. An
/// inline code run does not continue past a blank line.
pub fn code_end(bytes: &[u8], at: usize) -> Option<usize> {
    let n = run_len(bytes, at, b'`');
    if n == 0 {
        return None;
    }
    let eol = line_end(bytes, at);
    let fence = n >= 3
        && at_line_start(bytes, at)
        && eol < bytes.len()
        && !bytes[at + n..eol].contains(&b'`');
    if fence {
        let mut line = eol;
        while line < bytes.len() {
            let start = line + 1;
            let first = skip_blanks(bytes, start);
            let run = run_len(bytes, first, b'`');
            let end = line_end(bytes, first);
            if run >= n && bytes[first + run..end].iter().all(|b| *b == b' ' || *b == b'\t') {
                return Some(end);
            }
            line = line_end(bytes, start);
        }
        return Some(bytes.len());
    }

    let mut j = at + n;
    while j < bytes.len() {
        match bytes[j] {
            b'`' => {
                let m = run_len(bytes, j, b'`');
                if m == n {
                    return Some(j + m);
                }
                j += m;
            }
            b'\n' if is_blank_line(bytes, j + 1) => return None,
            _ => j += 1,
        }
    }
    None
}

fn push_plain(out: &mut Vec<Region>, start: usize, end: usize) {
    if end > start {
        out.push(Region {
            kind: RegionKind::Plain,
            range: start..end,
        });
    }
}

fn find_from(text: &str, from: usize, needle: &str, skip_spans: bool) -> Option<usize> {
    find_bytes(text.as_bytes(), from, needle.as_bytes(), skip_spans)
}

fn find_bytes(bytes: &[u8], from: usize, needle: &[u8], skip_spans: bool) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i..].starts_with(needle) {
            return Some(i);
        }
        i = skip_atom(bytes, i, skip_spans);
    }
    None
}

fn run_len(bytes: &[u8], at: usize, byte: u8) -> usize {
    bytes
        .get(at..)
        .map(|rest| rest.iter().take_while(|b| **b == byte).count())
        .unwrap_or(0)
}

fn at_line_start(bytes: &[u8], at: usize) -> bool {
    bytes[..at]
        .iter()
        .rev()
        .take_while(|b| **b != b'\n')
        .all(|b| *b == b' ' || *b == b'\t')
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|b| *b == b'\n')
        .map(|p| from + p)
        .unwrap_or(bytes.len())
}

fn skip_blanks(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    i
}

/// Returns `true` if the line starting at `from` is blank and followed by
/// another line.
fn is_blank_line(bytes: &[u8], from: usize) -> bool {
    let end = skip_blanks(bytes, from);
    end < bytes.len() && bytes[end] == b'\n'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<DiffKind> {
        find_spans(text).into_iter().map(|s| s.kind).collect()
    }

    #[test]
    fn finds_each_kind() {
        let text = "a {++b++} c {--d--} e {~~f~>g~~}";
        assert_eq!(
            kinds(text),
            vec![DiffKind::Insert, DiffKind::Delete, DiffKind::Update]
        );
        let spans = find_spans(text);
        assert_eq!(spans[0].inner(text), "b");
        assert_eq!(spans[2].text(text), "{~~f~>g~~}");
    }

    #[test]
    fn escaped_opener_is_not_a_span() {
        assert!(find_spans("\\{++x++}").is_empty());
    }

    #[test]
    fn escaped_closer_is_skipped() {
        let text = "{++a\\++}b++}";
        let spans = find_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].inner(text), "a\\++}b");
    }

    #[test]
    fn unterminated_opener_is_left_alone() {
        assert!(find_spans("{++never closed").is_empty());
        assert_eq!(kinds("{++a {--b--}"), vec![DiffKind::Delete]);
    }

    #[test]
    fn spans_inside_code_are_ignored() {
        assert!(find_spans("`{++x++}`").is_empty());
        assert!(find_spans("```\n{++x++}\n```").is_empty());
        assert_eq!(kinds("`a` {++x++}"), vec![DiffKind::Insert]);
    }

    #[test]
    fn unmatched_backtick_is_literal() {
        assert_eq!(kinds("a ` {++x++}"), vec![DiffKind::Insert]);
    }

    #[test]
    fn code_span_stops_at_blank_line() {
        assert_eq!(kinds("a `b\n\n{++x++} `"), vec![DiffKind::Insert]);
    }

    #[test]
    fn closer_inside_code_does_not_close() {
        let text = "{++a `++}` b++}";
        let spans = find_spans(text);
        assert_eq!(spans[0].inner(text), "a `++}` b");
    }

    #[test]
    fn malformed_updates_are_not_counted() {
        let text = "{~~only one side~~} {~~a~>b~~} {++c++}";
        assert_eq!(find_spans(text).len(), 3);
        assert_eq!(count_spans(text), 2);
    }

    #[test]
    fn regions_cover_the_text() {
        let text = "x `c` {++y++} z";
        let regions = regions(text);
        let kinds: Vec<_> = regions.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RegionKind::Plain,
                RegionKind::Code,
                RegionKind::Plain,
                RegionKind::Span(DiffKind::Insert),
                RegionKind::Plain,
            ]
        );
        assert_eq!(regions.last().map(|r| r.range.end), Some(text.len()));
    }

    #[test]
    fn find_outside_skips_spans_and_escapes() {
        let text = "a {++b**++} \\** c**";
        assert_eq!(find_outside(text, 0, "**"), Some(text.len() - 2));
    }

    #[test]
    fn fence_closer_must_stand_alone() {
        let text = "{++\n```\ncode\n```\n++}";
        assert_eq!(kinds(text), vec![DiffKind::Insert]);
        assert!(find_spans("{++x\n\n```\ncode\n```++}").is_empty());
    }

    #[test]
    fn collapsed_fence_is_an_inline_run() {
        let inner = "```\\na\\n```~>```\\nb\\n```";
        assert_eq!(code_end(inner.as_bytes(), 0), Some(11));
        assert_eq!(find_all_outside_code(inner, "~>"), vec![11]);
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let text = "```\ncode {++x++}";
        assert_eq!(code_end(text.as_bytes(), 0), Some(text.len()));
    }
}
