//! Markup normalizer.
//!
//! Free-form diff markup (typically produced by a language model) is
//! rewritten into the canonical form the importer expects:
//!
//! 1. split delimiters are repaired and every multi-line span is collapsed
//!    onto one line, its newlines replaced by the escaped marker;
//! 2. a heading marker in plain text that is not at line start gets a line
//!    break in front of it;
//! 3. a span whose content starts a heading is moved onto a line of its own.
//!
//! [`normalize`] is idempotent.

use std::sync::OnceLock;

use regex::Regex;
use revise_types::DiffKind;

use crate::scan::{find_spans, regions, DiffSpan, RegionKind};
use crate::syntax::{collapse_newlines, span_text, split_update, update_text};

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("static pattern compiles"))
        }
    };
}

static_regex!(split_opener, r"(^|[^\\])\{[ \t]*\n[ \t\n]*(\+\+|--|~~)");
static_regex!(split_closer, r"(\+\+|--|~~)[ \t]*\n[ \t\n]*\}");
static_regex!(heading_marker, r"#{1,6} ");
static_regex!(heading_in_span, r"(?:^|\\n|~>)#{1,6} ");

/// Rewrite diff markup into canonical form.
pub fn normalize(text: &str) -> String {
    let text = normalize_line_endings(text);
    let text = repair_split_markers(&text);
    let text = collapse_spans(&text);
    let text = break_before_headings(&text);
    isolate_heading_spans(&text)
}

fn normalize_line_endings(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}

/// Join `{` / `}` back onto marker characters a line break separated them
/// from. Code regions are left untouched.
fn repair_split_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for region in regions(text) {
        if region.kind != RegionKind::Code {
            continue;
        }
        out.push_str(&repair_segment(&text[last..region.range.start]));
        out.push_str(&text[region.range.clone()]);
        last = region.range.end;
    }
    out.push_str(&repair_segment(&text[last..]));
    out
}

fn repair_segment(segment: &str) -> String {
    if !segment.contains('\n') {
        return segment.to_string();
    }
    let opened = split_opener().replace_all(segment, "${1}{${2}");
    split_closer().replace_all(&opened, "${1}}").into_owned()
}

fn collapse_spans(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in find_spans(text) {
        out.push_str(&text[last..span.range.start]);
        out.push_str(&collapse_span(text, &span));
        last = span.range.end;
    }
    out.push_str(&text[last..]);
    out
}

fn collapse_span(text: &str, span: &DiffSpan) -> String {
    let inner = span.inner(text);
    if !inner.contains('\n') {
        return span.text(text).to_string();
    }
    match (span.kind, split_update(inner)) {
        (DiffKind::Update, Ok((before, after))) => {
            update_text(&collapse_part(before), &collapse_part(after))
        }
        (kind, _) => span_text(kind, &collapse_part(inner)),
    }
}

/// Drop blank edges that hold a line break, then escape inner newlines.
fn collapse_part(part: &str) -> String {
    collapse_newlines(trim_edge_breaks(part))
}

fn trim_edge_breaks(part: &str) -> &str {
    let blank = |c: char| c == ' ' || c == '\t' || c == '\n';
    let start_trimmed = part.trim_start_matches(blank);
    let part = if part[..part.len() - start_trimmed.len()].contains('\n') {
        start_trimmed
    } else {
        part
    };
    let end_trimmed = part.trim_end_matches(blank);
    if part[end_trimmed.len()..].contains('\n') {
        end_trimmed
    } else {
        part
    }
}

fn break_before_headings(text: &str) -> String {
    let mut cuts = Vec::new();
    for region in regions(text) {
        if region.kind != RegionKind::Plain {
            continue;
        }
        let segment = &text[region.range.clone()];
        for found in heading_marker().find_iter(segment) {
            let at = region.range.start + found.start();
            if heading_needs_break(text, at) {
                cuts.push(at);
            }
        }
    }
    if cuts.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + cuts.len());
    let mut last = 0;
    for at in cuts {
        out.push_str(&text[last..at]);
        trim_trailing_blanks(&mut out);
        out.push('\n');
        last = at;
    }
    out.push_str(&text[last..]);
    out
}

/// A marker qualifies when it starts its `#` run, follows whitespace or
/// punctuation (but not an escape or an entity), and has text before it on
/// its line.
fn heading_needs_break(text: &str, at: usize) -> bool {
    let Some(prev) = text.as_bytes()[..at].last().copied() else {
        return false;
    };
    let prev_allowed = prev == b' '
        || prev == b'\t'
        || (prev.is_ascii_punctuation() && !matches!(prev, b'#' | b'\\' | b'&'));
    prev_allowed && has_text_before(text, at)
}

fn isolate_heading_spans(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in find_spans(text) {
        if !heading_in_span().is_match(span.inner(text)) {
            continue;
        }
        let (start, end) = (span.range.start, span.range.end);
        out.push_str(&text[last..start]);
        if has_text_before(text, start) && !out.ends_with('\n') {
            trim_trailing_blanks(&mut out);
            out.push('\n');
        }
        out.push_str(&text[start..end]);
        last = end;
        if has_text_after(text, end) {
            out.push('\n');
            last = skip_blanks(text, end);
        }
    }
    out.push_str(&text[last..]);
    out
}

fn has_text_before(text: &str, at: usize) -> bool {
    let line_start = text[..at].rfind('\n').map(|p| p + 1).unwrap_or(0);
    !text[line_start..at].trim().is_empty()
}

fn has_text_after(text: &str, at: usize) -> bool {
    let line_end = text[at..].find('\n').map(|p| at + p).unwrap_or(text.len());
    !text[at..line_end].trim().is_empty()
}

fn skip_blanks(text: &str, at: usize) -> usize {
    at + text[at..].len() - text[at..].trim_start_matches([' ', '\t']).len()
}

fn trim_trailing_blanks(out: &mut String) {
    let keep = out.trim_end_matches([' ', '\t']).len();
    out.truncate(keep);
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- 1. Multi-line spans ----

    #[test]
    fn newlines_inside_spans_are_escaped() {
        assert_eq!(normalize("{++a\nb++}"), "{++a\\nb++}");
        assert_eq!(normalize("x {--a\n\nb--} y"), "x {--a\\n\\nb--} y");
    }

    #[test]
    fn edge_breaks_are_dropped() {
        assert_eq!(normalize("{++\nTitle\n++}"), "{++Title++}");
        assert_eq!(normalize("{~~old\n~>\nnew~~}"), "{~~old~>new~~}");
    }

    #[test]
    fn split_markers_are_repaired() {
        assert_eq!(normalize("{\n++x++\n}"), "{++x++}");
        assert_eq!(normalize("a {  \n  --gone--} b"), "a {--gone--} b");
    }

    #[test]
    fn escaped_brace_is_not_repaired() {
        let text = "\\{\n++x";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn crlf_becomes_lf() {
        assert_eq!(normalize("a\r\nb"), "a\nb");
    }

    // ---- 2. Heading markers in plain text ----

    #[test]
    fn mid_line_heading_gets_a_break() {
        assert_eq!(normalize("Intro # Title"), "Intro\n# Title");
        assert_eq!(normalize("{++x++}## Next"), "{++x++}\n## Next");
    }

    #[test]
    fn non_heading_hashes_are_left_alone() {
        for text in ["C# rocks", "issue #1", "a \\# b", "####### seven", "`a # b`", "  # indented"] {
            assert_eq!(normalize(text), text, "{text:?}");
        }
    }

    #[test]
    fn hashes_inside_spans_are_left_alone() {
        assert_eq!(normalize("{++a # b++}"), "{++a # b++}");
    }

    // ---- 3. Spans holding headings ----

    #[test]
    fn heading_span_moves_to_its_own_line() {
        assert_eq!(
            normalize("The {++# Title++} stands."),
            "The\n{++# Title++}\nstands."
        );
        assert_eq!(
            normalize("x {~~Old~># New~~}"),
            "x\n{~~Old~># New~~}"
        );
        assert_eq!(
            normalize("x {--a\n## Gone--}"),
            "x\n{--a\\n## Gone--}"
        );
    }

    #[test]
    fn isolated_heading_span_is_unchanged() {
        let text = "{~~# Old Title~># New Title~~}";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn adjacent_heading_spans_get_one_break() {
        assert_eq!(
            normalize("{++# A++}{++# B++}"),
            "{++# A++}\n{++# B++}"
        );
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn content() -> impl Strategy<Value = String> {
            proptest::collection::vec(
                prop_oneof![
                    "[a-z]{1,5}",
                    Just(" ".to_string()),
                    Just("\n".to_string()),
                    Just("# ".to_string()),
                ],
                0..6,
            )
            .prop_map(|parts| parts.concat())
        }

        fn span() -> impl Strategy<Value = String> {
            (0..5usize, content(), content()).prop_map(|(shape, a, b)| match shape {
                0 => format!("{{++{a}++}}"),
                1 => format!("{{--{a}--}}"),
                2 => format!("{{~~{a}~>{b}~~}}"),
                3 => format!("{{~~{a}~~}}"),
                _ => format!("{{\n++{a}++\n}}"),
            })
        }

        fn markup() -> impl Strategy<Value = String> {
            proptest::collection::vec(
                prop_oneof![
                    "[a-z]{1,6}",
                    Just(" ".to_string()),
                    Just(".".to_string()),
                    Just("\n".to_string()),
                    Just("\n\n".to_string()),
                    Just("# ".to_string()),
                    Just("## ".to_string()),
                    span(),
                ],
                0..14,
            )
            .prop_map(|parts| parts.concat())
        }

        proptest! {
            #[test]
            fn normalize_is_idempotent(text in markup()) {
                let once = normalize(&text);
                prop_assert_eq!(normalize(&once), once);
            }

            #[test]
            fn normalized_spans_are_single_line(text in markup()) {
                let once = normalize(&text);
                for span in find_spans(&once) {
                    prop_assert!(!span.text(&once).contains('\n'));
                }
            }
        }
    }
}
