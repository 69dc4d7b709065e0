//! Delimiters, separators and the escaped line break marker.

use revise_types::DiffKind;

use crate::scan;

/// Two-character marker standing in for a newline inside a diff span.
pub const ESCAPED_NEWLINE: &str = "\\n";

/// Separator between the before and after halves of an update span.
pub const UPDATE_SEPARATOR: &str = "~>";

/// Every delimiter is three bytes long.
pub const DELIMITER_LEN: usize = 3;

/// Opening delimiter for a diff kind.
pub fn opener(kind: DiffKind) -> &'static str {
    match kind {
        DiffKind::Insert => "{++",
        DiffKind::Delete => "{--",
        DiffKind::Update => "{~~",
    }
}

/// Closing delimiter for a diff kind.
pub fn closer(kind: DiffKind) -> &'static str {
    match kind {
        DiffKind::Insert => "++}",
        DiffKind::Delete => "--}",
        DiffKind::Update => "~~}",
    }
}

/// The diff kind whose opener starts `bytes`, if any.
pub fn opener_kind(bytes: &[u8]) -> Option<DiffKind> {
    DiffKind::ALL
        .into_iter()
        .find(|kind| bytes.starts_with(opener(*kind).as_bytes()))
}

/// Wrap content in the delimiters of an insert or delete span.
pub fn span_text(kind: DiffKind, content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 2 * DELIMITER_LEN);
    out.push_str(opener(kind));
    out.push_str(content);
    out.push_str(closer(kind));
    out
}

/// Build an update span from its two halves.
pub fn update_text(before: &str, after: &str) -> String {
    let mut out = String::with_capacity(before.len() + after.len() + 8);
    out.push_str(opener(DiffKind::Update));
    out.push_str(before);
    out.push_str(UPDATE_SEPARATOR);
    out.push_str(after);
    out.push_str(closer(DiffKind::Update));
    out
}

/// Split update content on its separator.
///
/// Separators inside escapes and code spans do not count. On anything but
/// exactly one separator, the number found is returned as the error.
pub fn split_update(content: &str) -> Result<(&str, &str), usize> {
    let positions = scan::find_all_outside_code(content, UPDATE_SEPARATOR);
    match positions.as_slice() {
        [at] => Ok((
            &content[..*at],
            &content[*at + UPDATE_SEPARATOR.len()..],
        )),
        other => Err(other.len()),
    }
}

/// Replace literal newlines with the escaped marker.
pub fn collapse_newlines(text: &str) -> String {
    text.replace('\n', ESCAPED_NEWLINE)
}

/// Turn escaped markers back into newlines.
///
/// Backslash escape pairs are kept as they are, so an escaped backslash
/// followed by `n` stays literal text.
pub fn expand_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some(next) if next.is_ascii_punctuation() => {
                chars.next();
                out.push('\\');
                out.push(next);
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// Undo backslash escapes: a backslash before ASCII punctuation is dropped.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('\\', Some(next)) if next.is_ascii_punctuation() => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiters_pair_up() {
        for kind in DiffKind::ALL {
            let text = span_text(kind, "x");
            assert_eq!(opener_kind(text.as_bytes()), Some(kind));
            assert!(text.ends_with(closer(kind)));
        }
    }

    #[test]
    fn split_update_requires_one_separator() {
        assert_eq!(split_update("old~>new"), Ok(("old", "new")));
        assert_eq!(split_update("only one side"), Err(0));
        assert_eq!(split_update("a~>b~>c"), Err(2));
    }

    #[test]
    fn escaped_separator_does_not_split() {
        assert_eq!(split_update("a\\~>b"), Err(0));
        assert_eq!(split_update("`~>`~>b"), Ok(("`~>`", "b")));
    }

    #[test]
    fn newline_markers_expand() {
        assert_eq!(expand_newlines("a\\nb"), "a\nb");
        assert_eq!(expand_newlines("a\\\\nb"), "a\\\\nb");
        assert_eq!(expand_newlines("\\*x\\"), "\\*x\\");
        assert_eq!(collapse_newlines("a\nb\n"), "a\\nb\\n");
    }

    #[test]
    fn unescape_drops_escape_backslashes() {
        assert_eq!(unescape("\\{a\\}"), "{a}");
        assert_eq!(unescape("a\\\\b"), "a\\b");
        assert_eq!(unescape("a\\b"), "a\\b");
    }

    #[test]
    fn update_text_layout() {
        assert_eq!(update_text("a", "b"), "{~~a~>b~~}");
    }
}
