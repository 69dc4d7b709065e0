//! Escaping of text runs, code spans, link targets and list markers.

use revise_types::Marks;

/// Characters escaped wherever they appear in a text run.
pub const ALWAYS_ESCAPED: &[char] = &['\\', '*', '_', '`', '[', ']', '#', '{', '}', '~'];

/// Escape a text run so it parses back to the same text.
///
/// With `line_start`, a leading `-`, `+`, `>` or `N.` is escaped as well so
/// the run cannot open a list or a quote.
pub fn escape_text(text: &str, line_start: bool) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut rest = text;
    if line_start {
        match text.chars().next() {
            Some(first @ ('-' | '+' | '>')) => {
                out.push('\\');
                out.push(first);
                rest = &text[1..];
            }
            _ => {
                let digits = text.bytes().take_while(u8::is_ascii_digit).count();
                if digits > 0 && text[digits..].starts_with('.') {
                    out.push_str(&text[..digits]);
                    out.push_str("\\.");
                    rest = &text[digits + 1..];
                }
            }
        }
    }
    for c in rest.chars() {
        if ALWAYS_ESCAPED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render code as a backtick code span long enough to hold it.
pub fn code_span(code: &str) -> String {
    let fence = "`".repeat(longest_run(code, '`') + 1);
    let pad = code.starts_with('`')
        || code.ends_with('`')
        || (code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty());
    if pad {
        format!("{fence} {code} {fence}")
    } else {
        format!("{fence}{code}{fence}")
    }
}

/// Opening fence for a code block holding `code`.
pub fn code_fence(code: &str) -> String {
    "`".repeat((longest_run(code, '`') + 1).max(3))
}

/// A mark written with paired delimiters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
    Strikethrough,
    Bold,
    Italic,
}

impl Emphasis {
    /// Outermost first when regions of equal length open together.
    pub const ALL: [Emphasis; 3] = [Emphasis::Strikethrough, Emphasis::Bold, Emphasis::Italic];

    pub fn is_set(self, marks: Marks) -> bool {
        match self {
            Emphasis::Strikethrough => marks.strikethrough,
            Emphasis::Bold => marks.bold,
            Emphasis::Italic => marks.italic,
        }
    }

    /// Delimiter opening this mark right after `prev`.
    ///
    /// Underscores cannot open after a letter or digit, so italic takes
    /// stars there. Bold takes underscores right after a star.
    pub fn delimiter(self, prev: Option<char>) -> &'static str {
        match self {
            Emphasis::Strikethrough => "~~",
            Emphasis::Bold if prev == Some('*') => "__",
            Emphasis::Bold => "**",
            Emphasis::Italic if prev.is_some_and(|c| c.is_alphanumeric() || c == '_') => "*",
            Emphasis::Italic => "_",
        }
    }
}

/// Only the delimited marks of `marks`.
pub fn emphasis_marks(marks: Marks) -> Marks {
    Marks {
        code: false,
        ..marks
    }
}

/// Escape a link target.
pub fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        if matches!(c, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Marker for the item at `index` of a list.
pub fn list_marker(ordered: bool, start: u64, index: usize) -> String {
    if ordered {
        format!("{}. ", start + index as u64)
    } else {
        "- ".to_string()
    }
}

fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
