//! Line-oriented block parser.
//!
//! The normalized input is read one line at a time. Fenced code, headings,
//! rules, quotes, lists and paragraphs are recognized; blank lines separate
//! blocks. A line holding nothing but a diff span with block content becomes
//! a block diff node of its own.

use revise_grammar::{expand_newlines, span_at, split_update, DiffSpan};
use revise_types::{DiffKind, Marks, NodeId, NodeKind, TreeResult};

use crate::Builder;

/// What a single line opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LineKind<'a> {
    Blank,
    Fence { ticks: usize, info: &'a str },
    Heading { level: u8, content: &'a str },
    Rule,
    Quote(&'a str),
    Item(ListLine<'a>),
    Text(&'a str),
}

/// A line starting a list item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ListLine<'a> {
    pub indent: usize,
    pub ordered: bool,
    pub number: u64,
    pub content: &'a str,
}

#[derive(Debug)]
struct ListEntry {
    depth: usize,
    ordered: bool,
    number: u64,
    content: String,
}

pub(crate) fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    let start = line.trim_start();
    let ticks = start.bytes().take_while(|b| *b == b'`').count();
    if ticks >= 3 && !start[ticks..].contains('`') {
        return LineKind::Fence {
            ticks,
            info: start[ticks..].trim(),
        };
    }
    if let Some((level, content)) = heading(start) {
        return LineKind::Heading { level, content };
    }
    if is_rule(trimmed) {
        return LineKind::Rule;
    }
    if let Some(rest) = start.strip_prefix('>') {
        return LineKind::Quote(rest.strip_prefix(' ').unwrap_or(rest));
    }
    if let Some(item) = list_line(line) {
        return LineKind::Item(item);
    }
    LineKind::Text(trimmed)
}

/// Classify `lines[at]`. A fence opens only when another line follows it,
/// the same rule the span scanner applies to code runs.
pub(crate) fn line_kind<'a>(lines: &[&'a str], at: usize) -> Option<LineKind<'a>> {
    let line = *lines.get(at)?;
    Some(match classify(line) {
        LineKind::Fence { .. } if at + 1 == lines.len() => LineKind::Text(line.trim()),
        kind => kind,
    })
}

fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if rest.is_empty() {
        Some((hashes as u8, ""))
    } else if rest.starts_with([' ', '\t']) {
        Some((hashes as u8, rest.trim()))
    } else {
        None
    }
}

fn is_rule(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(c @ ('-' | '*' | '_')) => trimmed.len() >= 3 && chars.all(|next| next == c),
        _ => false,
    }
}

pub(crate) fn list_line(line: &str) -> Option<ListLine<'_>> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    let rest = &line[indent..];
    let (ordered, number, after) = match rest.strip_prefix(['-', '*', '+']) {
        Some(after) => (false, 1, after),
        None => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 || digits > 9 {
                return None;
            }
            let after = rest[digits..].strip_prefix('.')?;
            (true, rest[..digits].parse().ok()?, after)
        }
    };
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }
    Some(ListLine {
        indent,
        ordered,
        number,
        content: after.trim(),
    })
}

fn closes_fence(line: &str, ticks: usize) -> bool {
    let trimmed = line.trim();
    let run = trimmed.bytes().take_while(|b| *b == b'`').count();
    run >= ticks && run == trimmed.len()
}

/// Returns `true` if markup carries block structure: a blank line, or a line
/// that opens anything but a paragraph.
pub(crate) fn is_block_fragment(text: &str) -> bool {
    let lines: Vec<&str> = text.split('\n').collect();
    text.contains("\n\n")
        || (0..lines.len()).any(|at| {
            !matches!(
                line_kind(&lines, at),
                Some(LineKind::Text(_) | LineKind::Blank) | None
            )
        })
}

/// The span filling the whole line, if it is well formed and its content
/// is block-level.
fn block_span(line: &str) -> Option<DiffSpan> {
    let span = span_at(line, 0)?;
    if span.range.end != line.len() {
        return None;
    }
    let inner = span.inner(line);
    let block = match span.kind {
        DiffKind::Insert | DiffKind::Delete => is_block_fragment(&expand_newlines(inner)),
        DiffKind::Update => match split_update(inner) {
            Ok((before, after)) => {
                is_block_fragment(&expand_newlines(before))
                    || is_block_fragment(&expand_newlines(after))
            }
            Err(_) => false,
        },
    };
    block.then_some(span)
}

impl Builder<'_> {
    /// Parse markup as a sequence of blocks appended under `parent`.
    pub(crate) fn blocks(&mut self, parent: NodeId, text: &str) -> TreeResult<()> {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut i = 0;
        while let Some(kind) = line_kind(&lines, i) {
            i = match kind {
                LineKind::Blank => i + 1,
                LineKind::Fence { ticks, info } => self.fence(parent, &lines, i, ticks, info)?,
                LineKind::Heading { level, content } => {
                    let heading = self.doc.append_new(parent, NodeKind::Heading { level })?;
                    self.inline(heading, content, Marks::PLAIN)?;
                    i + 1
                }
                LineKind::Rule => {
                    self.doc.append_new(parent, NodeKind::HorizontalRule)?;
                    i + 1
                }
                LineKind::Quote(_) => self.quote(parent, &lines, i)?,
                LineKind::Item(_) => self.list(parent, &lines, i)?,
                LineKind::Text(_) => self.paragraph(parent, &lines, i)?,
            };
        }
        Ok(())
    }

    fn fence(
        &mut self,
        parent: NodeId,
        lines: &[&str],
        at: usize,
        ticks: usize,
        info: &str,
    ) -> TreeResult<usize> {
        let close = lines[at + 1..]
            .iter()
            .position(|line| closes_fence(line, ticks))
            .map(|offset| at + 1 + offset);
        let body_end = close.unwrap_or(lines.len());
        let code = lines[at + 1..body_end].join("\n");
        let language = (!info.is_empty()).then(|| info.to_string());
        self.doc
            .append_new(parent, NodeKind::CodeBlock { language, code })?;
        Ok(close.map_or(lines.len(), |c| c + 1))
    }

    fn quote(&mut self, parent: NodeId, lines: &[&str], at: usize) -> TreeResult<usize> {
        let mut content = Vec::new();
        let mut i = at;
        while let Some(LineKind::Quote(rest)) = line_kind(lines, i) {
            content.push(rest.trim_end());
            i += 1;
        }
        let quote = self.doc.append_new(parent, NodeKind::Quote)?;
        self.inline(quote, &content.join("\n"), Marks::PLAIN)?;
        Ok(i)
    }

    fn paragraph(&mut self, parent: NodeId, lines: &[&str], at: usize) -> TreeResult<usize> {
        let first = lines[at].trim();
        if let Some(span) = block_span(first).filter(|_| !self.in_span) {
            self.diff_span(parent, span.kind, span.inner(first), Marks::PLAIN, true)?;
            return Ok(at + 1);
        }
        let mut parts = vec![first];
        let mut i = at + 1;
        while let Some(LineKind::Text(text)) = line_kind(lines, i) {
            if !self.in_span && block_span(text).is_some() {
                break;
            }
            parts.push(text);
            i += 1;
        }
        let paragraph = self.doc.append_new(parent, NodeKind::Paragraph)?;
        self.inline(paragraph, &parts.join("\n"), Marks::PLAIN)?;
        Ok(i)
    }

    fn list(&mut self, parent: NodeId, lines: &[&str], at: usize) -> TreeResult<usize> {
        let mut entries: Vec<ListEntry> = Vec::new();
        let mut i = at;
        while let Some((line, kind)) = lines.get(i).zip(line_kind(lines, i)) {
            if let LineKind::Item(item) = kind {
                entries.push(ListEntry {
                    depth: item.indent / 2,
                    ordered: item.ordered,
                    number: item.number,
                    content: item.content.to_string(),
                });
            } else if line.starts_with([' ', '\t']) && !line.trim().is_empty() {
                let Some(last) = entries.last_mut() else {
                    break;
                };
                last.content.push('\n');
                last.content.push_str(line.trim());
            } else {
                break;
            }
            i += 1;
        }

        let mut pos = 0;
        while pos < entries.len() {
            let depth = entries[pos].depth;
            self.list_level(parent, &entries, &mut pos, depth)?;
        }
        Ok(i)
    }

    /// Build one list from `entries[*pos..]`, nesting deeper entries under
    /// the preceding item. Stops at a shallower entry or a change of list
    /// type.
    fn list_level(
        &mut self,
        parent: NodeId,
        entries: &[ListEntry],
        pos: &mut usize,
        depth: usize,
    ) -> TreeResult<()> {
        let first = &entries[*pos];
        let list = self.doc.append_new(
            parent,
            NodeKind::List {
                ordered: first.ordered,
                start: first.number,
            },
        )?;
        let mut last_item = None;
        while let Some(entry) = entries.get(*pos) {
            if entry.depth < depth {
                break;
            }
            if entry.depth > depth {
                if let Some(item) = last_item {
                    self.list_level(item, entries, pos, entry.depth)?;
                    continue;
                }
            }
            if entry.ordered != first.ordered {
                break;
            }
            let item = self.doc.append_new(list, NodeKind::ListItem)?;
            self.inline(item, &entry.content, Marks::PLAIN)?;
            last_item = Some(item);
            *pos += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_classified() {
        assert_eq!(classify("   "), LineKind::Blank);
        assert_eq!(
            classify("## Title "),
            LineKind::Heading {
                level: 2,
                content: "Title"
            }
        );
        assert_eq!(classify("#hashtag"), LineKind::Text("#hashtag"));
        assert_eq!(classify("---"), LineKind::Rule);
        assert_eq!(classify("> quoted"), LineKind::Quote("quoted"));
        assert_eq!(
            classify("```rust"),
            LineKind::Fence {
                ticks: 3,
                info: "rust"
            }
        );
        assert_eq!(classify("**bold** text"), LineKind::Text("**bold** text"));
    }

    #[test]
    fn fence_on_the_last_line_is_text() {
        let lines = ["```{++x++}"];
        assert_eq!(line_kind(&lines, 0), Some(LineKind::Text("```{++x++}")));
        let lines = ["```rust", "code"];
        assert!(matches!(line_kind(&lines, 0), Some(LineKind::Fence { ticks: 3, .. })));
        assert!(!is_block_fragment("```{++x++}"));
    }

    #[test]
    fn list_markers_need_a_space() {
        let item = list_line("  12. twelve").unwrap();
        assert_eq!(item.indent, 2);
        assert!(item.ordered);
        assert_eq!(item.number, 12);
        assert_eq!(item.content, "twelve");
        assert_eq!(list_line("-").map(|i| i.content), Some(""));
        assert!(list_line("-5 degrees").is_none());
        assert!(list_line("2024\\. A year").is_none());
    }

    #[test]
    fn block_fragments_are_detected() {
        assert!(is_block_fragment("# Title"));
        assert!(is_block_fragment("one\n\ntwo"));
        assert!(is_block_fragment("intro\n- item"));
        assert!(!is_block_fragment("a\nb"));
        assert!(!is_block_fragment("plain **text**"));
    }

    #[test]
    fn only_whole_line_spans_with_block_content_match() {
        assert!(block_span("{++# New++}").is_some());
        assert!(block_span("{~~# Old~>New~~}").is_some());
        assert!(block_span("{++new fact++}").is_none());
        assert!(block_span("{++# New++} tail").is_none());
        assert!(block_span("{~~# only one side~~}").is_none());
    }
}
