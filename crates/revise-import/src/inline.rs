//! Recursive-descent inline parser and the diff span matchers.
//!
//! Constructs are tried left to right; whichever starts first wins. Diff
//! spans have the highest precedence: an opener starts a span wherever the
//! scanner finds a matching closer. Closers of the other constructs are
//! searched outside escapes, code and spans, so a delimiter inside a span
//! never closes a construct opened before it.

use revise_grammar::{
    code_end, expand_newlines, find_outside, opener, opener_kind, span_at, split_update,
    unescape, DELIMITER_LEN,
};
use revise_types::{
    DiffKind, EngineEvent, LiteralReason, Marks, NodeId, NodeKind, Side, TreeResult,
};

use crate::block::is_block_fragment;
use crate::Builder;

impl Builder<'_> {
    /// Parse inline markup and append the resulting nodes under `parent`,
    /// every text run carrying at least `marks`.
    pub(crate) fn inline(&mut self, parent: NodeId, text: &str, marks: Marks) -> TreeResult<()> {
        let bytes = text.as_bytes();
        let mut buf = String::new();
        let mut i = 0;
        while i < bytes.len() {
            i = match bytes[i] {
                b'{' => match opener_kind(&bytes[i..]).filter(|_| !self.in_span) {
                    Some(kind) => self.span(parent, text, i, kind, marks, &mut buf)?,
                    None => {
                        buf.push('{');
                        i + 1
                    }
                },
                b'\\' if bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => {
                    buf.push(bytes[i + 1] as char);
                    i + 2
                }
                b'`' => self.code(parent, text, i, marks, &mut buf)?,
                b'[' => self.link(parent, text, i, marks, &mut buf)?,
                b'*' | b'_' | b'~' => self.emphasis(parent, text, i, marks, &mut buf)?,
                b'\n' => {
                    self.flush(parent, &mut buf, marks)?;
                    self.doc.append_new(parent, NodeKind::LineBreak)?;
                    i + 1
                }
                _ => match text[i..].chars().next() {
                    Some(c) => {
                        buf.push(c);
                        i + c.len_utf8()
                    }
                    None => break,
                },
            };
        }
        self.flush(parent, &mut buf, marks)
    }

    fn flush(&mut self, parent: NodeId, buf: &mut String, marks: Marks) -> TreeResult<()> {
        if !buf.is_empty() {
            let text = std::mem::take(buf);
            self.doc
                .append_new(parent, NodeKind::Text { text, marks })?;
        }
        Ok(())
    }

    /// Inline matcher: a span at `at` becomes a diff node, or stays literal
    /// when it is unterminated or an update without exactly one separator.
    fn span(
        &mut self,
        parent: NodeId,
        text: &str,
        at: usize,
        kind: DiffKind,
        marks: Marks,
        buf: &mut String,
    ) -> TreeResult<usize> {
        let Some(span) = span_at(text, at) else {
            self.observer.on_event(&EngineEvent::SpanLeftLiteral {
                kind,
                reason: LiteralReason::Unterminated,
            });
            buf.push_str(opener(kind));
            return Ok(at + DELIMITER_LEN);
        };
        if let (DiffKind::Update, Err(count)) = (kind, split_update(span.inner(text))) {
            self.observer.on_event(&EngineEvent::SpanLeftLiteral {
                kind,
                reason: LiteralReason::SeparatorCount(count),
            });
            let literal = expand_newlines(span.text(text));
            for (n, line) in literal.split('\n').enumerate() {
                if n > 0 {
                    self.flush(parent, buf, marks)?;
                    self.doc.append_new(parent, NodeKind::LineBreak)?;
                }
                buf.push_str(&unescape(line));
            }
            return Ok(span.range.end);
        }
        self.flush(parent, buf, marks)?;
        self.diff_span(parent, kind, span.inner(text), marks, false)?;
        Ok(span.range.end)
    }

    /// Materialize span content as a diff node appended under `parent`.
    ///
    /// Content with block structure is parsed as blocks. An update whose
    /// sides are both inline gets one container per side; otherwise every
    /// side holds blocks, inline-only content wrapped in a paragraph. Span
    /// openers inside the content are text.
    pub(crate) fn diff_span(
        &mut self,
        parent: NodeId,
        kind: DiffKind,
        inner: &str,
        marks: Marks,
        block_match: bool,
    ) -> TreeResult<NodeId> {
        let outer = std::mem::replace(&mut self.in_span, true);
        let diff = self.span_content(parent, kind, inner, marks);
        self.in_span = outer;
        let diff = diff?;
        self.observer.on_event(&EngineEvent::SpanImported {
            id: diff,
            kind,
            block_match,
        });
        Ok(diff)
    }

    fn span_content(
        &mut self,
        parent: NodeId,
        kind: DiffKind,
        inner: &str,
        marks: Marks,
    ) -> TreeResult<NodeId> {
        let diff = self.doc.append_new(parent, NodeKind::Diff { kind })?;
        match kind {
            DiffKind::Insert | DiffKind::Delete => {
                let content = expand_newlines(inner);
                if is_block_fragment(&content) {
                    self.blocks(diff, &content)?;
                } else {
                    self.inline(diff, &content, marks)?;
                }
            }
            DiffKind::Update => {
                let (before, after) = split_update(inner).unwrap_or((inner, ""));
                let before = expand_newlines(before);
                let after = expand_newlines(after);
                if is_block_fragment(&before) || is_block_fragment(&after) {
                    self.block_slot(diff, Side::Before, &before)?;
                    self.block_slot(diff, Side::After, &after)?;
                } else {
                    for (side, content) in [(Side::Before, before), (Side::After, after)] {
                        let container = self.doc.create(NodeKind::Container { side });
                        self.doc.append_to_slot(diff, container, side)?;
                        self.inline(container, &content, marks)?;
                    }
                }
            }
        }
        Ok(diff)
    }

    fn block_slot(&mut self, diff: NodeId, side: Side, content: &str) -> TreeResult<()> {
        let mut children = Vec::new();
        if is_block_fragment(content) {
            let holder = self.doc.create(NodeKind::Container { side });
            self.blocks(holder, content)?;
            children = self.doc.split_off_children(holder, 0)?;
            self.doc.remove_subtree(holder)?;
        }
        if children.is_empty() {
            let paragraph = self.doc.create(NodeKind::Paragraph);
            self.inline(paragraph, content.trim(), Marks::PLAIN)?;
            children.push(paragraph);
        }
        for child in children {
            self.doc.append_to_slot(diff, child, side)?;
        }
        Ok(())
    }

    fn code(
        &mut self,
        parent: NodeId,
        text: &str,
        at: usize,
        marks: Marks,
        buf: &mut String,
    ) -> TreeResult<usize> {
        let bytes = text.as_bytes();
        let ticks = bytes[at..].iter().take_while(|b| **b == b'`').count();
        let fence = &text[at..at + ticks];
        let body = code_end(bytes, at).and_then(|end| {
            let body = text[at + ticks..end].trim_end_matches([' ', '\t']);
            body.strip_suffix(fence).map(|body| (body, end))
        });
        let Some((body, end)) = body else {
            buf.push_str(fence);
            return Ok(at + ticks);
        };
        let mut code = body.replace('\n', " ");
        if code.len() >= 2
            && code.starts_with(' ')
            && code.ends_with(' ')
            && !code.trim().is_empty()
        {
            code = code[1..code.len() - 1].to_string();
        }
        self.flush(parent, buf, marks)?;
        self.doc.append_new(
            parent,
            NodeKind::Text {
                text: code,
                marks: marks.with_code(),
            },
        )?;
        Ok(end)
    }

    fn link(
        &mut self,
        parent: NodeId,
        text: &str,
        at: usize,
        marks: Marks,
        buf: &mut String,
    ) -> TreeResult<usize> {
        let target = find_outside(text, at + 1, "]").and_then(|label_end| {
            if !text[label_end + 1..].starts_with('(') {
                return None;
            }
            let url_start = label_end + 2;
            let url_end = find_outside(text, url_start, ")")?;
            let url = &text[url_start..url_end];
            let has_span = DiffKind::ALL.iter().any(|k| url.contains(opener(*k)));
            (!has_span && !url.contains('\n')).then_some((label_end, url, url_end))
        });
        let Some((label_end, url, url_end)) = target else {
            buf.push('[');
            return Ok(at + 1);
        };
        self.flush(parent, buf, marks)?;
        let link = self
            .doc
            .append_new(parent, NodeKind::Link { url: unescape(url) })?;
        self.inline(link, &text[at + 1..label_end], marks)?;
        Ok(url_end + 1)
    }

    fn emphasis(
        &mut self,
        parent: NodeId,
        text: &str,
        at: usize,
        marks: Marks,
        buf: &mut String,
    ) -> TreeResult<usize> {
        let bytes = text.as_bytes();
        let c = bytes[at];
        let doubled = bytes.get(at + 1) == Some(&c);
        let (delim, inner_marks) = match (c, doubled) {
            (b'~', true) => ("~~", marks.with_strikethrough()),
            (b'~', false) => ("~", marks),
            (b'*', true) => ("**", marks.with_bold()),
            (b'_', true) => ("__", marks.with_bold()),
            (b'*', false) => ("*", marks.with_italic()),
            _ => ("_", marks.with_italic()),
        };
        let start = at + delim.len();
        let intraword = c == b'_'
            && text[..at]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric);
        let opens = delim != "~"
            && !intraword
            && text[start..].chars().next().is_some_and(|n| !n.is_whitespace());
        let close = if !opens {
            None
        } else if c == b'~' {
            find_outside(text, start, delim)
        } else {
            find_closer(text, start, c, delim.len())
        };
        match close {
            Some(close) if close > start && !text[..close].ends_with(char::is_whitespace) => {
                self.flush(parent, buf, marks)?;
                self.inline(parent, &text[start..close], inner_marks)?;
                Ok(close + delim.len())
            }
            _ => {
                buf.push_str(delim);
                Ok(start)
            }
        }
    }
}

/// The closer of a `len`-character run of `c` opened before `from`,
/// searched outside escapes, code and spans.
///
/// A run of three closes two nested marks, the inner one first. Outer marks
/// are matched before the marks they enclose, so the closer searched here
/// takes the tail of the run.
fn find_closer(text: &str, from: usize, c: u8, len: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let needle = if c == b'*' { "*" } else { "_" };
    let mut from = from;
    loop {
        let at = find_outside(text, from, needle)?;
        let run = bytes[at..].iter().take_while(|b| **b == c).count();
        match (len, run) {
            (1, 1) => return Some(at),
            (1, 3) => return Some(at + 2),
            (2, 3) => return Some(at + 1),
            (2, run) if run != 1 => return Some(at),
            _ => from = at + run,
        }
    }
}
