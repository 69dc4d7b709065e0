//! Tree walker shared by the renderer, the exporter and the plain-text view.

use revise_grammar::{closer, opener, ESCAPED_NEWLINE, UPDATE_SEPARATOR};
use revise_types::{DiffKind, Document, Marks, NodeId, NodeKind, Side};

use crate::escape::{
    code_fence, code_span, emphasis_marks, escape_text, escape_url, list_marker, Emphasis,
};

/// How diff nodes are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DiffStyle {
    /// As diff spans.
    Spans,
    /// As the content an accept would keep.
    Accepted,
}

/// How text is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TextStyle {
    Markdown,
    Plain,
}

pub(crate) struct Renderer<'a> {
    doc: &'a Document,
    diffs: DiffStyle,
    text: TextStyle,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(doc: &'a Document, diffs: DiffStyle, text: TextStyle) -> Self {
        Self { doc, diffs, text }
    }

    pub(crate) fn document(&self) -> String {
        self.blocks(self.doc.children(self.doc.root())).join("\n\n")
    }

    /// Render a sequence of nodes in block position, one string per block.
    ///
    /// Consecutive inline nodes are grouped and rendered like a paragraph.
    /// Empty blocks produce nothing.
    pub(crate) fn blocks(&self, ids: &[NodeId]) -> Vec<String> {
        let mut out = Vec::new();
        let mut group = Vec::new();
        for &id in ids {
            if self.doc.is_block(id) {
                self.flush_inline(&mut group, &mut out);
                self.block(id, &mut out);
            } else {
                group.push(id);
            }
        }
        self.flush_inline(&mut group, &mut out);
        out
    }

    fn flush_inline(&self, group: &mut Vec<NodeId>, out: &mut Vec<String>) {
        if group.is_empty() {
            return;
        }
        let text = self.inline(group, false);
        group.clear();
        if !text.trim().is_empty() {
            out.push(text);
        }
    }

    fn block(&self, id: NodeId, out: &mut Vec<String>) {
        let Some(kind) = self.doc.kind(id) else {
            return;
        };
        let children = self.doc.children(id);
        let rendered = match kind {
            NodeKind::Root => {
                out.extend(self.blocks(children));
                return;
            }
            NodeKind::Heading { level } => {
                let text = self.inline(children, false);
                match self.text {
                    _ if text.is_empty() => None,
                    TextStyle::Markdown => Some(format!("{} {text}", "#".repeat(*level as usize))),
                    TextStyle::Plain => Some(text),
                }
            }
            NodeKind::Paragraph => Some(self.inline(children, false)).filter(|t| !t.is_empty()),
            NodeKind::Quote => {
                let text = self.inline(children, false);
                match self.text {
                    _ if text.is_empty() => None,
                    TextStyle::Markdown => Some(format!("> {}", text.replace('\n', "\n> "))),
                    TextStyle::Plain => Some(text),
                }
            }
            NodeKind::List { ordered, start } => {
                Some(self.list(children, *ordered, *start, 0)).filter(|t| !t.is_empty())
            }
            NodeKind::ListItem => Some(self.list(&[id], false, 1, 0)).filter(|t| !t.is_empty()),
            NodeKind::CodeBlock { language, code } => Some(self.code_block(language, code)),
            NodeKind::HorizontalRule => match self.text {
                TextStyle::Markdown => Some("---".to_string()),
                TextStyle::Plain => None,
            },
            NodeKind::Diff { kind } => match self.diffs {
                DiffStyle::Accepted => {
                    out.extend(self.blocks(&self.kept(id, *kind)));
                    return;
                }
                DiffStyle::Spans => Some(self.block_diff(id, *kind)),
            },
            NodeKind::Text { .. }
            | NodeKind::LineBreak
            | NodeKind::Link { .. }
            | NodeKind::Container { .. } => {
                Some(self.inline(&[id], false)).filter(|t| !t.is_empty())
            }
        };
        out.extend(rendered);
    }

    fn code_block(&self, language: &Option<String>, code: &str) -> String {
        if self.text == TextStyle::Plain {
            return code.to_string();
        }
        let fence = code_fence(code);
        let info = language.as_deref().unwrap_or("");
        if code.is_empty() {
            format!("{fence}{info}\n{fence}")
        } else {
            format!("{fence}{info}\n{code}\n{fence}")
        }
    }

    fn list(&self, items: &[NodeId], ordered: bool, start: u64, indent: usize) -> String {
        let pad = " ".repeat(indent);
        let mut lines: Vec<String> = Vec::new();
        for (index, &item) in items.iter().enumerate() {
            if !matches!(self.doc.kind(item), Some(NodeKind::ListItem)) {
                for block in self.blocks(&[item]) {
                    lines.extend(block.lines().map(|l| format!("{pad}{l}")));
                }
                continue;
            }
            let marker = match self.text {
                TextStyle::Markdown => list_marker(ordered, start, index),
                TextStyle::Plain => String::new(),
            };
            let continuation = " ".repeat(indent + 2);
            let mut item_lines: Vec<String> = Vec::new();
            let mut group: Vec<NodeId> = Vec::new();

            let flush = |group: &mut Vec<NodeId>, item_lines: &mut Vec<String>| {
                if group.is_empty() {
                    return;
                }
                let text = self.inline(group, false);
                group.clear();
                for line in text.split('\n') {
                    if item_lines.is_empty() {
                        item_lines.push(format!("{pad}{marker}{line}"));
                    } else {
                        item_lines.push(format!("{continuation}{line}"));
                    }
                }
            };

            for &child in self.doc.children(item) {
                match self.doc.kind(child) {
                    Some(NodeKind::List {
                        ordered: nested_ordered,
                        start: nested_start,
                    }) => {
                        flush(&mut group, &mut item_lines);
                        if item_lines.is_empty() {
                            item_lines.push(format!("{pad}{}", marker.trim_end()));
                        }
                        let nested = self.list(
                            self.doc.children(child),
                            *nested_ordered,
                            *nested_start,
                            indent + 2,
                        );
                        item_lines.extend(nested.lines().map(str::to_string));
                    }
                    _ => group.push(child),
                }
            }
            flush(&mut group, &mut item_lines);
            if item_lines.is_empty() {
                item_lines.push(format!("{pad}{}", marker.trim_end()));
            }
            lines.extend(item_lines);
        }
        lines.join("\n")
    }

    fn block_diff(&self, id: NodeId, kind: DiffKind) -> String {
        let side = |ids: &[NodeId]| self.blocks(ids).join("\n\n");
        match kind {
            DiffKind::Insert | DiffKind::Delete => format!(
                "{}\n{}\n{}",
                opener(kind),
                side(self.doc.children(id)),
                closer(kind)
            ),
            DiffKind::Update => format!(
                "{}\n{}\n{UPDATE_SEPARATOR}\n{}\n{}",
                opener(kind),
                side(&self.doc.slot_children(id, Side::Before)),
                side(&self.doc.slot_children(id, Side::After)),
                closer(kind)
            ),
        }
    }

    /// Render inline nodes. Adjacent text runs with equal marks are written
    /// as one run.
    pub(crate) fn inline(&self, ids: &[NodeId], in_span: bool) -> String {
        self.inline_within(ids, in_span, Marks::PLAIN, None)
    }

    /// Render inline nodes inside regions already carrying `context`,
    /// right after the character `prev`.
    ///
    /// Each delimited mark is written once around the longest stretch of
    /// items carrying it, so runs split by nested marks, links or diffs
    /// share one pair of delimiters.
    fn inline_within(
        &self,
        ids: &[NodeId],
        in_span: bool,
        context: Marks,
        prev: Option<char>,
    ) -> String {
        let items = self.items(ids, context);
        let pieces = shift_whitespace(pieces(&items));
        let mut out = String::new();
        let mut open: Vec<&'static str> = Vec::new();
        for piece in pieces {
            let last = out.chars().next_back().or(prev);
            match piece {
                Piece::Text(text) => {
                    if self.text == TextStyle::Plain {
                        out.push_str(&text);
                    } else {
                        let line_start = at_line_start(&out);
                        out.push_str(&escape_text(&text, line_start));
                    }
                }
                Piece::Item(index, open_marks) => {
                    let inside = joined(context, open_marks);
                    let rendered = self.item(&items[index], in_span, inside, last);
                    out.push_str(&rendered);
                }
                Piece::Open(emphasis) => {
                    let delimiter = emphasis.delimiter(last);
                    open.push(delimiter);
                    out.push_str(delimiter);
                }
                Piece::Close => {
                    if let Some(delimiter) = open.pop() {
                        out.push_str(delimiter);
                    }
                }
            }
        }
        out
    }

    /// Group `ids` into items, adjacent text runs with equal marks joined.
    fn items(&self, ids: &[NodeId], context: Marks) -> Vec<Item> {
        let mut items = Vec::new();
        let mut i = 0;
        while i < ids.len() {
            let id = ids[i];
            i += 1;
            let Some(kind) = self.doc.kind(id) else {
                continue;
            };
            let (content, marks) = match kind {
                NodeKind::Text { text, marks } => {
                    let mut joined = text.clone();
                    while let Some(NodeKind::Text {
                        text: next,
                        marks: next_marks,
                    }) = ids.get(i).and_then(|n| self.doc.kind(*n))
                    {
                        if next_marks != marks {
                            break;
                        }
                        joined.push_str(next);
                        i += 1;
                    }
                    let emphasis = emphasis_marks(*marks);
                    (ItemContent::Text(joined, *marks), Some(emphasis))
                }
                NodeKind::LineBreak => (ItemContent::LineBreak, None),
                NodeKind::Link { .. } | NodeKind::Container { .. } | NodeKind::Diff { .. } => {
                    (ItemContent::Node(id), self.shared_marks(id))
                }
                // Block content in inline position: keep its text.
                _ => (
                    ItemContent::Text(self.doc.text_content(id), Marks::PLAIN),
                    Some(Marks::PLAIN),
                ),
            };
            let marks = match self.text {
                TextStyle::Plain => Some(Marks::PLAIN),
                TextStyle::Markdown => marks.map(|m| without(m, context)),
            };
            items.push(Item { content, marks });
        }
        items
    }

    /// Delimited marks common to every text run below `id`; `None` when
    /// there is no text.
    fn shared_marks(&self, id: NodeId) -> Option<Marks> {
        let mut shared: Option<Marks> = None;
        for d in self.doc.descendants(id) {
            if let Some(NodeKind::Text { marks, .. }) = self.doc.kind(d) {
                let marks = emphasis_marks(*marks);
                shared = Some(match shared {
                    Some(s) => Marks {
                        bold: s.bold && marks.bold,
                        italic: s.italic && marks.italic,
                        strikethrough: s.strikethrough && marks.strikethrough,
                        code: false,
                    },
                    None => marks,
                });
            }
        }
        shared
    }

    fn item(&self, item: &Item, in_span: bool, open: Marks, prev: Option<char>) -> String {
        match &item.content {
            ItemContent::Text(text, _) => match self.text {
                TextStyle::Markdown => code_span(text),
                TextStyle::Plain => text.clone(),
            },
            ItemContent::LineBreak => {
                if in_span {
                    ESCAPED_NEWLINE.to_string()
                } else {
                    "\n".to_string()
                }
            }
            ItemContent::Node(id) => self.node(*id, in_span, open, prev),
        }
    }

    fn node(&self, id: NodeId, in_span: bool, context: Marks, prev: Option<char>) -> String {
        match self.doc.kind(id) {
            Some(NodeKind::Link { url }) => {
                let children = self.doc.children(id);
                let label = self.inline_within(children, in_span, context, Some('['));
                match self.text {
                    TextStyle::Markdown => format!("[{label}]({})", escape_url(url)),
                    TextStyle::Plain => label,
                }
            }
            Some(NodeKind::Diff { kind }) => self.inline_diff(id, *kind, in_span, context, prev),
            _ => self.inline_within(self.doc.children(id), in_span, context, prev),
        }
    }

    fn inline_diff(
        &self,
        id: NodeId,
        kind: DiffKind,
        in_span: bool,
        context: Marks,
        prev: Option<char>,
    ) -> String {
        // Spans do not nest: a diff inside span content shows its kept side.
        if self.diffs == DiffStyle::Accepted || in_span {
            return self.inline_within(&self.kept(id, kind), in_span, context, prev);
        }
        let open = opener(kind);
        let mut out = open.to_string();
        let after_open = open.chars().next_back();
        match kind {
            DiffKind::Insert | DiffKind::Delete => {
                let content = self.doc.children(id);
                out.push_str(&self.inline_within(content, true, context, after_open));
            }
            DiffKind::Update => {
                let before = self.doc.slot_content(id, Side::Before);
                let after = self.doc.slot_content(id, Side::After);
                out.push_str(&self.inline_within(&before, true, context, after_open));
                out.push_str(UPDATE_SEPARATOR);
                let after_separator = UPDATE_SEPARATOR.chars().next_back();
                out.push_str(&self.inline_within(&after, true, context, after_separator));
            }
        }
        out.push_str(closer(kind));
        out
    }

    fn kept(&self, id: NodeId, kind: DiffKind) -> Vec<NodeId> {
        match kind {
            DiffKind::Insert => self.doc.children(id).to_vec(),
            DiffKind::Delete => Vec::new(),
            DiffKind::Update => self.doc.slot_content(id, Side::After),
        }
    }
}

fn at_line_start(out: &str) -> bool {
    out.is_empty() || out.ends_with('\n') || out.ends_with(ESCAPED_NEWLINE)
}

enum ItemContent {
    /// A text run with its full marks.
    Text(String, Marks),
    LineBreak,
    /// A link, container or diff rendered from the tree.
    Node(NodeId),
}

struct Item {
    content: ItemContent,
    /// Delimited marks beyond the surrounding context. `None` for items
    /// that take whatever marks surround them, such as line breaks.
    marks: Option<Marks>,
}

enum Piece {
    /// Unescaped text.
    Text(String),
    /// The item at this index, rendered inside the given open marks.
    Item(usize, Marks),
    Open(Emphasis),
    Close,
}

fn emphasis_index(e: Emphasis) -> usize {
    match e {
        Emphasis::Strikethrough => 0,
        Emphasis::Bold => 1,
        Emphasis::Italic => 2,
    }
}

fn set_mark(marks: &mut Marks, e: Emphasis, on: bool) {
    match e {
        Emphasis::Strikethrough => marks.strikethrough = on,
        Emphasis::Bold => marks.bold = on,
        Emphasis::Italic => marks.italic = on,
    }
}

fn joined(a: Marks, b: Marks) -> Marks {
    Marks {
        bold: a.bold || b.bold,
        italic: a.italic || b.italic,
        strikethrough: a.strikethrough || b.strikethrough,
        code: false,
    }
}

/// `marks` without the marks already set in `context`.
fn without(marks: Marks, context: Marks) -> Marks {
    Marks {
        bold: marks.bold && !context.bold,
        italic: marks.italic && !context.italic,
        strikethrough: marks.strikethrough && !context.strikethrough,
        code: false,
    }
}

/// Lay out items with the delimiters of every mark region.
fn pieces(items: &[Item]) -> Vec<Piece> {
    let active: Vec<Vec<bool>> = Emphasis::ALL
        .iter()
        .map(|e| region_cover(items, *e))
        .collect();
    let mut pieces = Vec::new();
    let mut stack: Vec<Emphasis> = Vec::new();
    let mut open_marks = Marks::PLAIN;
    for index in 0..items.len() {
        let wanted = |e: Emphasis| active[emphasis_index(e)][index];
        if let Some(depth) = stack.iter().position(|e| !wanted(*e)) {
            while stack.len() > depth {
                if let Some(e) = stack.pop() {
                    set_mark(&mut open_marks, e, false);
                    pieces.push(Piece::Close);
                }
            }
        }
        let mut opening: Vec<Emphasis> = Emphasis::ALL
            .iter()
            .copied()
            .filter(|e| wanted(*e) && !stack.contains(e))
            .collect();
        let run = |e: Emphasis| {
            active[emphasis_index(e)][index..]
                .iter()
                .take_while(|on| **on)
                .count()
        };
        opening.sort_by_key(|e| std::cmp::Reverse(run(*e)));
        for e in opening {
            set_mark(&mut open_marks, e, true);
            stack.push(e);
            pieces.push(Piece::Open(e));
        }
        match &items[index].content {
            ItemContent::Text(text, marks) if !marks.code => {
                pieces.push(Piece::Text(text.clone()));
            }
            _ => pieces.push(Piece::Item(index, open_marks)),
        }
    }
    pieces.extend(stack.iter().map(|_| Piece::Close));
    pieces
}

/// Items covered by a region of `e`. An item without marks of its own is
/// covered only when the items on both sides are.
fn region_cover(items: &[Item], e: Emphasis) -> Vec<bool> {
    let own: Vec<Option<bool>> = items
        .iter()
        .map(|item| item.marks.map(|m| e.is_set(m)))
        .collect();
    let mut cover = vec![false; items.len()];
    let mut last: Option<bool> = None;
    for (i, state) in own.iter().enumerate() {
        match state {
            Some(on) => {
                cover[i] = *on;
                last = Some(*on);
            }
            None => {
                let next = own[i + 1..].iter().find_map(|s| *s);
                cover[i] = last == Some(true) && next == Some(true);
            }
        }
    }
    cover
}

/// Move whitespace at the inner edge of a delimiter outside it: an opener
/// cannot be followed by whitespace, nor a closer preceded by it.
fn shift_whitespace(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::with_capacity(pieces.len());
    let mut carried = String::new();
    let mut iter = pieces.into_iter().peekable();
    while let Some(piece) = iter.next() {
        if !matches!(piece, Piece::Close) && !carried.is_empty() {
            out.push(Piece::Text(std::mem::take(&mut carried)));
        }
        let mut text = match piece {
            Piece::Text(text) => text,
            other => {
                out.push(other);
                continue;
            }
        };
        if matches!(out.last(), Some(Piece::Open(_))) {
            let trimmed = text.trim_start().len();
            let lead = text[..text.len() - trimmed].to_string();
            if !lead.is_empty() {
                let first_open = out
                    .iter()
                    .rposition(|p| !matches!(p, Piece::Open(_)))
                    .map_or(0, |k| k + 1);
                out.insert(first_open, Piece::Text(lead));
                text = text[text.len() - trimmed..].to_string();
            }
        }
        if matches!(iter.peek(), Some(Piece::Close)) {
            let kept = text.trim_end().len();
            carried = text[kept..].to_string();
            text.truncate(kept);
        }
        if !text.is_empty() {
            out.push(Piece::Text(text));
        }
    }
    if !carried.is_empty() {
        out.push(Piece::Text(carried));
    }
    out
}
