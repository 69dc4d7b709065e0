//! Inline diff: run alignment, then a word or sentence diff inside runs
//! that changed text but kept their marks.

use std::ops::Range;

use revise_export::render_inline;
use revise_types::{DiffKind, Document, Marks, NodeId, NodeKind, Side, TreeResult};
use similar::{capture_diff_slices, Algorithm, DiffTag, TextDiff};

use crate::options::{Granularity, Replacements};

/// Changed ranges of two aligned sequences, merged across adjacent
/// non-equal operations, interleaved with the equal ranges.
pub(crate) enum Segment {
    Equal(Range<usize>),
    Changed(Range<usize>, Range<usize>),
}

/// Align two key sequences with Myers and merge consecutive changes.
pub(crate) fn segments(old: &[String], new: &[String]) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut pending: Option<(Range<usize>, Range<usize>)> = None;
    for op in capture_diff_slices(Algorithm::Myers, old, new) {
        let (tag, o, n) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            if let Some((po, pn)) = pending.take() {
                out.push(Segment::Changed(po, pn));
            }
            out.push(Segment::Equal(o));
            continue;
        }
        pending = Some(match pending.take() {
            Some((po, pn)) => (po.start..o.end, pn.start..n.end),
            None => (o, n),
        });
    }
    if let Some((po, pn)) = pending {
        out.push(Segment::Changed(po, pn));
    }
    out
}

pub(crate) struct InlineDiffer<'a> {
    pub(crate) before: &'a Document,
    pub(crate) after: &'a Document,
    pub(crate) granularity: Granularity,
}

/// Inline diff markup and the kinds of the spans it holds, in order.
#[derive(Debug)]
pub(crate) struct InlineMarkup {
    pub(crate) markup: String,
    pub(crate) kinds: Vec<DiffKind>,
}

impl InlineDiffer<'_> {
    /// Diff markup turning the inline nodes `old` of the before document
    /// into `new` of the after document.
    ///
    /// The result is assembled as a paragraph of diff nodes and rendered
    /// with the exporter, so marks around and inside spans are written the
    /// way the importer reads them back.
    pub(crate) fn diff(
        &self,
        old: &[NodeId],
        new: &[NodeId],
        replacements: Replacements,
    ) -> TreeResult<InlineMarkup> {
        let old_keys: Vec<String> = old
            .iter()
            .map(|id| render_inline(self.before, &[*id]))
            .collect();
        let new_keys: Vec<String> = new
            .iter()
            .map(|id| render_inline(self.after, &[*id]))
            .collect();

        let mut scratch = Scratch::new(replacements)?;
        for segment in segments(&old_keys, &new_keys) {
            match segment {
                Segment::Equal(range) => scratch.graft(self.before, &old[range])?,
                Segment::Changed(o, n) => {
                    let old_runs = &old[o];
                    let new_runs = &new[n];
                    match self.text_pairs(old_runs, new_runs) {
                        Some(pairs) => {
                            for (before, after, marks) in pairs {
                                scratch.text_diff(&before, &after, marks, self.granularity)?;
                            }
                        }
                        None => scratch.replace(
                            Content::Nodes(self.before, old_runs),
                            Content::Nodes(self.after, new_runs),
                        )?,
                    }
                }
            }
        }
        Ok(scratch.finish())
    }

    /// Pairs of text runs when both ranges hold the same number of
    /// non-code text runs with matching marks.
    fn text_pairs(&self, old: &[NodeId], new: &[NodeId]) -> Option<Vec<(String, String, Marks)>> {
        if old.len() != new.len() {
            return None;
        }
        old.iter()
            .zip(new)
            .map(|(o, n)| match (self.before.kind(*o), self.after.kind(*n)) {
                (
                    Some(NodeKind::Text { text: a, marks: ma }),
                    Some(NodeKind::Text { text: b, marks: mb }),
                ) if ma == mb && !ma.code => Some((a.clone(), b.clone(), *ma)),
                _ => None,
            })
            .collect()
    }
}

/// One side of a replacement.
#[derive(Clone, Copy)]
enum Content<'d> {
    Text(&'d str, Marks),
    Nodes(&'d Document, &'d [NodeId]),
}

impl Content<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Content::Text(text, _) => text.is_empty(),
            Content::Nodes(_, ids) => ids.is_empty(),
        }
    }
}

/// A paragraph under construction holding the diffed runs.
struct Scratch {
    doc: Document,
    paragraph: NodeId,
    replacements: Replacements,
    kinds: Vec<DiffKind>,
}

impl Scratch {
    fn new(replacements: Replacements) -> TreeResult<Self> {
        let mut doc = Document::new();
        let paragraph = doc.append_new(doc.root(), NodeKind::Paragraph)?;
        Ok(Self {
            doc,
            paragraph,
            replacements,
            kinds: Vec::new(),
        })
    }

    fn finish(self) -> InlineMarkup {
        InlineMarkup {
            markup: render_inline(&self.doc, self.doc.children(self.paragraph)),
            kinds: self.kinds,
        }
    }

    fn graft(&mut self, source: &Document, ids: &[NodeId]) -> TreeResult<()> {
        let paragraph = self.paragraph;
        self.fill(paragraph, Content::Nodes(source, ids))
    }

    fn fill(&mut self, parent: NodeId, content: Content<'_>) -> TreeResult<()> {
        match content {
            Content::Text(text, _) if text.is_empty() => {}
            Content::Text(text, marks) => {
                self.doc.append_new(parent, NodeKind::marked_text(text, marks))?;
            }
            Content::Nodes(source, ids) => {
                for &id in ids {
                    self.doc.graft(parent, source, id)?;
                }
            }
        }
        Ok(())
    }

    /// An insertion or deletion; nothing for empty content.
    fn span(&mut self, kind: DiffKind, content: Content<'_>) -> TreeResult<()> {
        if content.is_empty() {
            return Ok(());
        }
        let diff = self.doc.append_new(self.paragraph, NodeKind::Diff { kind })?;
        self.fill(diff, content)?;
        self.kinds.push(kind);
        Ok(())
    }

    /// A replacement, degrading to a single insertion or deletion when one
    /// side is empty.
    fn replace(&mut self, before: Content<'_>, after: Content<'_>) -> TreeResult<()> {
        if before.is_empty() {
            return self.span(DiffKind::Insert, after);
        }
        if after.is_empty() {
            return self.span(DiffKind::Delete, before);
        }
        match self.replacements {
            Replacements::Update => {
                let diff = self.doc.append_new(
                    self.paragraph,
                    NodeKind::Diff {
                        kind: DiffKind::Update,
                    },
                )?;
                for (side, content) in [(Side::Before, before), (Side::After, after)] {
                    let container = self.doc.create(NodeKind::Container { side });
                    self.doc.append_to_slot(diff, container, side)?;
                    self.fill(container, content)?;
                }
                self.kinds.push(DiffKind::Update);
                Ok(())
            }
            Replacements::DeleteInsert => {
                self.span(DiffKind::Delete, before)?;
                self.span(DiffKind::Insert, after)
            }
        }
    }

    /// Word or sentence diff of two texts carrying the same marks.
    fn text_diff(
        &mut self,
        old: &str,
        new: &str,
        marks: Marks,
        granularity: Granularity,
    ) -> TreeResult<()> {
        match granularity {
            Granularity::Word => {
                let diff = TextDiff::configure()
                    .algorithm(Algorithm::Myers)
                    .diff_words(old, new);
                self.ops(&diff, marks)
            }
            Granularity::Sentence => {
                let old_sentences = sentences(old);
                let new_sentences = sentences(new);
                let diff = TextDiff::configure()
                    .algorithm(Algorithm::Myers)
                    .diff_slices(&old_sentences, &new_sentences);
                self.ops(&diff, marks)
            }
        }
    }

    fn ops(&mut self, diff: &TextDiff<'_, '_, '_, str>, marks: Marks) -> TreeResult<()> {
        let old = diff.old_slices();
        let new = diff.new_slices();
        let mut pending: Option<(String, String)> = None;
        for op in diff.ops() {
            let (tag, o, n) = op.as_tag_tuple();
            if tag != DiffTag::Equal {
                let (before, after) = pending.get_or_insert_with(Default::default);
                before.push_str(&old[o].concat());
                after.push_str(&new[n].concat());
                continue;
            }
            if let Some((before, after)) = pending.take() {
                self.replace(Content::Text(&before, marks), Content::Text(&after, marks))?;
            }
            let paragraph = self.paragraph;
            self.fill(paragraph, Content::Text(&old[o].concat(), marks))?;
        }
        if let Some((before, after)) = pending {
            self.replace(Content::Text(&before, marks), Content::Text(&after, marks))?;
        }
        Ok(())
    }
}

/// Split text after sentence punctuation, trailing whitespace kept with
/// the sentence it follows.
pub(crate) fn sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let ends = matches!(bytes[i], b'.' | b'!' | b'?')
            && bytes.get(i + 1).is_some_and(u8::is_ascii_whitespace);
        if !ends {
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < bytes.len() && bytes[end].is_ascii_whitespace() {
            end += 1;
        }
        out.push(&text[start..end]);
        start = end;
        i = end;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}
