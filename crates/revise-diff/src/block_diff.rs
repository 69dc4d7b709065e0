//! Block alignment over the top-level children of two documents.

use revise_export::{list_marker, render_block};
use revise_types::{DiffKind, Document, NodeId, NodeKind, TreeResult};

use crate::inline_diff::{segments, InlineDiffer, InlineMarkup, Segment};
use crate::options::Replacements;
use crate::spans::SpanWriter;

enum ItemPlan {
    /// Unchanged item, rendered with a bullet marker.
    Same(String),
    Changed(NodeId, NodeId),
}

pub(crate) struct BlockDiffer<'a> {
    pub(crate) inline: InlineDiffer<'a>,
}

impl<'a> BlockDiffer<'a> {
    fn before(&self) -> &'a Document {
        self.inline.before
    }

    fn after(&self) -> &'a Document {
        self.inline.after
    }

    /// Diff the root blocks, one string per output block.
    pub(crate) fn diff(&self, spans: &mut SpanWriter) -> Vec<String> {
        let (old, old_keys) = keyed_blocks(self.before());
        let (new, new_keys) = keyed_blocks(self.after());

        let mut out = Vec::new();
        for segment in segments(&old_keys, &new_keys) {
            match segment {
                Segment::Equal(range) => out.extend_from_slice(&old_keys[range]),
                Segment::Changed(o, n) => {
                    let paired = o.len().min(n.len());
                    for k in 0..paired {
                        out.extend(self.pair(old[o.start + k], new[n.start + k], spans));
                    }
                    if o.len() > paired {
                        out.push(spans.block(DiffKind::Delete, &old_keys[o.start + paired..o.end]));
                    }
                    if n.len() > paired {
                        out.push(spans.block(DiffKind::Insert, &new_keys[n.start + paired..n.end]));
                    }
                }
            }
        }
        out
    }

    /// Markup for a changed pair of blocks.
    fn pair(&self, old: NodeId, new: NodeId, spans: &mut SpanWriter) -> Vec<String> {
        let (before, after) = (self.before(), self.after());
        match self.merged(old, new, spans.replacements()) {
            Ok(Some(merged)) => {
                spans.record(&merged.kinds);
                vec![merged.markup]
            }
            // A tree that cannot be assembled is replaced whole.
            Ok(None) | Err(_) => {
                spans.block_replace(&render_block(before, old), &render_block(after, new))
            }
        }
    }

    /// Inline diff of two blocks of the same shape; `None` for any other
    /// pair.
    fn merged(
        &self,
        old: NodeId,
        new: NodeId,
        replacements: Replacements,
    ) -> TreeResult<Option<InlineMarkup>> {
        let (before, after) = (self.before(), self.after());
        let old_children = before.children(old);
        let new_children = after.children(new);
        let inline = |prefix: &str| -> TreeResult<Option<InlineMarkup>> {
            let diff = self.inline.diff(old_children, new_children, replacements)?;
            Ok(Some(InlineMarkup {
                markup: format!("{prefix}{}", diff.markup),
                kinds: diff.kinds,
            }))
        };
        match (before.kind(old), after.kind(new)) {
            (Some(NodeKind::Heading { level: a }), Some(NodeKind::Heading { level: b }))
                if a == b =>
            {
                inline(&format!("{} ", "#".repeat(*a as usize)))
            }
            (Some(NodeKind::Paragraph), Some(NodeKind::Paragraph)) => inline(""),
            (Some(NodeKind::Quote), Some(NodeKind::Quote)) => {
                let diff = self.inline.diff(old_children, new_children, replacements)?;
                Ok(Some(InlineMarkup {
                    markup: format!("> {}", diff.markup.replace('\n', "\n> ")),
                    kinds: diff.kinds,
                }))
            }
            (
                Some(NodeKind::List {
                    ordered: oa,
                    start: sa,
                }),
                Some(NodeKind::List {
                    ordered: ob,
                    start: sb,
                }),
            ) if oa == ob && sa == sb => self.list(old, new, *oa, *sa, replacements),
            _ => Ok(None),
        }
    }

    /// Item-by-item diff of two lists of the same shape. `None` when the
    /// item counts differ or a changed item holds a nested list.
    fn list(
        &self,
        old: NodeId,
        new: NodeId,
        ordered: bool,
        start: u64,
        replacements: Replacements,
    ) -> TreeResult<Option<InlineMarkup>> {
        let (before, after) = (self.before(), self.after());
        let old_items = before.children(old);
        let new_items = after.children(new);
        let is_item = |doc: &Document, id: &NodeId| matches!(doc.kind(*id), Some(NodeKind::ListItem));
        if old_items.len() != new_items.len()
            || !old_items.iter().all(|id| is_item(before, id))
            || !new_items.iter().all(|id| is_item(after, id))
        {
            return Ok(None);
        }

        let mut plan = Vec::with_capacity(old_items.len());
        for (&o, &n) in old_items.iter().zip(new_items) {
            let rendered = render_block(before, o);
            if rendered == render_block(after, n) {
                plan.push(ItemPlan::Same(rendered));
                continue;
            }
            let nested = |doc: &Document, id: NodeId| {
                doc.children(id).iter().any(|c| doc.is_block(*c))
            };
            if nested(before, o) || nested(after, n) {
                return Ok(None);
            }
            plan.push(ItemPlan::Changed(o, n));
        }

        let mut lines = Vec::with_capacity(plan.len());
        let mut kinds = Vec::new();
        for (index, entry) in plan.into_iter().enumerate() {
            let marker = list_marker(ordered, start, index);
            match entry {
                ItemPlan::Same(rendered) => {
                    let body = rendered
                        .strip_prefix("- ")
                        .or_else(|| rendered.strip_prefix('-'))
                        .unwrap_or(&rendered);
                    if body.is_empty() {
                        lines.push(marker.trim_end().to_string());
                    } else {
                        lines.push(format!("{marker}{body}"));
                    }
                }
                ItemPlan::Changed(o, n) => {
                    let diff = self
                        .inline
                        .diff(before.children(o), after.children(n), replacements)?;
                    lines.push(format!("{marker}{}", diff.markup.replace('\n', "\n  ")));
                    kinds.extend(diff.kinds);
                }
            }
        }
        Ok(Some(InlineMarkup {
            markup: lines.join("\n"),
            kinds,
        }))
    }
}

/// Root blocks that render to something, with their rendered markup as
/// alignment keys.
fn keyed_blocks(doc: &Document) -> (Vec<NodeId>, Vec<String>) {
    doc.children(doc.root())
        .iter()
        .filter_map(|&id| {
            let rendered = render_block(doc, id);
            (!rendered.is_empty()).then_some((id, rendered))
        })
        .unzip()
}
