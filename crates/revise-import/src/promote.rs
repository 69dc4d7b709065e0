//! Node promotion.
//!
//! The inline matcher may leave block content where it cannot stay: a diff
//! holding a heading inside a paragraph, a list inside a link. Promotion
//! moves such a node up one level at a time, splitting the parent around it,
//! until its parent accepts it.

use revise_types::{Document, EngineEvent, EngineObserver, NodeId, NodeKind, TreeResult};

/// Returns `true` if `id` is block-level and its parent, other than the
/// root, does not accept it.
pub fn needs_promotion(doc: &Document, id: NodeId) -> bool {
    match doc.parent(id) {
        Some(parent) => parent != doc.root() && doc.is_block(id) && !doc.accepts(parent, id),
        None => false,
    }
}

/// Promote every misplaced node, innermost first, then in document order.
///
/// Each node is promoted until its parent accepts it. The pass repeats until
/// nothing is left to promote or `max_rounds` passes have run. Returns the
/// number of single-level promotions.
pub fn promote_all(doc: &mut Document, max_rounds: usize, observer: &dyn EngineObserver) -> usize {
    let mut promoted = 0;
    for _ in 0..max_rounds {
        let pending: Vec<NodeId> = doc
            .post_order()
            .into_iter()
            .filter(|id| needs_promotion(doc, *id))
            .collect();
        if pending.is_empty() {
            return promoted;
        }
        for id in pending {
            while needs_promotion(doc, id) {
                match promote(doc, id, observer) {
                    Ok(true) => promoted += 1,
                    Ok(false) | Err(_) => break,
                }
            }
        }
    }
    if doc.pre_order().into_iter().any(|id| needs_promotion(doc, id)) {
        observer.on_event(&EngineEvent::PromotionLimitReached { rounds: max_rounds });
    }
    promoted
}

/// Move `id` out of its parent, right after it.
///
/// Siblings after `id` move into a new node of the parent's kind placed
/// after `id`; an ordered list continues its numbering. The parent is
/// removed when nothing is left in it, and line breaks or blanks left at
/// the split edges are trimmed. Returns `Ok(false)` for a detached node or
/// a child of the root.
pub fn promote(doc: &mut Document, id: NodeId, observer: &dyn EngineObserver) -> TreeResult<bool> {
    let Some(parent) = doc.parent(id) else {
        return Ok(false);
    };
    if parent == doc.root() {
        return Ok(false);
    }
    let (Some(parent_kind), Some(index)) = (doc.kind(parent).cloned(), doc.index_in_parent(id))
    else {
        return Ok(false);
    };

    let mut tail = doc.split_off_children(parent, index + 1)?;
    doc.detach(id)?;
    doc.insert_after(parent, id)?;
    trim_end(doc, parent)?;
    trim_start(doc, &mut tail)?;

    let split = !tail.is_empty();
    if split {
        let kind = match parent_kind {
            NodeKind::List { ordered, start } => NodeKind::List {
                ordered,
                start: start + doc.children(parent).len() as u64,
            },
            other => other,
        };
        let rest = doc.create(kind);
        for child in tail {
            doc.append_child(rest, child)?;
        }
        doc.insert_after(id, rest)?;
    }
    if doc.children(parent).is_empty() {
        doc.remove_subtree(parent)?;
    }
    observer.on_event(&EngineEvent::NodePromoted {
        id,
        from: parent,
        split,
    });
    Ok(true)
}

fn trim_end(doc: &mut Document, parent: NodeId) -> TreeResult<()> {
    while let Some(&last) = doc.children(parent).last() {
        match doc.kind_mut(last) {
            Some(NodeKind::LineBreak) => {}
            Some(NodeKind::Text { text, marks }) if !marks.code => {
                let len = text.trim_end().len();
                text.truncate(len);
                if !text.is_empty() {
                    break;
                }
            }
            _ => break,
        }
        doc.remove_subtree(last)?;
    }
    Ok(())
}

fn trim_start(doc: &mut Document, tail: &mut Vec<NodeId>) -> TreeResult<()> {
    while let Some(&first) = tail.first() {
        match doc.kind_mut(first) {
            Some(NodeKind::LineBreak) => {}
            Some(NodeKind::Text { text, marks }) if !marks.code => {
                let trimmed = text.trim_start().to_string();
                *text = trimmed;
                if !text.is_empty() {
                    break;
                }
            }
            _ => break,
        }
        doc.remove_subtree(first)?;
        tail.remove(0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use revise_types::{validate, DiffKind, NoopObserver, RecordingObserver};

    use super::*;

    /// Paragraph "a " <insert holding a heading> " b" under the root.
    fn misplaced_heading() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let p = doc.append_new(doc.root(), NodeKind::Paragraph).unwrap();
        doc.append_new(p, NodeKind::text("a ")).unwrap();
        let diff = doc
            .append_new(p, NodeKind::Diff { kind: DiffKind::Insert })
            .unwrap();
        let h = doc
            .append_new(diff, NodeKind::Heading { level: 1 })
            .unwrap();
        doc.append_new(h, NodeKind::text("H")).unwrap();
        doc.append_new(p, NodeKind::text(" b")).unwrap();
        (doc, p, diff)
    }

    #[test]
    fn block_diff_in_paragraph_needs_promotion() {
        let (doc, p, diff) = misplaced_heading();
        assert!(needs_promotion(&doc, diff));
        assert!(!needs_promotion(&doc, p));
    }

    #[test]
    fn promotion_splits_the_parent() {
        let (mut doc, p, diff) = misplaced_heading();
        let observer = RecordingObserver::new();
        assert!(promote(&mut doc, diff, &observer).unwrap());

        let blocks = doc.children(doc.root()).to_vec();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], p);
        assert_eq!(blocks[1], diff);
        assert_eq!(doc.text_content(blocks[0]), "a");
        assert_eq!(doc.text_content(blocks[2]), "b");
        assert!(validate(&doc).is_valid());
        assert_eq!(
            observer.events(),
            vec![EngineEvent::NodePromoted {
                id: diff,
                from: p,
                split: true
            }]
        );
    }

    #[test]
    fn emptied_parent_is_removed() {
        let mut doc = Document::new();
        let p = doc.append_new(doc.root(), NodeKind::Paragraph).unwrap();
        let diff = doc
            .append_new(p, NodeKind::Diff { kind: DiffKind::Delete })
            .unwrap();
        doc.append_new(diff, NodeKind::HorizontalRule).unwrap();
        promote(&mut doc, diff, &NoopObserver).unwrap();
        assert!(!doc.contains(p));
        assert_eq!(doc.children(doc.root()), &[diff]);
    }

    #[test]
    fn ordered_list_split_keeps_numbering() {
        let mut doc = Document::new();
        let list = doc
            .append_new(doc.root(), NodeKind::List { ordered: true, start: 4 })
            .unwrap();
        let first = doc.append_new(list, NodeKind::ListItem).unwrap();
        doc.append_new(first, NodeKind::text("one")).unwrap();
        let quote = doc.create(NodeKind::Quote);
        doc.append_child(list, quote).unwrap();
        let third = doc.append_new(list, NodeKind::ListItem).unwrap();
        doc.append_new(third, NodeKind::text("three")).unwrap();

        promote_all(&mut doc, 4, &NoopObserver);
        let blocks = doc.children(doc.root()).to_vec();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1], quote);
        assert_eq!(
            doc.kind(blocks[2]),
            Some(&NodeKind::List {
                ordered: true,
                start: 5
            })
        );
    }

    #[test]
    fn nested_misplacement_climbs_to_the_root() {
        let mut doc = Document::new();
        let list = doc
            .append_new(doc.root(), NodeKind::List { ordered: false, start: 1 })
            .unwrap();
        let item = doc.append_new(list, NodeKind::ListItem).unwrap();
        let link = doc
            .append_new(item, NodeKind::Link { url: "u".into() })
            .unwrap();
        let diff = doc
            .append_new(link, NodeKind::Diff { kind: DiffKind::Insert })
            .unwrap();
        doc.append_new(diff, NodeKind::HorizontalRule).unwrap();

        let promoted = promote_all(&mut doc, 8, &NoopObserver);
        assert_eq!(promoted, 3);
        assert_eq!(doc.children(doc.root()), &[diff]);
        assert!(validate(&doc).is_valid());
    }

    #[test]
    fn children_of_the_root_stay_put() {
        let mut doc = Document::new();
        let rule = doc
            .append_new(doc.root(), NodeKind::HorizontalRule)
            .unwrap();
        assert!(!promote(&mut doc, rule, &NoopObserver).unwrap());
        let detached = doc.create(NodeKind::Paragraph);
        assert!(!promote(&mut doc, detached, &NoopObserver).unwrap());
    }

    #[test]
    fn round_limit_is_reported() {
        let (mut doc, _, _) = misplaced_heading();
        let observer = RecordingObserver::new();
        assert_eq!(promote_all(&mut doc, 0, &observer), 0);
        assert_eq!(
            observer.events(),
            vec![EngineEvent::PromotionLimitReached { rounds: 0 }]
        );
    }
}
