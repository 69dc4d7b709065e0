//! Accept and reject: collapse a diff node to the content one side keeps.

use revise_types::{
    Decision, DiffKind, Document, EngineEvent, EngineObserver, NodeId, NodeKind, Side,
};
use serde::{Deserialize, Serialize};

use crate::error::{PatchError, PatchResult};

/// What a single resolution did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub id: NodeId,
    pub kind: DiffKind,
    pub decision: Decision,
    /// Nodes that took the diff's place, in order.
    pub kept: Vec<NodeId>,
}

/// Outcome of a bulk resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Diffs resolved, in the order they were visited.
    pub resolved: Vec<NodeId>,
    /// Diffs that vanished with an earlier discarded subtree.
    pub skipped: Vec<NodeId>,
    /// Diffs left in place because they failed validation.
    pub failed: Vec<NodeId>,
}

impl ResolutionReport {
    /// Returns `true` if every visited diff was resolved or skipped.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Accept a diff: keep its after side.
pub fn accept(
    doc: &mut Document,
    id: NodeId,
    observer: &dyn EngineObserver,
) -> PatchResult<Resolution> {
    resolve(doc, id, Decision::Accept, observer)
}

/// Reject a diff: keep its before side.
pub fn reject(
    doc: &mut Document,
    id: NodeId,
    observer: &dyn EngineObserver,
) -> PatchResult<Resolution> {
    resolve(doc, id, Decision::Reject, observer)
}

/// Replace a diff node by the content the decision keeps.
///
/// The node is validated before anything is touched, so an error leaves the
/// document unchanged.
pub fn resolve(
    doc: &mut Document,
    id: NodeId,
    decision: Decision,
    observer: &dyn EngineObserver,
) -> PatchResult<Resolution> {
    let kind = check(doc, id)?;
    let parent = doc.parent(id).ok_or(PatchError::UnknownNode(id))?;

    let kept_ids = match (kind, decision) {
        (DiffKind::Insert, Decision::Accept) | (DiffKind::Delete, Decision::Reject) => {
            doc.children(id).to_vec()
        }
        (DiffKind::Insert, Decision::Reject) | (DiffKind::Delete, Decision::Accept) => Vec::new(),
        (DiffKind::Update, _) => doc.slot_content(id, decision.kept_side()),
    };
    for kept in &kept_ids {
        doc.detach(*kept)?;
    }
    doc.replace_with(id, &kept_ids)?;
    doc.remove_subtree(id)?;

    let mut kept = Vec::with_capacity(kept_ids.len());
    for node in kept_ids {
        if is_empty_paragraph(doc, node) && doc.slot(node).is_none() {
            doc.remove_subtree(node)?;
        } else {
            kept.push(node);
        }
    }
    tidy(doc, parent)?;

    observer.on_event(&EngineEvent::DiffResolved {
        id,
        kind,
        decision,
        kept: kept.len(),
    });
    Ok(Resolution {
        id,
        kind,
        decision,
        kept,
    })
}

/// Accept every diff in the document.
pub fn accept_all(doc: &mut Document, observer: &dyn EngineObserver) -> ResolutionReport {
    resolve_all(doc, Decision::Accept, observer)
}

/// Reject every diff in the document.
pub fn reject_all(doc: &mut Document, observer: &dyn EngineObserver) -> ResolutionReport {
    resolve_all(doc, Decision::Reject, observer)
}

/// Resolve every diff in pre-order with the same decision.
///
/// Diffs inside a discarded subtree disappear with it and are reported as
/// skipped. Diffs that fail validation stay in place.
pub fn resolve_all(
    doc: &mut Document,
    decision: Decision,
    observer: &dyn EngineObserver,
) -> ResolutionReport {
    let mut report = ResolutionReport::default();
    let targets: Vec<NodeId> = doc.diffs().into_iter().map(|info| info.id).collect();
    for id in targets {
        if !doc.contains(id) || !doc.is_live(id) {
            observer.on_event(&EngineEvent::ResolutionSkipped { id });
            report.skipped.push(id);
            continue;
        }
        match resolve(doc, id, decision, observer) {
            Ok(_) => report.resolved.push(id),
            Err(_) => report.failed.push(id),
        }
    }
    report
}

/// Validate a resolution target and return its diff kind.
fn check(doc: &Document, id: NodeId) -> PatchResult<DiffKind> {
    if !doc.contains(id) || !doc.is_live(id) || id == doc.root() {
        return Err(PatchError::UnknownNode(id));
    }
    let kind = doc.kind(id).ok_or(PatchError::UnknownNode(id))?;
    let Some(diff_kind) = kind.diff_kind() else {
        return Err(PatchError::NotADiff {
            id,
            kind: kind.name(),
        });
    };
    if diff_kind == DiffKind::Update && !well_formed_update(doc, id) {
        return Err(PatchError::MalformedUpdate(id));
    }
    Ok(diff_kind)
}

fn well_formed_update(doc: &Document, id: NodeId) -> bool {
    let unslotted = doc.children(id).iter().any(|c| doc.slot(*c).is_none());
    !unslotted
        && !doc.slot_children(id, Side::Before).is_empty()
        && !doc.slot_children(id, Side::After).is_empty()
}

fn is_empty_paragraph(doc: &Document, id: NodeId) -> bool {
    matches!(doc.kind(id), Some(NodeKind::Paragraph)) && doc.children(id).is_empty()
}

/// Merge text runs around the resolved diff and drop paragraphs or links
/// it left empty, walking up while that empties the next parent too.
fn tidy(doc: &mut Document, parent: NodeId) -> PatchResult<()> {
    let mut current = parent;
    loop {
        doc.merge_adjacent_text(current);
        let emptied = matches!(
            doc.kind(current),
            Some(NodeKind::Paragraph | NodeKind::Link { .. })
        ) && doc.children(current).is_empty()
            && doc.slot(current).is_none();
        if !emptied {
            return Ok(());
        }
        let Some(up) = doc.parent(current) else {
            return Ok(());
        };
        doc.remove_subtree(current)?;
        current = up;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revise_export::{export, render};
    use revise_import::{import, ImportOptions};
    use revise_types::{validate, NoopObserver, RecordingObserver};

    fn doc(text: &str) -> Document {
        import(text, &ImportOptions::default(), &NoopObserver)
    }

    fn diff_ids(doc: &Document) -> Vec<NodeId> {
        doc.diffs().into_iter().map(|d| d.id).collect()
    }

    // ---- 1. Single resolution ----

    #[test]
    fn accepting_an_insert_keeps_its_content() {
        let mut d = doc("The {++new++} fact");
        let id = diff_ids(&d)[0];
        let resolution = accept(&mut d, id, &NoopObserver).unwrap();
        assert_eq!(resolution.kind, DiffKind::Insert);
        assert_eq!(export(&d), "The new fact");
        assert!(d.diffs().is_empty());
        assert!(validate(&d).is_valid());
    }

    #[test]
    fn rejecting_an_insert_drops_it() {
        let mut d = doc("The {++new ++}fact");
        let id = diff_ids(&d)[0];
        let resolution = reject(&mut d, id, &NoopObserver).unwrap();
        assert!(resolution.kept.is_empty());
        assert_eq!(export(&d), "The fact");
        assert!(!d.contains(id));
    }

    #[test]
    fn update_keeps_one_side_without_containers() {
        let mut d = doc("a {~~old~>new~~} b");
        let id = diff_ids(&d)[0];
        accept(&mut d, id, &NoopObserver).unwrap();
        assert_eq!(export(&d), "a new b");
        let paragraph = d.children(d.root())[0];
        assert_eq!(d.children(paragraph).len(), 1, "runs merged into one");

        let mut d = doc("a {~~old~>new~~} b");
        let id = diff_ids(&d)[0];
        reject(&mut d, id, &NoopObserver).unwrap();
        assert_eq!(export(&d), "a old b");
    }

    #[test]
    fn block_update_swaps_whole_blocks() {
        let mut d = doc("{~~# Old Title~># New Title~~}");
        let id = diff_ids(&d)[0];
        accept(&mut d, id, &NoopObserver).unwrap();
        let heading = d.children(d.root())[0];
        assert_eq!(d.kind(heading), Some(&NodeKind::Heading { level: 1 }));
        assert_eq!(render(&d), "# New Title");
        assert!(validate(&d).is_valid());
    }

    #[test]
    fn emptied_paragraph_is_removed() {
        let mut d = doc("Intro\n\n{--gone--}\n\nOutro");
        let id = diff_ids(&d)[0];
        accept(&mut d, id, &NoopObserver).unwrap();
        assert_eq!(d.children(d.root()).len(), 2);
        assert_eq!(render(&d), "Intro\n\nOutro");
    }

    #[test]
    fn two_deletions_resolved_differently() {
        let mut d = doc("Keep {--one--} and {--two--} here.");
        let ids = diff_ids(&d);
        assert_eq!(ids.len(), 2);
        accept(&mut d, ids[0], &NoopObserver).unwrap();
        reject(&mut d, ids[1], &NoopObserver).unwrap();
        assert_eq!(render(&d), "Keep  and two here.");
    }

    // ---- 2. Failures leave the tree unchanged ----

    #[test]
    fn unknown_and_resolved_ids_are_errors() {
        let mut d = doc("x {++y++}");
        let id = diff_ids(&d)[0];
        let before = export(&d);
        let missing = NodeId::from_raw(9_999);
        assert_eq!(
            accept(&mut d, missing, &NoopObserver),
            Err(PatchError::UnknownNode(missing))
        );
        assert_eq!(export(&d), before);

        accept(&mut d, id, &NoopObserver).unwrap();
        assert_eq!(
            reject(&mut d, id, &NoopObserver),
            Err(PatchError::UnknownNode(id))
        );
    }

    #[test]
    fn non_diff_nodes_are_rejected() {
        let mut d = doc("plain");
        let paragraph = d.children(d.root())[0];
        let err = accept(&mut d, paragraph, &NoopObserver).unwrap_err();
        assert_eq!(
            err,
            PatchError::NotADiff {
                id: paragraph,
                kind: "paragraph"
            }
        );
        let root = d.root();
        assert_eq!(
            accept(&mut d, root, &NoopObserver),
            Err(PatchError::UnknownNode(root))
        );
        assert_eq!(render(&d), "plain");
    }

    #[test]
    fn malformed_update_is_left_alone() {
        let mut d = Document::new();
        let p = d.append_new(d.root(), NodeKind::Paragraph).unwrap();
        let update = d
            .append_new(p, NodeKind::Diff { kind: DiffKind::Update })
            .unwrap();
        let c = d.create(NodeKind::Container { side: Side::Before });
        d.append_to_slot(update, c, Side::Before).unwrap();
        d.append_new(c, NodeKind::text("only")).unwrap();
        assert_eq!(
            accept(&mut d, update, &NoopObserver),
            Err(PatchError::MalformedUpdate(update))
        );
        assert!(d.is_live(update));

        let report = accept_all(&mut d, &NoopObserver);
        assert_eq!(report.failed, vec![update]);
        assert!(!report.is_clean());
    }

    // ---- 3. Bulk resolution ----

    #[test]
    fn accept_all_and_reject_all() {
        let text = "The {--old fact--}{++new fact++} stands.";
        let mut accepted = doc(text);
        let report = accept_all(&mut accepted, &NoopObserver);
        assert_eq!(report.resolved.len(), 2);
        assert_eq!(render(&accepted), "The new fact stands.");

        let mut rejected = doc(text);
        reject_all(&mut rejected, &NoopObserver);
        assert_eq!(render(&rejected), "The old fact stands.");
        assert!(rejected.diffs().is_empty());
    }

    #[test]
    fn resolution_leaves_other_diffs_untouched() {
        let mut d = doc("{++a++} b {~~c~>d~~}");
        let ids = diff_ids(&d);
        let snapshot = d.snapshot(ids[1]);
        reject(&mut d, ids[0], &NoopObserver).unwrap();
        assert_eq!(d.diff_info(ids[1]).map(|i| i.kind), Some(DiffKind::Update));
        assert_eq!(d.snapshot(ids[1]), snapshot);
    }

    #[test]
    fn events_report_each_resolution() {
        let observer = RecordingObserver::new();
        let mut d = doc("{++a++} and {--b--}");
        accept_all(&mut d, &observer);
        assert_eq!(
            observer.count(|e| matches!(e, EngineEvent::DiffResolved { decision: Decision::Accept, .. })),
            2
        );
    }

    #[test]
    fn diffs_inside_discarded_content_are_skipped() {
        // Import never nests diffs, so build the nesting by hand.
        let mut d = Document::new();
        let p = d.append_new(d.root(), NodeKind::Paragraph).unwrap();
        let outer = d
            .append_new(p, NodeKind::Diff { kind: DiffKind::Delete })
            .unwrap();
        let inner = d
            .append_new(outer, NodeKind::Diff { kind: DiffKind::Insert })
            .unwrap();
        d.append_new(inner, NodeKind::text("x")).unwrap();
        d.append_new(p, NodeKind::text("kept")).unwrap();

        let observer = RecordingObserver::new();
        let report = accept_all(&mut d, &observer);
        assert_eq!(report.resolved, vec![outer]);
        assert_eq!(report.skipped, vec![inner]);
        assert_eq!(
            observer.count(|e| matches!(e, EngineEvent::ResolutionSkipped { .. })),
            1
        );
        assert_eq!(render(&d), "kept");
    }
}
