//! The document arena and its explicit edge-rewrite operations.
//!
//! [`Document`] stores nodes in a [`HashMap`] keyed by [`NodeId`]. Each node
//! records its parent and its ordered children; every structural change goes
//! through one of the edge operations below so that both directions of an
//! edge are always updated together.
//!
//! # Invariants
//!
//! - The root exists, has kind [`NodeKind::Root`] and never has a parent.
//! - A node appears in at most one parent's child list, and its `parent`
//!   field names that parent.
//! - Ids are never reused; removed nodes are gone from the arena.
//!
//! Structural well-formedness (block vs. inline placement, update slots) is
//! not enforced here; [`validate`](crate::validate) checks it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};
use crate::id::NodeId;
use crate::node::{DiffInfo, Node, NodeCategory, NodeKind, Placement, Side};

/// An ordered document tree stored as an arena of nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding only the root node.
    pub fn new() -> Self {
        let root = NodeId::from_raw(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(root, NodeKind::Root));
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena, including detached ones and the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the root has no children.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&id).map(|n| &n.kind)
    }

    /// Mutable access to a node's kind. Edges are not reachable this way.
    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.nodes.get_mut(&id).map(|n| &mut n.kind)
    }

    /// Children of a node; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn slot(&self, id: NodeId) -> Option<Side> {
        self.nodes.get(&id).and_then(|n| n.slot)
    }

    /// Position of a node in its parent's child list.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Returns `true` if the node exists and is reachable from the root.
    pub fn is_live(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    // ---------------------------------------------------------------
    // Edge rewrites
    // ---------------------------------------------------------------

    /// Allocate a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id, kind));
        id
    }

    /// Allocate a node and append it under `parent`.
    pub fn append_new(&mut self, parent: NodeId, kind: NodeKind) -> TreeResult<NodeId> {
        if !self.contains(parent) {
            return Err(TreeError::NodeNotFound(parent));
        }
        let id = self.create(kind);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    /// Append a detached node to one slot of an update diff.
    pub fn append_to_slot(&mut self, parent: NodeId, child: NodeId, side: Side) -> TreeResult<()> {
        self.append_child(parent, child)?;
        if let Some(node) = self.nodes.get_mut(&child) {
            node.slot = Some(side);
        }
        Ok(())
    }

    /// Insert a detached node at `index` in `parent`'s child list.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> TreeResult<()> {
        self.check_attachable(parent, child)?;
        let len = self.children(parent).len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds { parent, index, len });
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.insert(index, child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
        Ok(())
    }

    /// Insert a detached node immediately after `sibling`, in the same
    /// update slot.
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) -> TreeResult<()> {
        let parent = self.parent(sibling).ok_or(TreeError::Detached(sibling))?;
        let index = self
            .index_in_parent(sibling)
            .ok_or(TreeError::Detached(sibling))?;
        let slot = self.slot(sibling);
        self.insert_child(parent, index + 1, node)?;
        self.set_slot(node, slot);
        Ok(())
    }

    /// Detach a node from its parent. Detaching a detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) -> TreeResult<()> {
        if id == self.root {
            return Err(TreeError::RootImmutable(id));
        }
        let parent = match self.nodes.get(&id) {
            Some(node) => node.parent,
            None => return Err(TreeError::NodeNotFound(id)),
        };
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
            node.slot = None;
        }
        Ok(())
    }

    /// Detach every child of `parent` from index `at` onwards, in order.
    pub fn split_off_children(&mut self, parent: NodeId, at: usize) -> TreeResult<Vec<NodeId>> {
        let children = self.children(parent).to_vec();
        if !self.contains(parent) {
            return Err(TreeError::NodeNotFound(parent));
        }
        if at > children.len() {
            return Err(TreeError::IndexOutOfBounds {
                parent,
                index: at,
                len: children.len(),
            });
        }
        let tail = children[at..].to_vec();
        for id in &tail {
            self.detach(*id)?;
        }
        Ok(tail)
    }

    /// Replace `id` in its parent by the given detached nodes, in order.
    /// The replacements take over the update slot of `id`.
    ///
    /// `id` ends up detached (its subtree stays in the arena).
    pub fn replace_with(&mut self, id: NodeId, replacements: &[NodeId]) -> TreeResult<()> {
        let parent = self.parent(id).ok_or(TreeError::Detached(id))?;
        let index = self.index_in_parent(id).ok_or(TreeError::Detached(id))?;
        for r in replacements {
            self.check_attachable(parent, *r)?;
        }
        let slot = self.slot(id);
        self.detach(id)?;
        for (offset, r) in replacements.iter().enumerate() {
            self.insert_child(parent, index + offset, *r)?;
            self.set_slot(*r, slot);
        }
        Ok(())
    }

    fn set_slot(&mut self, id: NodeId, slot: Option<Side>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.slot = slot;
        }
    }

    /// Detach a node and drop it together with all its descendants.
    ///
    /// Returns the number of nodes removed from the arena.
    pub fn remove_subtree(&mut self, id: NodeId) -> TreeResult<usize> {
        self.detach(id)?;
        let mut doomed = vec![id];
        doomed.extend(self.descendants(id));
        for d in &doomed {
            self.nodes.remove(d);
        }
        Ok(doomed.len())
    }

    /// Copy the subtree at `id` of another document and append it under
    /// `parent`. Update slots below the copied root are kept.
    pub fn graft(&mut self, parent: NodeId, source: &Document, id: NodeId) -> TreeResult<NodeId> {
        let kind = source.kind(id).cloned().ok_or(TreeError::NodeNotFound(id))?;
        let copy = self.create(kind);
        self.append_child(parent, copy)?;
        for &child in source.children(id) {
            let grafted = self.graft(copy, source, child)?;
            self.set_slot(grafted, source.slot(child));
        }
        Ok(copy)
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        if !self.contains(parent) {
            return Err(TreeError::NodeNotFound(parent));
        }
        let node = self.nodes.get(&child).ok_or(TreeError::NodeNotFound(child))?;
        if child == self.root {
            return Err(TreeError::RootImmutable(child));
        }
        if node.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Traversal
    // ---------------------------------------------------------------

    /// Pre-order (document order) traversal of the live tree, root first.
    pub fn pre_order(&self) -> Vec<NodeId> {
        self.pre_order_from(self.root)
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` first.
    pub fn pre_order_from(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        result
    }

    /// Post-order traversal of the live tree: children before parents,
    /// siblings left to right.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![(self.root, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                result.push(current);
                continue;
            }
            stack.push((current, true));
            for child in self.children(current).iter().rev() {
                stack.push((*child, false));
            }
        }
        result
    }

    /// All descendants of `id`, excluding `id`, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut all = self.pre_order_from(id);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    // ---------------------------------------------------------------
    // Classification
    // ---------------------------------------------------------------

    /// Returns `true` if any descendant of `id` is a block node.
    pub fn has_block_descendant(&self, id: NodeId) -> bool {
        self.descendants(id).into_iter().any(|d| {
            self.kind(d)
                .is_some_and(|k| k.category() == NodeCategory::Block)
        })
    }

    /// Placement mode of a diff node; `None` for other nodes.
    pub fn placement(&self, id: NodeId) -> Option<Placement> {
        match self.kind(id)? {
            NodeKind::Diff { .. } => Some(if self.has_block_descendant(id) {
                Placement::Block
            } else {
                Placement::Inline
            }),
            _ => None,
        }
    }

    /// Returns `true` if the node occupies a block position when placed.
    pub fn is_block(&self, id: NodeId) -> bool {
        match self.kind(id).map(NodeKind::category) {
            Some(NodeCategory::Block) => true,
            Some(NodeCategory::Inline) | None => false,
            Some(NodeCategory::Diff) => self.has_block_descendant(id),
        }
    }

    /// Returns `true` if `child` may legally sit directly under `parent`.
    pub fn accepts(&self, parent: NodeId, child: NodeId) -> bool {
        let (Some(parent_kind), Some(child_kind)) = (self.kind(parent), self.kind(child)) else {
            return false;
        };
        match parent_kind {
            NodeKind::Root => self.is_block(child) && !matches!(child_kind, NodeKind::ListItem),
            NodeKind::Diff { .. } => true,
            NodeKind::List { .. } => matches!(child_kind, NodeKind::ListItem),
            NodeKind::ListItem => {
                !self.is_block(child) || matches!(child_kind, NodeKind::List { .. })
            }
            NodeKind::Heading { .. }
            | NodeKind::Paragraph
            | NodeKind::Quote
            | NodeKind::Link { .. }
            | NodeKind::Container { .. } => !self.is_block(child),
            NodeKind::CodeBlock { .. }
            | NodeKind::HorizontalRule
            | NodeKind::Text { .. }
            | NodeKind::LineBreak => false,
        }
    }

    /// Every live diff node in document order.
    pub fn diffs(&self) -> Vec<DiffInfo> {
        self.pre_order()
            .into_iter()
            .filter_map(|id| self.diff_info(id))
            .collect()
    }

    /// Identifier, kind and placement of a diff node.
    pub fn diff_info(&self, id: NodeId) -> Option<DiffInfo> {
        let kind = self.kind(id)?.diff_kind()?;
        let placement = self.placement(id)?;
        Some(DiffInfo { id, kind, placement })
    }

    /// Children of an update diff occupying the given slot.
    pub fn slot_children(&self, update: NodeId, side: Side) -> Vec<NodeId> {
        self.children(update)
            .iter()
            .copied()
            .filter(|c| self.slot(*c) == Some(side))
            .collect()
    }

    /// Content of one update slot with container wrappers unwrapped.
    pub fn slot_content(&self, update: NodeId, side: Side) -> Vec<NodeId> {
        let mut content = Vec::new();
        for child in self.slot_children(update, side) {
            match self.kind(child) {
                Some(NodeKind::Container { .. }) => {
                    content.extend_from_slice(self.children(child));
                }
                _ => content.push(child),
            }
        }
        content
    }

    // ---------------------------------------------------------------
    // Normalization helpers
    // ---------------------------------------------------------------

    /// Merge adjacent text runs with identical marks under `parent`.
    ///
    /// Returns the number of runs merged away.
    pub fn merge_adjacent_text(&mut self, parent: NodeId) -> usize {
        let children = self.children(parent).to_vec();
        let mut merged = 0;
        let mut anchor: Option<NodeId> = None;
        for child in children {
            let Some(NodeKind::Text { text, marks }) = self.kind(child).cloned() else {
                anchor = None;
                continue;
            };
            let target = anchor.filter(|a| {
                matches!(self.kind(*a), Some(NodeKind::Text { marks: m, .. }) if *m == marks)
            });
            match target {
                Some(a) => {
                    if let Some(NodeKind::Text { text: existing, .. }) = self.kind_mut(a) {
                        existing.push_str(&text);
                    }
                    if self.remove_subtree(child).is_ok() {
                        merged += 1;
                    }
                }
                None => anchor = Some(child),
            }
        }
        merged
    }

    /// Concatenated text of a subtree: text runs, line breaks and code.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.pre_order_from(id) {
            match self.kind(node) {
                Some(NodeKind::Text { text, .. }) => out.push_str(text),
                Some(NodeKind::LineBreak) => out.push('\n'),
                Some(NodeKind::CodeBlock { code, .. }) => out.push_str(code),
                _ => {}
            }
        }
        out
    }

    // ---------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------

    /// Id-free nested snapshot of a subtree, for structural comparison.
    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.get(id)?;
        Some(NodeSnapshot {
            kind: node.kind.clone(),
            slot: node.slot,
            children: node
                .children
                .iter()
                .filter_map(|c| self.snapshot(*c))
                .collect(),
        })
    }

    /// Returns `true` if both documents have the same shape and content,
    /// ignoring node ids.
    pub fn structurally_eq(&self, other: &Document) -> bool {
        self.snapshot(self.root) == other.snapshot(other.root)
    }

    /// Run the structural validation pass over the whole tree.
    pub fn validate(&self) -> crate::ValidationReport {
        crate::validate(self)
    }
}

/// Id-free nested view of a subtree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Side>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{DiffKind, Marks};

    fn paragraph_with(doc: &mut Document, texts: &[&str]) -> NodeId {
        let p = doc.append_new(doc.root(), NodeKind::Paragraph).unwrap();
        for t in texts {
            doc.append_new(p, NodeKind::text(*t)).unwrap();
        }
        p
    }

    #[test]
    fn new_document_has_only_root() {
        let doc = Document::new();
        assert_eq!(doc.len(), 1);
        assert!(doc.is_empty());
        assert_eq!(doc.kind(doc.root()), Some(&NodeKind::Root));
    }

    #[test]
    fn append_sets_both_edge_directions() {
        let mut doc = Document::new();
        let p = paragraph_with(&mut doc, &["a"]);
        let text = doc.children(p)[0];
        assert_eq!(doc.parent(text), Some(p));
        assert_eq!(doc.parent(p), Some(doc.root()));
        assert!(doc.is_live(text));
    }

    #[test]
    fn attaching_an_attached_node_fails() {
        let mut doc = Document::new();
        let p = paragraph_with(&mut doc, &["a"]);
        let text = doc.children(p)[0];
        let err = doc.append_child(doc.root(), text).unwrap_err();
        assert_eq!(err, TreeError::AlreadyAttached(text));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut doc = Document::new();
        let p = paragraph_with(&mut doc, &[]);
        let link = doc.append_new(p, NodeKind::Link { url: "u".into() }).unwrap();
        doc.detach(p).unwrap();
        let err = doc.append_child(link, p).unwrap_err();
        assert_eq!(err, TreeError::Cycle { parent: link, child: p });
    }

    #[test]
    fn root_cannot_be_detached() {
        let mut doc = Document::new();
        let root = doc.root();
        assert_eq!(doc.detach(root), Err(TreeError::RootImmutable(root)));
    }

    #[test]
    fn detach_twice_is_a_noop() {
        let mut doc = Document::new();
        let p = paragraph_with(&mut doc, &["a"]);
        doc.detach(p).unwrap();
        doc.detach(p).unwrap();
        assert!(doc.is_empty());
        assert!(!doc.is_live(p));
    }

    #[test]
    fn remove_subtree_drops_descendants() {
        let mut doc = Document::new();
        let p = paragraph_with(&mut doc, &["a", "b"]);
        let removed = doc.remove_subtree(p).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(doc.len(), 1);
        assert!(!doc.contains(p));
    }

    #[test]
    fn replace_with_keeps_position() {
        let mut doc = Document::new();
        let first = paragraph_with(&mut doc, &["1"]);
        let middle = paragraph_with(&mut doc, &["2"]);
        let last = paragraph_with(&mut doc, &["3"]);
        let a = doc.create(NodeKind::HorizontalRule);
        let b = doc.create(NodeKind::HorizontalRule);
        doc.replace_with(middle, &[a, b]).unwrap();
        assert_eq!(doc.children(doc.root()), &[first, a, b, last]);
        assert!(!doc.is_live(middle));
    }

    #[test]
    fn inserted_siblings_share_the_update_slot() {
        let mut doc = Document::new();
        let update = doc
            .append_new(doc.root(), NodeKind::Diff { kind: DiffKind::Update })
            .unwrap();
        let before = doc.create(NodeKind::Paragraph);
        doc.append_to_slot(update, before, Side::Before).unwrap();
        let next = doc.create(NodeKind::HorizontalRule);
        doc.insert_after(before, next).unwrap();
        assert_eq!(doc.slot(next), Some(Side::Before));

        let replacement = doc.create(NodeKind::Quote);
        doc.replace_with(before, &[replacement]).unwrap();
        assert_eq!(doc.slot_children(update, Side::Before), vec![replacement, next]);
    }

    #[test]
    fn split_off_children_detaches_tail() {
        let mut doc = Document::new();
        let p = paragraph_with(&mut doc, &["a", "b", "c"]);
        let tail = doc.split_off_children(p, 1).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(doc.children(p).len(), 1);
        assert!(tail.iter().all(|t| doc.parent(*t).is_none()));
    }

    #[test]
    fn post_order_visits_children_first() {
        let mut doc = Document::new();
        let p = paragraph_with(&mut doc, &["a"]);
        let text = doc.children(p)[0];
        let order = doc.post_order();
        assert_eq!(order, vec![text, p, doc.root()]);
    }

    #[test]
    fn diff_placement_is_derived_from_descendants() {
        let mut doc = Document::new();
        let p = paragraph_with(&mut doc, &[]);
        let diff = doc
            .append_new(p, NodeKind::Diff { kind: DiffKind::Insert })
            .unwrap();
        doc.append_new(diff, NodeKind::text("x")).unwrap();
        assert_eq!(doc.placement(diff), Some(Placement::Inline));
        assert!(doc.accepts(p, diff));

        doc.append_new(diff, NodeKind::Heading { level: 1 }).unwrap();
        assert_eq!(doc.placement(diff), Some(Placement::Block));
        assert!(!doc.accepts(p, diff));
        assert!(doc.accepts(doc.root(), diff));
    }

    #[test]
    fn slot_content_unwraps_containers() {
        let mut doc = Document::new();
        let update = doc
            .append_new(doc.root(), NodeKind::Diff { kind: DiffKind::Update })
            .unwrap();
        let before = doc.create(NodeKind::Container { side: Side::Before });
        doc.append_to_slot(update, before, Side::Before).unwrap();
        let old = doc.append_new(before, NodeKind::text("old")).unwrap();
        let heading = doc.create(NodeKind::Heading { level: 2 });
        doc.append_to_slot(update, heading, Side::After).unwrap();

        assert_eq!(doc.slot_content(update, Side::Before), vec![old]);
        assert_eq!(doc.slot_content(update, Side::After), vec![heading]);
        assert_eq!(doc.slot(heading), Some(Side::After));
    }

    #[test]
    fn merge_adjacent_text_respects_marks() {
        let mut doc = Document::new();
        let p = paragraph_with(&mut doc, &["a", "b"]);
        doc.append_new(p, NodeKind::marked_text("c", Marks::default().with_bold()))
            .unwrap();
        doc.append_new(p, NodeKind::text("d")).unwrap();
        let merged = doc.merge_adjacent_text(p);
        assert_eq!(merged, 1);
        assert_eq!(doc.children(p).len(), 3);
        assert_eq!(doc.text_content(p), "abcd");
    }

    #[test]
    fn structural_equality_ignores_ids() {
        let mut a = Document::new();
        paragraph_with(&mut a, &["x"]);
        let mut b = Document::new();
        b.create(NodeKind::HorizontalRule);
        paragraph_with(&mut b, &["x"]);
        assert!(a.structurally_eq(&b));

        paragraph_with(&mut b, &["y"]);
        assert!(!a.structurally_eq(&b));
    }

    #[test]
    fn diffs_are_listed_in_document_order() {
        let mut doc = Document::new();
        let p = paragraph_with(&mut doc, &["a"]);
        let d1 = doc.append_new(p, NodeKind::Diff { kind: DiffKind::Delete }).unwrap();
        let d2 = doc
            .append_new(doc.root(), NodeKind::Diff { kind: DiffKind::Insert })
            .unwrap();
        let ids: Vec<_> = doc.diffs().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![d1, d2]);
    }

    #[test]
    fn graft_copies_subtrees_between_documents() {
        let mut source = Document::new();
        let p = source.append_new(source.root(), NodeKind::Paragraph).unwrap();
        let update = source
            .append_new(p, NodeKind::Diff { kind: DiffKind::Update })
            .unwrap();
        for (side, text) in [(Side::Before, "old"), (Side::After, "new")] {
            let c = source.create(NodeKind::Container { side });
            source.append_to_slot(update, c, side).unwrap();
            source.append_new(c, NodeKind::text(text)).unwrap();
        }

        let mut target = Document::new();
        let q = target.append_new(target.root(), NodeKind::Paragraph).unwrap();
        let copy = target.graft(q, &source, update).unwrap();
        assert_eq!(target.slot(copy), None);
        assert_eq!(target.snapshot(copy), source.snapshot(update));
        assert_eq!(target.slot_children(copy, Side::After).len(), 1);
        assert!(target.graft(q, &source, NodeId::from_raw(999)).is_err());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn merging_runs_preserves_text(runs in proptest::collection::vec(("[a-z ]{0,6}", any::<bool>()), 0..12)) {
                let mut doc = Document::new();
                let p = doc.append_new(doc.root(), NodeKind::Paragraph).unwrap();
                for (text, bold) in &runs {
                    let marks = if *bold { Marks::default().with_bold() } else { Marks::default() };
                    doc.append_new(p, NodeKind::marked_text(text.clone(), marks)).unwrap();
                }
                let before = doc.text_content(p);
                doc.merge_adjacent_text(p);
                prop_assert_eq!(doc.text_content(p), before);

                let children = doc.children(p).to_vec();
                for pair in children.windows(2) {
                    let a = doc.kind(pair[0]).cloned();
                    let b = doc.kind(pair[1]).cloned();
                    if let (Some(NodeKind::Text { marks: ma, .. }), Some(NodeKind::Text { marks: mb, .. })) = (a, b) {
                        prop_assert_ne!(ma, mb);
                    }
                }
            }
        }
    }
}
