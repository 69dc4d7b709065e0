use std::collections::HashSet;

use crate::document::Document;
use crate::id::NodeId;
use crate::node::{DiffKind, NodeKind, Side};

/// Result of a structural validation pass over a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub node_count: usize,
    pub diff_count: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns `true` if any violation of the given kind was found.
    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}

/// A specific well-formedness violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub node: NodeId,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// A child's parent field does not name the node listing it.
    BrokenParentEdge,
    /// A node is listed as a child more than once.
    DuplicateChild,
    /// A child id does not resolve to an arena node.
    DanglingChild,
    /// An inline node sits directly under the root.
    InlineUnderRoot,
    /// A block node sits under a parent that only holds inline content.
    BlockInInline,
    /// A block-placed diff is not a direct child of the root or a diff.
    MisplacedBlockDiff,
    /// An update diff does not populate exactly its two slots.
    MalformedUpdate,
    /// A list holds something other than list items.
    ListChildNotItem,
    /// A leaf node (text, rule, code, line break) has children.
    LeafWithChildren,
}

/// Check the structural invariants of a document.
///
/// Only the live tree (nodes reachable from the root) is inspected.
pub fn validate(doc: &Document) -> ValidationReport {
    let mut violations = Vec::new();
    let mut seen = HashSet::new();
    let mut diff_count = 0;
    let order = doc.pre_order();

    for id in &order {
        let id = *id;
        if !seen.insert(id) {
            violations.push(Violation {
                node: id,
                kind: ViolationKind::DuplicateChild,
                description: format!("{id} is reachable more than once"),
            });
            continue;
        }
        let Some(kind) = doc.kind(id) else {
            violations.push(Violation {
                node: id,
                kind: ViolationKind::DanglingChild,
                description: format!("{id} is listed as a child but missing from the arena"),
            });
            continue;
        };

        for child in doc.children(id) {
            if doc.contains(*child) && doc.parent(*child) != Some(id) {
                violations.push(Violation {
                    node: *child,
                    kind: ViolationKind::BrokenParentEdge,
                    description: format!("{child} is listed under {id} but points elsewhere"),
                });
            }
        }

        check_placement(doc, id, kind, &mut violations);

        if let NodeKind::Diff { kind: diff_kind } = kind {
            diff_count += 1;
            if *diff_kind == DiffKind::Update {
                check_update_slots(doc, id, &mut violations);
            }
        }
    }

    ValidationReport {
        node_count: seen.len(),
        diff_count,
        violations,
    }
}

fn check_placement(doc: &Document, id: NodeId, kind: &NodeKind, out: &mut Vec<Violation>) {
    let children = doc.children(id);
    match kind {
        NodeKind::Text { .. }
        | NodeKind::LineBreak
        | NodeKind::HorizontalRule
        | NodeKind::CodeBlock { .. } => {
            if !children.is_empty() {
                out.push(Violation {
                    node: id,
                    kind: ViolationKind::LeafWithChildren,
                    description: format!("{} {id} has {} children", kind.name(), children.len()),
                });
            }
        }
        NodeKind::Root => {
            for child in children {
                if !doc.is_block(*child) {
                    out.push(Violation {
                        node: *child,
                        kind: ViolationKind::InlineUnderRoot,
                        description: format!("inline node {child} directly under the root"),
                    });
                }
            }
        }
        NodeKind::List { .. } => {
            for child in children {
                if !matches!(doc.kind(*child), Some(NodeKind::ListItem)) {
                    out.push(Violation {
                        node: *child,
                        kind: ViolationKind::ListChildNotItem,
                        description: format!("list {id} holds non-item {child}"),
                    });
                }
            }
        }
        _ => {
            for child in children {
                if doc.accepts(id, *child) {
                    continue;
                }
                let violation_kind = if doc.kind(*child).is_some_and(NodeKind::is_diff) {
                    ViolationKind::MisplacedBlockDiff
                } else {
                    ViolationKind::BlockInInline
                };
                out.push(Violation {
                    node: *child,
                    kind: violation_kind,
                    description: format!("block node {child} under {} {id}", kind.name()),
                });
            }
        }
    }
}

fn check_update_slots(doc: &Document, id: NodeId, out: &mut Vec<Violation>) {
    let children = doc.children(id);
    let unslotted = children.iter().filter(|c| doc.slot(**c).is_none()).count();
    let before = doc.slot_children(id, Side::Before);
    let after = doc.slot_children(id, Side::After);
    let containers = children
        .iter()
        .filter(|c| matches!(doc.kind(**c), Some(NodeKind::Container { .. })))
        .count();

    let malformed = if unslotted > 0 || before.is_empty() || after.is_empty() {
        true
    } else if containers > 0 {
        // Inline form: exactly one container per side, nothing else.
        containers != 2 || before.len() != 1 || after.len() != 1
    } else {
        false
    };

    if malformed {
        out.push(Violation {
            node: id,
            kind: ViolationKind::MalformedUpdate,
            description: format!(
                "update {id} has {} before, {} after and {unslotted} unslotted children",
                before.len(),
                after.len()
            ),
        });
    }
}
