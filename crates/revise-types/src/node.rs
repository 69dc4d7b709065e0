//! Node kinds and the closed classification types built on them.
//!
//! Every node in a [`Document`](crate::Document) carries a [`NodeKind`].
//! Traversal code never compares type strings: it matches on the kind, on
//! its [`NodeCategory`], or on the derived [`Placement`] of a diff node.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// The closed set of node kinds a document may contain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// The document root. Exactly one per document.
    Root,
    /// `#` through `######` heading.
    Heading { level: u8 },
    Paragraph,
    /// Bullet (`ordered == false`) or numbered list.
    List { ordered: bool, start: u64 },
    ListItem,
    Quote,
    /// Fenced code block. The code is stored verbatim.
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    HorizontalRule,
    /// A formatted run of text. Inline code is a run with the `code` mark.
    Text { text: String, marks: Marks },
    LineBreak,
    Link { url: String },
    /// A diff node. Its placement is derived from its descendants.
    Diff { kind: DiffKind },
    /// Inline wrapper holding one side of an inline update.
    Container { side: Side },
}

impl NodeKind {
    /// Plain unformatted text run.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    /// Text run with the given marks.
    pub fn marked_text(text: impl Into<String>, marks: Marks) -> Self {
        Self::Text {
            text: text.into(),
            marks,
        }
    }

    /// Structural category of this kind.
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::Root
            | Self::Heading { .. }
            | Self::Paragraph
            | Self::List { .. }
            | Self::ListItem
            | Self::Quote
            | Self::CodeBlock { .. }
            | Self::HorizontalRule => NodeCategory::Block,
            Self::Text { .. } | Self::LineBreak | Self::Link { .. } | Self::Container { .. } => {
                NodeCategory::Inline
            }
            Self::Diff { .. } => NodeCategory::Diff,
        }
    }

    /// The diff kind, if this is a diff node.
    pub fn diff_kind(&self) -> Option<DiffKind> {
        match self {
            Self::Diff { kind } => Some(*kind),
            _ => None,
        }
    }

    /// Returns `true` for diff nodes.
    pub fn is_diff(&self) -> bool {
        matches!(self, Self::Diff { .. })
    }

    /// Returns `true` for text runs.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    /// Returns `true` for kinds that hold inline children only.
    pub fn holds_inline(&self) -> bool {
        matches!(
            self,
            Self::Heading { .. }
                | Self::Paragraph
                | Self::ListItem
                | Self::Quote
                | Self::Link { .. }
                | Self::Container { .. }
        )
    }

    /// Short lowercase name used in diagnostics and CLI listings.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Heading { .. } => "heading",
            Self::Paragraph => "paragraph",
            Self::List { .. } => "list",
            Self::ListItem => "list_item",
            Self::Quote => "quote",
            Self::CodeBlock { .. } => "code_block",
            Self::HorizontalRule => "horizontal_rule",
            Self::Text { .. } => "text",
            Self::LineBreak => "line_break",
            Self::Link { .. } => "link",
            Self::Diff { .. } => "diff",
            Self::Container { .. } => "container",
        }
    }
}

/// Structural category of a node kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    Block,
    Inline,
    /// Diff nodes: block or inline depending on their content.
    Diff,
}

/// Derived placement mode of a diff node.
///
/// A diff is block-placed iff any of its descendants is block-level. The
/// placement is recomputed on demand and never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Inline,
    Block,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Block => write!(f, "block"),
        }
    }
}

/// Classification of a diff node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Insert,
    Delete,
    Update,
}

impl DiffKind {
    /// All kinds, in grammar order.
    pub const ALL: [DiffKind; 3] = [Self::Insert, Self::Delete, Self::Update];
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Delete => write!(f, "delete"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// One of the two slots of an update diff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Before,
    After,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

/// A terminal decision on a diff node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Collapse to the "after" content.
    Accept,
    /// Collapse to the "before" content.
    Reject,
}

impl Decision {
    /// The update slot this decision keeps.
    pub fn kept_side(&self) -> Side {
        match self {
            Self::Accept => Side::After,
            Self::Reject => Side::Before,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Inline formatting marks carried by a text run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
}

impl Marks {
    /// No formatting.
    pub const PLAIN: Marks = Marks {
        bold: false,
        italic: false,
        strikethrough: false,
        code: false,
    };

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    pub fn with_code(mut self) -> Self {
        self.code = true;
        self
    }

    /// Returns `true` if no mark is set.
    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }
}

/// The per-diff information exposed across the engine boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffInfo {
    pub id: NodeId,
    pub kind: DiffKind,
    pub placement: Placement,
}

impl fmt::Display for DiffInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.id, self.kind, self.placement)
    }
}

/// A node stored in the document arena.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Side label on the edge from an update diff to this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) slot: Option<Side>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            parent: None,
            children: Vec::new(),
            slot: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The update slot this node occupies, if its parent is an update diff.
    pub fn slot(&self) -> Option<Side> {
        self.slot
    }
}
