use thiserror::Error;

use crate::id::NodeId;

/// Errors produced by arena edge rewrites.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node {0} is already attached to a parent")]
    AlreadyAttached(NodeId),

    #[error("node {0} is not attached to a parent")]
    Detached(NodeId),

    #[error("the root node {0} cannot be moved or removed")]
    RootImmutable(NodeId),

    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("child index {index} out of bounds for {parent} ({len} children)")]
    IndexOutOfBounds {
        parent: NodeId,
        index: usize,
        len: usize,
    },
}

/// Convenience alias for arena operations.
pub type TreeResult<T> = Result<T, TreeError>;
