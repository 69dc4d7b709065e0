//! Error types for accept and reject operations.

use revise_types::{NodeId, TreeError};
use thiserror::Error;

/// Errors returned by single-diff resolution. The document is unchanged
/// whenever one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// The id names no live node, or a diff that was already resolved.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// The node exists but is not a diff node.
    #[error("{id} is a {kind}, not a diff")]
    NotADiff { id: NodeId, kind: &'static str },

    /// An update diff without exactly its two populated slots.
    #[error("update {0} is malformed")]
    MalformedUpdate(NodeId),

    /// An arena edit failed after validation.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),
}

/// Convenience alias for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;
