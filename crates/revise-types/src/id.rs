use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable identifier of a node inside a [`Document`](crate::Document) arena.
///
/// Ids are allocated monotonically and never reused within a document, so an
/// id that refers to a resolved diff stays dead for the document's lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw arena index.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw arena index.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Error returned when a string is not a valid node id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node id: {0:?}")]
pub struct ParseNodeIdError(pub String);

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    /// Accepts both the display form (`n42`) and a bare number (`42`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix('n').unwrap_or(s.trim());
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseNodeIdError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_n_prefix() {
        assert_eq!(NodeId::from_raw(7).to_string(), "n7");
    }

    #[test]
    fn parse_accepts_display_and_bare_forms() {
        assert_eq!("n12".parse::<NodeId>().unwrap(), NodeId::from_raw(12));
        assert_eq!("12".parse::<NodeId>().unwrap(), NodeId::from_raw(12));
        assert!("x12".parse::<NodeId>().is_err());
        assert!("n".parse::<NodeId>().is_err());
    }

    #[test]
    fn serde_is_transparent() {
        let id = NodeId::from_raw(3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "3");
        let parsed: NodeId = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn ordering_follows_allocation() {
        assert!(NodeId::from_raw(1) < NodeId::from_raw(2));
    }
}
