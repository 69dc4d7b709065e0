//! Foundation types for Revise.
//!
//! Every other Revise crate depends on `revise-types`. It defines the
//! document arena the importer builds, the patch engine rewrites and the
//! exporter walks.
//!
//! # Key Types
//!
//! - [`Document`] -- Arena of nodes addressed by stable [`NodeId`]s
//! - [`NodeKind`] -- Closed set of block, inline and diff node kinds
//! - [`DiffKind`] -- Insert / Delete / Update
//! - [`Placement`] -- Derived inline/block mode of a diff node
//! - [`DiffInfo`] -- The id/kind pair exposed to hosts
//! - [`EngineObserver`] / [`EngineEvent`] -- Injected diagnostics
//! - [`ValidationReport`] -- Result of the structural validation pass

pub mod document;
pub mod error;
pub mod id;
pub mod node;
pub mod observer;
pub mod validation;

pub use document::{Document, NodeSnapshot};
pub use error::{TreeError, TreeResult};
pub use id::{NodeId, ParseNodeIdError};
pub use node::{
    Decision, DiffInfo, DiffKind, Marks, Node, NodeCategory, NodeKind, Placement, Side,
};
pub use observer::{
    EngineEvent, EngineObserver, EventLevel, LiteralReason, NoopObserver, RecordingObserver,
    TracingObserver,
};
pub use validation::{validate, ValidationReport, Violation, ViolationKind};
