//! High-level API for Revise.
//!
//! [`Engine`] bundles an [`EngineConfig`] and an observer and exposes the
//! whole pipeline: diff two documents, import diff markup, accept or reject
//! the resulting diff nodes and export what is left. This is the entry point
//! for applications embedding Revise.

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{ConfigError, SdkError, SdkResult};

// Re-export key types
pub use revise_diff::{DiffOptions, DiffOutput, DiffSummary, Granularity, Replacements};
pub use revise_export::ExportOptions;
pub use revise_import::ImportOptions;
pub use revise_patch::{PatchError, Resolution, ResolutionReport};
pub use revise_types::{
    Decision, DiffInfo, DiffKind, Document, EngineEvent, EngineObserver, NodeId, NoopObserver,
    Placement, RecordingObserver, TracingObserver,
};
