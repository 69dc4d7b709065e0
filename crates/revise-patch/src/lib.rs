//! Patch engine for Revise.
//!
//! Accepting a diff node replaces it with its after side, rejecting it with
//! its before side. Each call either applies completely or returns a
//! [`PatchError`] with the document untouched. Bulk calls visit diffs in
//! document order and never stop on a single failure.
//!
//! # Key Types
//!
//! - [`Resolution`] -- What one accept or reject kept
//! - [`ResolutionReport`] -- Resolved, skipped and failed diffs of a bulk call
//! - [`PatchError`] -- Why a single resolution was refused

pub mod error;
pub mod resolve;

pub use error::{PatchError, PatchResult};
pub use resolve::{
    accept, accept_all, reject, reject_all, resolve, resolve_all, Resolution, ResolutionReport,
};
