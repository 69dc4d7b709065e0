//! Diff settings and the result types.

use serde::{Deserialize, Serialize};

/// Unit of the text diff inside a changed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Word,
    Sentence,
}

/// How a replaced piece is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Replacements {
    /// One update span.
    #[default]
    Update,
    /// A deletion span followed by an insertion span.
    DeleteInsert,
}

/// Diff engine settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub granularity: Granularity,
    pub replacements: Replacements,
}

/// Number of spans of each kind in a diff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub insertions: usize,
    pub deletions: usize,
    pub updates: usize,
}

impl DiffSummary {
    /// Total number of spans.
    pub fn total(&self) -> usize {
        self.insertions + self.deletions + self.updates
    }

    /// Returns `true` if the two documents were identical.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// The markup of a diff together with its span counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOutput {
    pub markup: String,
    pub summary: DiffSummary,
}
