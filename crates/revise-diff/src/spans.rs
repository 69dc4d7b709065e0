//! Span writer: formats block diff spans and counts every span written.

use revise_grammar::{closer, opener, UPDATE_SEPARATOR};
use revise_types::DiffKind;

use crate::options::{DiffSummary, Replacements};

pub(crate) struct SpanWriter {
    replacements: Replacements,
    summary: DiffSummary,
}

impl SpanWriter {
    pub(crate) fn new(replacements: Replacements) -> Self {
        Self {
            replacements,
            summary: DiffSummary::default(),
        }
    }

    pub(crate) fn summary(&self) -> DiffSummary {
        self.summary
    }

    fn count(&mut self, kind: DiffKind) {
        match kind {
            DiffKind::Insert => self.summary.insertions += 1,
            DiffKind::Delete => self.summary.deletions += 1,
            DiffKind::Update => self.summary.updates += 1,
        }
    }

    pub(crate) fn replacements(&self) -> Replacements {
        self.replacements
    }

    /// Count spans written elsewhere, such as an inline diff.
    pub(crate) fn record(&mut self, kinds: &[DiffKind]) {
        for kind in kinds {
            self.count(*kind);
        }
    }

    /// A block insertion or deletion of rendered blocks, delimiters on
    /// their own lines.
    pub(crate) fn block(&mut self, kind: DiffKind, blocks: &[String]) -> String {
        self.count(kind);
        format!("{}\n{}\n{}", opener(kind), blocks.join("\n\n"), closer(kind))
    }

    /// A block replacement, as one or two blocks of output.
    pub(crate) fn block_replace(&mut self, before: &str, after: &str) -> Vec<String> {
        match self.replacements {
            Replacements::Update => {
                self.count(DiffKind::Update);
                vec![format!(
                    "{}\n{before}\n{UPDATE_SEPARATOR}\n{after}\n{}",
                    opener(DiffKind::Update),
                    closer(DiffKind::Update)
                )]
            }
            Replacements::DeleteInsert => vec![
                self.block(DiffKind::Delete, &[before.to_string()]),
                self.block(DiffKind::Insert, &[after.to_string()]),
            ],
        }
    }
}
