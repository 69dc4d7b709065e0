use std::sync::Arc;

use revise_diff::DiffOutput;
use revise_patch::{Resolution, ResolutionReport};
use revise_types::{DiffInfo, Document, EngineEvent, EngineObserver, NodeId, NoopObserver};

use crate::config::EngineConfig;
use crate::error::{SdkError, SdkResult};

/// The Revise engine: a configuration and an observer, threaded through
/// every stage.
///
/// Holds no document state. One engine can serve any number of documents,
/// and it can be shared between threads.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    observer: Arc<dyn EngineObserver>,
}

impl Engine {
    /// An engine that discards its events.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    pub fn with_observer(config: EngineConfig, observer: Arc<dyn EngineObserver>) -> Self {
        Self { config, observer }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- Diffing ----

    /// Diff two documents into diff markup.
    pub fn compute_diff(&self, before: &Document, after: &Document) -> DiffOutput {
        let output = revise_diff::compute_diff(before, after, &self.config.diff);
        self.observer.on_event(&EngineEvent::DiffComputed {
            insertions: output.summary.insertions,
            deletions: output.summary.deletions,
            updates: output.summary.updates,
        });
        output
    }

    /// Parse two markdown texts and diff them.
    pub fn compute_diff_text(&self, before: &str, after: &str) -> SdkResult<DiffOutput> {
        let before = self.parse_document(before)?;
        let after = self.parse_document(after)?;
        Ok(self.compute_diff(&before, &after))
    }

    // ---- Import ----

    pub fn normalize(&self, text: &str) -> String {
        revise_grammar::normalize(text)
    }

    /// Import diff markup. Never fails: malformed spans stay literal text.
    pub fn import_diff_markup(&self, text: &str) -> Document {
        revise_import::import(text, &self.config.import, self.observer.as_ref())
    }

    /// Import a document that is expected to carry no diff spans.
    pub fn parse_document(&self, text: &str) -> SdkResult<Document> {
        let doc = self.import_diff_markup(text);
        let count = doc.diffs().len();
        if count > 0 {
            return Err(SdkError::UnexpectedDiffs(count));
        }
        Ok(doc)
    }

    /// The diff nodes a host can target, in document order.
    pub fn diffs(&self, doc: &Document) -> Vec<DiffInfo> {
        doc.diffs()
    }

    // ---- Resolution ----

    pub fn accept(&self, doc: &mut Document, id: NodeId) -> SdkResult<Resolution> {
        Ok(revise_patch::accept(doc, id, self.observer.as_ref())?)
    }

    pub fn reject(&self, doc: &mut Document, id: NodeId) -> SdkResult<Resolution> {
        Ok(revise_patch::reject(doc, id, self.observer.as_ref())?)
    }

    pub fn accept_all(&self, doc: &mut Document) -> ResolutionReport {
        revise_patch::accept_all(doc, self.observer.as_ref())
    }

    pub fn reject_all(&self, doc: &mut Document) -> ResolutionReport {
        revise_patch::reject_all(doc, self.observer.as_ref())
    }

    // ---- Output ----

    /// Export a document as diff markup, using the configured export
    /// options.
    pub fn export_diff_markup(&self, doc: &Document) -> String {
        revise_export::export_with(doc, &self.config.export)
    }

    /// Render a document as markdown, diffs shown as accepted.
    pub fn render(&self, doc: &Document) -> String {
        revise_export::render(doc)
    }

    pub fn plain_text(&self, doc: &Document) -> String {
        revise_export::plain_text(doc)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
