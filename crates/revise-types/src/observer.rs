//! Structured diagnostic events and the observer seam that receives them.
//!
//! Engine functions never log on their own. They report [`EngineEvent`]s to
//! an injected [`EngineObserver`]; [`NoopObserver`] drops them,
//! [`TracingObserver`] forwards them to `tracing`, and [`RecordingObserver`]
//! keeps them for assertions in tests.

use std::sync::Mutex;

use crate::id::NodeId;
use crate::node::{Decision, DiffKind};

/// Severity of an engine event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

/// Why a span that looked like a diff stayed literal text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiteralReason {
    /// An update span without exactly one `~>` separator.
    SeparatorCount(usize),
    /// The closing delimiter was missing from the enclosing construct.
    Unterminated,
}

/// A diagnostic event emitted by the traversal and mutation functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    /// The normalizer rewrote its input.
    Normalized { input_len: usize, output_len: usize },
    /// A diff span was materialized as a diff node.
    SpanImported {
        id: NodeId,
        kind: DiffKind,
        block_match: bool,
    },
    /// A diff span was left as literal text.
    SpanLeftLiteral { kind: DiffKind, reason: LiteralReason },
    /// A node was moved out of a parent that cannot hold it.
    NodePromoted {
        id: NodeId,
        from: NodeId,
        split: bool,
    },
    /// Promotion stopped before reaching a fixpoint.
    PromotionLimitReached { rounds: usize },
    /// The diff engine finished.
    DiffComputed {
        insertions: usize,
        deletions: usize,
        updates: usize,
    },
    /// A diff node was replaced by its kept content.
    DiffResolved {
        id: NodeId,
        kind: DiffKind,
        decision: Decision,
        kept: usize,
    },
    /// A bulk resolution skipped a diff that was no longer live.
    ResolutionSkipped { id: NodeId },
}

impl EngineEvent {
    /// The level this event is reported at.
    pub fn level(&self) -> EventLevel {
        match self {
            Self::Normalized { .. } | Self::NodePromoted { .. } => EventLevel::Trace,
            Self::SpanImported { .. } | Self::ResolutionSkipped { .. } => EventLevel::Debug,
            Self::DiffComputed { .. } | Self::DiffResolved { .. } => EventLevel::Info,
            Self::SpanLeftLiteral { .. } | Self::PromotionLimitReached { .. } => EventLevel::Warn,
        }
    }
}

/// Receiver of engine events.
///
/// Object-safe and `Send + Sync` so an engine holding an
/// `Arc<dyn EngineObserver>` can be shared between threads.
pub trait EngineObserver: Send + Sync {
    fn on_event(&self, event: &EngineEvent);
}

/// Observer that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {
    fn on_event(&self, _event: &EngineEvent) {}
}

/// Observer that forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn on_event(&self, event: &EngineEvent) {
        match event {
            EngineEvent::Normalized {
                input_len,
                output_len,
            } => tracing::trace!(input_len, output_len, "normalized diff markup"),
            EngineEvent::SpanImported {
                id,
                kind,
                block_match,
            } => tracing::debug!(node = %id, %kind, block_match, "imported diff span"),
            EngineEvent::SpanLeftLiteral { kind, reason } => {
                tracing::warn!(%kind, ?reason, "diff span left as literal text")
            }
            EngineEvent::NodePromoted { id, from, split } => {
                tracing::trace!(node = %id, from = %from, split, "promoted node")
            }
            EngineEvent::PromotionLimitReached { rounds } => {
                tracing::warn!(rounds, "promotion stopped before fixpoint")
            }
            EngineEvent::DiffComputed {
                insertions,
                deletions,
                updates,
            } => tracing::info!(insertions, deletions, updates, "computed document diff"),
            EngineEvent::DiffResolved {
                id,
                kind,
                decision,
                kept,
            } => tracing::info!(node = %id, %kind, %decision, kept, "resolved diff"),
            EngineEvent::ResolutionSkipped { id } => {
                tracing::debug!(node = %id, "skipped diff removed by an earlier decision")
            }
        }
    }
}

/// Observer that records events in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event recorded so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of recorded events matching a predicate.
    pub fn count(&self, predicate: impl Fn(&EngineEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl EngineObserver for RecordingObserver {
    fn on_event(&self, event: &EngineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_keeps_events_in_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&EngineEvent::ResolutionSkipped {
            id: NodeId::from_raw(1),
        });
        observer.on_event(&EngineEvent::PromotionLimitReached { rounds: 3 });
        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], EngineEvent::PromotionLimitReached { rounds: 3 });
        assert_eq!(
            observer.count(|e| matches!(e, EngineEvent::ResolutionSkipped { .. })),
            1
        );
    }

    #[test]
    fn literal_fallbacks_are_warnings() {
        let event = EngineEvent::SpanLeftLiteral {
            kind: DiffKind::Update,
            reason: LiteralReason::SeparatorCount(0),
        };
        assert_eq!(event.level(), EventLevel::Warn);
    }

    #[test]
    fn observers_are_object_safe() {
        let observers: Vec<Box<dyn EngineObserver>> =
            vec![Box::new(NoopObserver), Box::new(TracingObserver)];
        for o in &observers {
            o.on_event(&EngineEvent::Normalized {
                input_len: 1,
                output_len: 1,
            });
        }
    }
}
