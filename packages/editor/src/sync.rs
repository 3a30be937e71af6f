//! # Sync Controller
//!
//! Owns one document's `(source, snapshot)` pair and moves it forward in
//! either direction:
//!
//! ```text
//!   external text ──reparse──▶ snapshot          (SyncingFromSource)
//!   editor op ──translate──▶ mutations ──apply──▶ source ──▶ sink
//!                                                 (ApplyingToSource)
//! ```
//!
//! Every entry point runs only from `Idle` and returns there.

use crate::apply::Applicator;
use crate::config::EngineConfig;
use crate::errors::{AdaptError, ApplyError};
use crate::mutations::Mutation;
use crate::translate::{translate_operation, EditorOp};
use crate::tree_ops::{adapt_operation, TreeOperation};
use serde::Serialize;
use weft_parser::{ParseResult, Parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    Idle,
    SyncingFromSource,
    ApplyingToSource,
}

/// Receives the new source after every successful local edit. Persisting
/// it is the host's job.
pub trait SourceSink {
    fn source_changed(&mut self, source: &str);
}

impl<F: FnMut(&str)> SourceSink for F {
    fn source_changed(&mut self, source: &str) {
        self(source)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// A local edit was written and the sink notified
    Committed { revision: u64 },
    /// An external change was adopted
    Reparsed { revision: u64 },
    /// Nothing to do: an echo of our own write, or an edit with no effect
    Unchanged,
    /// The external text failed to parse; the previous tree stays
    KeptPrevious { diagnostics: usize },
    /// The mutation batch failed and was dropped
    Rejected(ApplyError),
    /// The editor op could not be placed in the current snapshot
    Untranslatable,
    /// The editor's tree has drifted from the source
    Diverged(AdaptError),
    /// Another sync step is in flight
    Busy,
}

pub struct SyncController<S: SourceSink> {
    parser: Parser,
    applicator: Applicator,
    sink: S,
    state: SyncState,
    source: String,
    snapshot: ParseResult,
    pending_reconciliation: bool,
}

impl<S: SourceSink> SyncController<S> {
    pub fn new(parser: Parser, applicator: Applicator, sink: S, initial: &str) -> Self {
        let snapshot = parser.parse(initial);
        if snapshot.is_fatal() {
            tracing::warn!(
                "[Sync] Initial source failed to parse ({} diagnostics)",
                snapshot.diagnostics.len()
            );
        }

        Self {
            pending_reconciliation: snapshot.is_fatal(),
            parser,
            applicator,
            sink,
            state: SyncState::Idle,
            source: initial.to_string(),
            snapshot,
        }
    }

    pub fn from_config(config: &EngineConfig, sink: S, initial: &str) -> Self {
        Self::new(config.parser(), config.applicator(), sink, initial)
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn snapshot(&self) -> &ParseResult {
        &self.snapshot
    }

    /// True when the editor's view may differ from the source and should
    /// be reloaded from [`snapshot`](Self::snapshot)
    pub fn is_pending_reconciliation(&self) -> bool {
        self.pending_reconciliation
    }

    fn enter(&mut self, next: SyncState) -> bool {
        if self.state != SyncState::Idle {
            tracing::warn!("[Sync] Busy in {:?}, ignoring {:?}", self.state, next);
            return false;
        }
        tracing::debug!("[Sync] {:?} -> {:?}", self.state, next);
        self.state = next;
        true
    }

    fn leave(&mut self) {
        tracing::debug!("[Sync] {:?} -> Idle", self.state);
        self.state = SyncState::Idle;
    }

    /// The source changed outside the editor
    pub fn external_source_changed(&mut self, text: &str) -> SyncOutcome {
        if !self.enter(SyncState::SyncingFromSource) {
            return SyncOutcome::Busy;
        }

        let outcome = if text == self.source && !self.snapshot.is_fatal() {
            tracing::debug!("[Sync] Ignoring echo of our own write");
            SyncOutcome::Unchanged
        } else {
            let result = self.parser.reparse(text, &self.snapshot);
            if result.is_fatal() {
                tracing::warn!(
                    "[Sync] Reparse failed with {} diagnostics, keeping revision {}",
                    result.diagnostics.len(),
                    self.snapshot.revision
                );
                self.pending_reconciliation = true;
                SyncOutcome::KeptPrevious {
                    diagnostics: result.diagnostics.len(),
                }
            } else {
                let revision = result.revision;
                tracing::info!(
                    "[Sync] Adopted external change ({} bytes, revision {})",
                    text.len(),
                    revision
                );
                self.source = text.to_string();
                self.snapshot = result;
                self.pending_reconciliation = false;
                SyncOutcome::Reparsed { revision }
            }
        };

        self.leave();
        outcome
    }

    /// A high-level action from the structural editor
    pub fn structural_operation(&mut self, op: &EditorOp) -> SyncOutcome {
        if self.state != SyncState::Idle {
            return SyncOutcome::Busy;
        }

        match translate_operation(op, &self.snapshot, &self.source) {
            None => {
                tracing::warn!("[Sync] Could not translate {} operation", op.kind());
                SyncOutcome::Untranslatable
            }
            Some(mutations) if mutations.is_empty() => SyncOutcome::Unchanged,
            Some(mutations) => self.commit(&mutations),
        }
    }

    /// An entry from the editor's native operation log
    pub fn tree_operation(&mut self, op: &TreeOperation) -> SyncOutcome {
        if self.state != SyncState::Idle {
            return SyncOutcome::Busy;
        }

        match adapt_operation(op, &self.snapshot) {
            Ok(mutations) => self.commit(&mutations),
            Err(error) => {
                tracing::info!("[Sync] {}; reconciliation pending", error);
                self.pending_reconciliation = true;
                SyncOutcome::Diverged(error)
            }
        }
    }

    /// Apply a batch the host built itself
    pub fn apply(&mut self, mutations: &[Mutation]) -> SyncOutcome {
        if mutations.is_empty() {
            return SyncOutcome::Unchanged;
        }
        self.commit(mutations)
    }

    /// Rebuild the snapshot from the current source, clearing any pending
    /// reconciliation once it parses
    pub fn reconcile(&mut self) -> SyncOutcome {
        if !self.enter(SyncState::SyncingFromSource) {
            return SyncOutcome::Busy;
        }

        let result = self.parser.reparse(&self.source, &self.snapshot);
        let outcome = if result.is_fatal() {
            SyncOutcome::KeptPrevious {
                diagnostics: result.diagnostics.len(),
            }
        } else {
            let revision = result.revision;
            self.snapshot = result;
            self.pending_reconciliation = false;
            SyncOutcome::Reparsed { revision }
        };

        self.leave();
        outcome
    }

    fn commit(&mut self, mutations: &[Mutation]) -> SyncOutcome {
        if !self.enter(SyncState::ApplyingToSource) {
            return SyncOutcome::Busy;
        }

        let outcome = match self.applicator.apply(&self.source, &self.snapshot, mutations) {
            Err(error) => {
                tracing::error!("[Sync] Dropping edit: {}", error);
                SyncOutcome::Rejected(error)
            }
            Ok(output) if output == self.source => SyncOutcome::Unchanged,
            Ok(output) => {
                let result = self.parser.reparse(&output, &self.snapshot);
                let revision = result.revision;
                if result.is_fatal() {
                    tracing::warn!("[Sync] Committed source no longer parses");
                }
                self.pending_reconciliation = result.is_fatal();
                self.snapshot = result;
                self.source = output;

                self.sink.source_changed(&self.source);
                tracing::info!(
                    "[Sync] Committed {} mutations (revision {})",
                    mutations.len(),
                    revision
                );
                SyncOutcome::Committed { revision }
            }
        };

        self.leave();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn controller(initial: &str) -> (SyncController<impl SourceSink>, Rc<RefCell<Vec<String>>>) {
        let writes = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let writes = Rc::clone(&writes);
            move |source: &str| writes.borrow_mut().push(source.to_string())
        };
        let controller = SyncController::from_config(&EngineConfig::default(), sink, initial);
        (controller, writes)
    }

    #[test]
    fn test_echo_is_a_no_op() {
        let (mut sync, _) = controller("<A />");
        let revision = sync.snapshot().revision;

        assert_eq!(sync.external_source_changed("<A />"), SyncOutcome::Unchanged);
        assert_eq!(sync.snapshot().revision, revision);
        assert_eq!(sync.state(), SyncState::Idle);
    }

    #[test]
    fn test_fatal_reparse_keeps_previous_tree() {
        let config = EngineConfig {
            parse: weft_parser::ParseOptions {
                max_depth: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut sync = SyncController::from_config(&config, |_: &str| {}, "<A />");
        let before = sync.snapshot().root().unwrap().id.clone();

        let outcome = sync.external_source_changed("<a><b><c /></b></a>");

        assert_eq!(outcome, SyncOutcome::KeptPrevious { diagnostics: 1 });
        assert_eq!(sync.source(), "<A />");
        assert_eq!(sync.snapshot().root().unwrap().id, before);
        assert!(sync.is_pending_reconciliation());
    }

    #[test]
    fn test_busy_state_rejects_calls() {
        let (mut sync, writes) = controller("<A />");
        sync.state = SyncState::ApplyingToSource;

        assert_eq!(sync.external_source_changed("<B />"), SyncOutcome::Busy);
        assert_eq!(
            sync.structural_operation(&EditorOp::Select { ids: vec![] }),
            SyncOutcome::Busy
        );
        assert_eq!(sync.source(), "<A />");
        assert!(writes.borrow().is_empty());
    }

    #[test]
    fn test_unmappable_sets_pending_until_reparse() {
        let (mut sync, _) = controller("<A>text</A>");
        let op = TreeOperation::SplitNode {
            path: weft_parser::Path(vec![0, 0]),
            position: 2,
        };

        assert!(matches!(sync.tree_operation(&op), SyncOutcome::Diverged(_)));
        assert!(sync.is_pending_reconciliation());

        assert!(matches!(sync.reconcile(), SyncOutcome::Reparsed { .. }));
        assert!(!sync.is_pending_reconciliation());
    }

    #[test]
    fn test_rejected_edit_leaves_source_alone() {
        let (mut sync, writes) = controller("<A />");
        let outcome = sync.apply(&[Mutation::DeleteNode {
            id: "missing-1".to_string(),
        }]);

        assert_eq!(
            outcome,
            SyncOutcome::Rejected(ApplyError::NodeNotFound("missing-1".to_string()))
        );
        assert_eq!(sync.source(), "<A />");
        assert!(writes.borrow().is_empty());
        assert_eq!(sync.state(), SyncState::Idle);
    }
}
