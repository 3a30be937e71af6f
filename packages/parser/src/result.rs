use crate::ast::{Node, NodeRef, Span, Tree};
use crate::error::ParseError;
use crc32fast::Hasher;
use serde::Serialize;

/// One parse snapshot: the tree (absent on fatal failure), its diagnostics
/// and the exact source it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub tree: Option<Tree>,
    pub diagnostics: Vec<ParseError>,
    source: String,
    /// CRC32 of `source`
    pub fingerprint: u32,
    /// Bumped on every reparse of the same document
    pub revision: u64,
}

impl ParseResult {
    pub(crate) fn new(
        source: &str,
        tree: Option<Tree>,
        diagnostics: Vec<ParseError>,
        revision: u64,
    ) -> Self {
        Self {
            tree,
            diagnostics,
            source: source.to_string(),
            fingerprint: source_fingerprint(source),
            revision,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    pub fn root(&self) -> Option<&Node> {
        self.tree.as_ref().map(|t| t.get(t.root()))
    }

    /// Fatal results carry no tree and must not replace an earlier snapshot
    pub fn is_fatal(&self) -> bool {
        self.tree.is_none()
    }

    /// True when this snapshot was taken of exactly `source`
    pub fn matches_source(&self, source: &str) -> bool {
        self.fingerprint == source_fingerprint(source) && self.source == source
    }

    pub fn slice(&self, node: NodeRef) -> Option<&str> {
        let tree = self.tree.as_ref()?;
        self.source.get(tree.get(node).span.range())
    }

    pub fn find(&self, id: &str) -> Option<(NodeRef, &Node)> {
        let tree = self.tree.as_ref()?;
        let node = tree.find(id)?;
        Some((node, tree.get(node)))
    }

    pub fn span_of(&self, id: &str) -> Option<Span> {
        self.find(id).map(|(_, n)| n.span)
    }
}

pub fn source_fingerprint(source: &str) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(source.as_bytes());
    hasher.finalize()
}
