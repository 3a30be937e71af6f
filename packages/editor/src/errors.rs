//! Error types for the editor

use thiserror::Error;
use weft_parser::Path;

/// Why a mutation batch was rejected. The source is never modified when
/// any of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error("Snapshot is stale: it was not taken of the given source")]
    StaleSnapshot,

    #[error("Snapshot has no tree (fatal parse)")]
    NoTree,

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node {0} is not a child of another node")]
    NotAChild(String),

    #[error("Node {0} cannot hold children")]
    InvalidParent(String),

    #[error("Moving {node} into {parent} would create a cycle")]
    CycleDetected { node: String, parent: String },

    #[error("Index {index} out of bounds for {parent_id} ({len} children)")]
    IndexOutOfBounds {
        parent_id: String,
        index: usize,
        len: usize,
    },

    #[error("Property `{name}` not found on {id}")]
    PropNotFound { id: String, name: String },

    #[error("Invalid property name: {0:?}")]
    InvalidPropName(String),

    #[error("Node {0} is not an element")]
    NotAnElement(String),

    #[error("Node {0} is deleted or moved by the same batch")]
    RemovedInBatch(String),

    #[error("Edits overlap at {start}..{end}")]
    OverlappingEdits { start: usize, end: usize },

    #[error("Result does not parse cleanly: {0}")]
    MalformedResult(String),

    #[error("Invalid edit: {0}")]
    InvalidEdit(String),
}

/// Why a native tree operation could not be expressed as mutations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdaptError {
    #[error("Operation `{op}` has no textual counterpart: {reason}")]
    Unmappable { op: &'static str, reason: String },

    #[error("Path {0:?} does not resolve in the current tree")]
    UnresolvedPath(Path),

    #[error("Snapshot has no tree (fatal parse)")]
    NoTree,
}

impl AdaptError {
    pub(crate) fn unmappable(op: &'static str, reason: impl Into<String>) -> Self {
        AdaptError::Unmappable {
            op,
            reason: reason.into(),
        }
    }
}
