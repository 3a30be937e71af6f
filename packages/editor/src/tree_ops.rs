//! The block editor's native operation log, mapped onto mutations.
//!
//! Editor operations address nodes by [`Path`] and count text offsets in
//! characters. Operations with no textual counterpart are reported as
//! unmappable rather than silently dropped.

use crate::errors::AdaptError;
use crate::mutations::{AttrValue, Mutation};
use serde::{Deserialize, Serialize};
use weft_parser::{NodeKind, NodeRef, ParseResult, Path, Tree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TreeOperation {
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        path: Path,
        offset: usize,
        text: String,
    },
    InsertNode {
        path: Path,
        fragment: String,
    },
    RemoveNode {
        path: Path,
    },
    /// `new_path` is where the node ends up, read after it was removed
    #[serde(rename_all = "camelCase")]
    MoveNode {
        path: Path,
        new_path: Path,
    },
    SetProperty {
        path: Path,
        name: String,
        value: Option<AttrValue>,
    },
    SetSelection {
        anchor: Option<Path>,
        focus: Option<Path>,
    },
    SplitNode {
        path: Path,
        position: usize,
    },
    MergeNode {
        path: Path,
    },
}

impl TreeOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            TreeOperation::InsertText { .. } => "insert-text",
            TreeOperation::RemoveText { .. } => "remove-text",
            TreeOperation::InsertNode { .. } => "insert-node",
            TreeOperation::RemoveNode { .. } => "remove-node",
            TreeOperation::MoveNode { .. } => "move-node",
            TreeOperation::SetProperty { .. } => "set-property",
            TreeOperation::SetSelection { .. } => "set-selection",
            TreeOperation::SplitNode { .. } => "split-node",
            TreeOperation::MergeNode { .. } => "merge-node",
        }
    }
}

/// Map one log entry onto mutations against `snapshot`
pub fn adapt_operation(
    op: &TreeOperation,
    snapshot: &ParseResult,
) -> Result<Vec<Mutation>, AdaptError> {
    let tree = snapshot.tree().ok_or(AdaptError::NoTree)?;
    let kind = op.kind();

    let mutation = match op {
        TreeOperation::InsertText { path, offset, text } => {
            let (node, current) = text_node(tree, snapshot, path, kind)?;
            let at = byte_offset(current, *offset)
                .ok_or_else(|| AdaptError::unmappable(kind, "offset past end of text"))?;

            Mutation::SetText {
                id: tree.get(node).id.clone(),
                text: format!("{}{}{}", &current[..at], text, &current[at..]),
            }
        }

        TreeOperation::RemoveText { path, offset, text } => {
            let (node, current) = text_node(tree, snapshot, path, kind)?;
            let at = byte_offset(current, *offset)
                .ok_or_else(|| AdaptError::unmappable(kind, "offset past end of text"))?;
            if !current[at..].starts_with(text.as_str()) {
                return Err(AdaptError::unmappable(
                    kind,
                    format!("{:?} is not at offset {}", text, offset),
                ));
            }

            Mutation::SetText {
                id: tree.get(node).id.clone(),
                text: format!("{}{}", &current[..at], &current[at + text.len()..]),
            }
        }

        TreeOperation::InsertNode { path, fragment } => {
            let (parent, index) = boundary(tree, path)?;
            Mutation::InsertNode {
                parent_id: tree.get(parent).id.clone(),
                index,
                fragment: fragment.clone(),
            }
        }

        TreeOperation::RemoveNode { path } => {
            if path.is_root() {
                return Err(AdaptError::unmappable(kind, "the root cannot be removed"));
            }
            Mutation::DeleteNode {
                id: tree.get(resolve(tree, path)?).id.clone(),
            }
        }

        TreeOperation::MoveNode { path, new_path } => {
            if path.is_root() {
                return Err(AdaptError::unmappable(kind, "the root cannot be moved"));
            }
            let node = resolve(tree, path)?;
            let (parent, index) = boundary(tree, &before_removal(path, new_path))?;

            Mutation::MoveNode {
                id: tree.get(node).id.clone(),
                new_parent_id: tree.get(parent).id.clone(),
                new_index: index,
            }
        }

        TreeOperation::SetProperty { path, name, value } => {
            let id = tree.get(resolve(tree, path)?).id.clone();
            match value {
                Some(value) => Mutation::SetProp {
                    id,
                    name: name.clone(),
                    value: value.clone(),
                },
                None => Mutation::RemoveProp {
                    id,
                    name: name.clone(),
                },
            }
        }

        TreeOperation::SetSelection { .. } => {
            return Err(AdaptError::unmappable(kind, "selection is not part of the source"));
        }
        TreeOperation::SplitNode { .. } | TreeOperation::MergeNode { .. } => {
            return Err(AdaptError::unmappable(
                kind,
                "block restructuring has no span-scoped equivalent",
            ));
        }
    };

    Ok(vec![mutation])
}

fn resolve(tree: &Tree, path: &Path) -> Result<NodeRef, AdaptError> {
    tree.node_at_path(path)
        .ok_or_else(|| AdaptError::UnresolvedPath(path.clone()))
}

fn text_node<'s>(
    tree: &Tree,
    snapshot: &'s ParseResult,
    path: &Path,
    kind: &'static str,
) -> Result<(NodeRef, &'s str), AdaptError> {
    let node = resolve(tree, path)?;
    if tree.get(node).kind != NodeKind::Text {
        return Err(AdaptError::unmappable(kind, "target is not a text node"));
    }
    let current = snapshot
        .slice(node)
        .ok_or_else(|| AdaptError::UnresolvedPath(path.clone()))?;
    Ok((node, current))
}

/// Parent and child boundary a path points at; the last index may be one
/// past the parent's last child
fn boundary(tree: &Tree, path: &Path) -> Result<(NodeRef, usize), AdaptError> {
    let unresolved = || AdaptError::UnresolvedPath(path.clone());
    let index = path.last().ok_or_else(unresolved)?;
    let parent = tree
        .node_at_path(&path.parent().ok_or_else(unresolved)?)
        .ok_or_else(unresolved)?;

    if index > tree.children(parent).len() {
        return Err(unresolved());
    }
    Ok((parent, index))
}

/// Rewrite a destination read after removing `path` into snapshot terms
fn before_removal(path: &Path, new_path: &Path) -> Path {
    let depth = path.len() - 1;
    let mut indices = new_path.0.clone();

    let same_parent_line = indices.len() > depth && indices[..depth] == path.0[..depth];
    if same_parent_line && indices[depth] >= path.0[depth] {
        indices[depth] += 1;
    }
    Path(indices)
}

/// Byte position of the `chars`-th character, or the end of `text`
fn byte_offset(text: &str, chars: usize) -> Option<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .nth(chars)
}
