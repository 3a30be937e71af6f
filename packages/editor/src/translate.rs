//! High-level editor actions to mutation batches.
//!
//! Translation only resolves ids and paths against the snapshot; it never
//! validates the resulting batch. That is the applicator's job.

use crate::mutations::{AttrValue, Mutation};
use serde::{Deserialize, Serialize};
use weft_parser::{NodeRef, ParseResult, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DropPosition {
    Before,
    After,
    Inside,
}

/// Action as issued by the structural editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EditorOp {
    Select {
        ids: Vec<String>,
    },
    Delete {
        ids: Vec<String>,
    },
    Duplicate {
        id: String,
    },
    #[serde(rename_all = "camelCase")]
    Move {
        id: String,
        target_id: String,
        position: DropPosition,
    },
    EditText {
        id: String,
        text: String,
    },
    /// `value: None` removes the attribute
    EditProp {
        id: String,
        name: String,
        value: Option<AttrValue>,
    },
}

impl EditorOp {
    pub fn kind(&self) -> &'static str {
        match self {
            EditorOp::Select { .. } => "select",
            EditorOp::Delete { .. } => "delete",
            EditorOp::Duplicate { .. } => "duplicate",
            EditorOp::Move { .. } => "move",
            EditorOp::EditText { .. } => "edit-text",
            EditorOp::EditProp { .. } => "edit-prop",
        }
    }
}

/// Translate `op` into mutations against `snapshot`.
///
/// `None` means the op cannot be placed: an id or path does not resolve, or
/// `source` is not what the snapshot was taken of. `Some(vec![])` is a
/// successful no-op.
pub fn translate_operation(
    op: &EditorOp,
    snapshot: &ParseResult,
    source: &str,
) -> Option<Vec<Mutation>> {
    if !snapshot.matches_source(source) {
        return None;
    }
    let tree = snapshot.tree()?;

    let mutations = match op {
        EditorOp::Select { .. } => Vec::new(),

        EditorOp::Delete { ids } => {
            let mut targets: Vec<NodeRef> = Vec::with_capacity(ids.len());
            for id in ids {
                let node = tree.find(id)?;
                tree.path_of(node)?;
                if !targets.contains(&node) {
                    targets.push(node);
                }
            }

            targets
                .iter()
                .filter(|&&node| !targets.iter().any(|&other| tree.is_ancestor(other, node)))
                .map(|&node| Mutation::DeleteNode {
                    id: tree.get(node).id.clone(),
                })
                .collect()
        }

        EditorOp::Duplicate { id } => {
            let node = tree.find(id)?;
            let (parent, index) = locate(tree, node)?;
            vec![Mutation::InsertNode {
                parent_id: tree.get(parent).id.clone(),
                index: index + 1,
                fragment: snapshot.slice(node)?.to_string(),
            }]
        }

        EditorOp::Move {
            id,
            target_id,
            position,
        } => {
            let node = tree.find(id)?;
            locate(tree, node)?;
            let target = tree.find(target_id)?;

            let (parent, index) = match position {
                DropPosition::Inside => {
                    tree.path_of(target)?;
                    (target, 0)
                }
                DropPosition::Before => locate(tree, target)?,
                DropPosition::After => {
                    let (parent, index) = locate(tree, target)?;
                    (parent, index + 1)
                }
            };

            vec![Mutation::MoveNode {
                id: id.clone(),
                new_parent_id: tree.get(parent).id.clone(),
                new_index: index,
            }]
        }

        EditorOp::EditText { id, text } => {
            tree.find(id)?;
            vec![Mutation::SetText {
                id: id.clone(),
                text: text.clone(),
            }]
        }

        EditorOp::EditProp { id, name, value } => {
            tree.find(id)?;
            let mutation = match value {
                Some(value) => Mutation::SetProp {
                    id: id.clone(),
                    name: name.clone(),
                    value: value.clone(),
                },
                None => Mutation::RemoveProp {
                    id: id.clone(),
                    name: name.clone(),
                },
            };
            vec![mutation]
        }
    };

    Some(mutations)
}

/// Parent and child index of `node`, resolved through its path
fn locate(tree: &Tree, node: NodeRef) -> Option<(NodeRef, usize)> {
    let path = tree.path_of(node)?;
    let index = path.last()?;
    let parent = tree.node_at_path(&path.parent()?)?;
    Some((parent, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_parser::parse;

    const SOURCE: &str = "<List>\n  <A>a</A>\n  <B>b</B>\n</List>\n";

    fn id(result: &ParseResult, slice: &str) -> String {
        let tree = result.tree().unwrap();
        tree.iter()
            .filter(|(node, _)| *node != tree.root())
            .find(|(node, _)| result.slice(*node) == Some(slice))
            .map(|(_, n)| n.id.clone())
            .unwrap()
    }

    #[test]
    fn test_select_is_empty_success() {
        let snapshot = parse(SOURCE);
        let op = EditorOp::Select {
            ids: vec![id(&snapshot, "<A>a</A>")],
        };

        assert_eq!(translate_operation(&op, &snapshot, SOURCE), Some(vec![]));
    }

    #[test]
    fn test_delete_drops_descendants_and_duplicates() {
        let snapshot = parse(SOURCE);
        let a = id(&snapshot, "<A>a</A>");
        let text = id(&snapshot, "a");
        let op = EditorOp::Delete {
            ids: vec![text, a.clone(), a.clone()],
        };

        assert_eq!(
            translate_operation(&op, &snapshot, SOURCE),
            Some(vec![Mutation::DeleteNode { id: a }])
        );
    }

    #[test]
    fn test_duplicate_inserts_verbatim_after() {
        let snapshot = parse(SOURCE);
        let op = EditorOp::Duplicate {
            id: id(&snapshot, "<A>a</A>"),
        };

        let mutations = translate_operation(&op, &snapshot, SOURCE).unwrap();
        assert_eq!(
            mutations,
            vec![Mutation::InsertNode {
                parent_id: id(&snapshot, SOURCE.trim_end()),
                index: 1,
                fragment: "<A>a</A>".to_string(),
            }]
        );
    }

    #[test]
    fn test_move_positions() {
        let snapshot = parse(SOURCE);
        let a = id(&snapshot, "<A>a</A>");
        let b = id(&snapshot, "<B>b</B>");
        let list = id(&snapshot, SOURCE.trim_end());

        let cases = [
            (DropPosition::Before, list.clone(), 1),
            (DropPosition::After, list, 2),
            (DropPosition::Inside, b.clone(), 0),
        ];

        for (position, parent, index) in cases {
            let op = EditorOp::Move {
                id: a.clone(),
                target_id: b.clone(),
                position,
            };
            assert_eq!(
                translate_operation(&op, &snapshot, SOURCE),
                Some(vec![Mutation::MoveNode {
                    id: a.clone(),
                    new_parent_id: parent,
                    new_index: index,
                }])
            );
        }
    }

    #[test]
    fn test_edit_prop_without_value_removes() {
        let snapshot = parse(SOURCE);
        let a = id(&snapshot, "<A>a</A>");
        let op = EditorOp::EditProp {
            id: a.clone(),
            name: "hidden".to_string(),
            value: None,
        };

        assert_eq!(
            translate_operation(&op, &snapshot, SOURCE),
            Some(vec![Mutation::RemoveProp {
                id: a,
                name: "hidden".to_string(),
            }])
        );
    }

    #[test]
    fn test_unresolvable_returns_none() {
        let snapshot = parse(SOURCE);
        let missing = EditorOp::Duplicate {
            id: "nope-1".to_string(),
        };
        let root = EditorOp::Duplicate {
            id: snapshot.root().unwrap().id.clone(),
        };
        let stale = EditorOp::Select { ids: vec![] };

        assert_eq!(translate_operation(&missing, &snapshot, SOURCE), None);
        assert_eq!(translate_operation(&root, &snapshot, SOURCE), None);
        assert_eq!(translate_operation(&stale, &snapshot, "changed"), None);
    }

    #[test]
    fn test_editor_op_wire_format() {
        let json = r#"{"type":"move","id":"a","targetId":"b","position":"after"}"#;
        let op: EditorOp = serde_json::from_str(json).unwrap();

        assert_eq!(
            op,
            EditorOp::Move {
                id: "a".to_string(),
                target_id: "b".to_string(),
                position: DropPosition::After,
            }
        );
        assert_eq!(op.kind(), "move");
    }
}
