//! # Mutations
//!
//! Span-scoped edits addressed by node id against one parse snapshot.
//!
//! ## Semantics
//!
//! ### Indices
//! - `index` / `new_index` name a boundary between the snapshot's existing
//!   children (0 = before the first, `len` = after the last)
//! - Indices are never adjusted for earlier items of the same batch
//!
//! ### Move
//! - Atomic: the node's exact text is removed and reinserted
//! - Fails if the target is the node itself or one of its descendants
//!
//! ### SetText / SetProp
//! - Replace only the minimal inner span (text, code, or attribute value)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Mutation {
    /// Remove a node and everything inside it
    DeleteNode { id: String },

    /// Splice a source fragment in at a child boundary
    #[serde(rename_all = "camelCase")]
    InsertNode {
        parent_id: String,
        index: usize,
        fragment: String,
    },

    #[serde(rename_all = "camelCase")]
    MoveNode {
        id: String,
        new_parent_id: String,
        new_index: usize,
    },

    /// Replace text content (text run, expression code, or element body)
    SetText { id: String, text: String },

    SetProp {
        id: String,
        name: String,
        value: AttrValue,
    },

    RemoveProp { id: String, name: String },
}

impl Mutation {
    /// Id of the node the mutation acts on
    pub fn target_id(&self) -> &str {
        match self {
            Mutation::DeleteNode { id }
            | Mutation::MoveNode { id, .. }
            | Mutation::SetText { id, .. }
            | Mutation::SetProp { id, .. }
            | Mutation::RemoveProp { id, .. } => id,
            Mutation::InsertNode { parent_id, .. } => parent_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::DeleteNode { .. } => "delete-node",
            Mutation::InsertNode { .. } => "insert-node",
            Mutation::MoveNode { .. } => "move-node",
            Mutation::SetText { .. } => "set-text",
            Mutation::SetProp { .. } => "set-prop",
            Mutation::RemoveProp { .. } => "remove-prop",
        }
    }
}

/// Attribute value as it should be written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum AttrValue {
    /// Quoted string, written with the attribute's existing quote style
    Literal(String),
    /// Code written between braces
    Expression(String),
    /// Bare attribute with no value
    Flag,
}

impl AttrValue {
    /// Source text of the value token, `None` for a flag
    pub fn render(&self, quote: char) -> Option<String> {
        match self {
            AttrValue::Literal(value) => {
                let escaped = match quote {
                    '\'' => value.replace('\'', "&#39;"),
                    _ => value.replace('"', "&quot;"),
                };
                Some(format!("{quote}{escaped}{quote}"))
            }
            AttrValue::Expression(code) => Some(format!("{{{}}}", code)),
            AttrValue::Flag => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_wire_format() {
        let mutation = Mutation::MoveNode {
            id: "a-1".to_string(),
            new_parent_id: "a-2".to_string(),
            new_index: 3,
        };

        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(json["type"], "move-node");
        assert_eq!(json["newParentId"], "a-2");
        assert_eq!(json["newIndex"], 3);

        let back: Mutation = serde_json::from_value(json).unwrap();
        assert_eq!(back, mutation);
    }

    #[test]
    fn test_set_prop_from_json() {
        let json = r#"{"type":"set-prop","id":"x-4","name":"size","value":{"kind":"literal","value":"lg"}}"#;
        let mutation: Mutation = serde_json::from_str(json).unwrap();

        assert_eq!(
            mutation,
            Mutation::SetProp {
                id: "x-4".to_string(),
                name: "size".to_string(),
                value: AttrValue::Literal("lg".to_string()),
            }
        );
        assert_eq!(mutation.kind(), "set-prop");
        assert_eq!(mutation.target_id(), "x-4");
    }

    #[test]
    fn test_render_escapes_quote() {
        let value = AttrValue::Literal(r#"say "hi""#.to_string());

        assert_eq!(value.render('"').unwrap(), r#""say &quot;hi&quot;""#);
        assert_eq!(value.render('\'').unwrap(), r#"'say "hi"'"#);
        assert_eq!(AttrValue::Expression("count + 1".into()).render('"').unwrap(), "{count + 1}");
        assert_eq!(AttrValue::Flag.render('"'), None);
    }
}
