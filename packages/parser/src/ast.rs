use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

/// Byte range `[start, end)` into the source a node was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// True when `other` lies entirely within this span
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range()]
    }
}

/// Arena key of a node within one [`Tree`] snapshot.
///
/// Only meaningful for the tree it came from; identity across snapshots is
/// carried by [`Node::id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(pub(crate) u32);

impl NodeRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Element,
    Fragment,
    Text,
    Expression,
}

impl NodeKind {
    /// Stable discriminant used when fingerprinting nodes
    pub(crate) fn code(self) -> u8 {
        match self {
            NodeKind::Element => 1,
            NodeKind::Fragment => 2,
            NodeKind::Text => 3,
            NodeKind::Expression => 4,
        }
    }

    /// Element and fragment nodes own children
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Element | NodeKind::Fragment)
    }
}

/// Where a node hangs off its parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Slot {
    Root,
    Child(usize),
    Prop(String),
}

/// Attribute value as written in the open tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PropValue {
    /// Bare attribute, `<Input disabled>`
    Flag,
    /// Quoted string; `value` excludes the quotes
    Literal { value: String, quote: char },
    /// `{code}`; `code` excludes the braces
    Expression { code: String },
    /// `{<Icon />}`: an expression holding exactly one element
    Node { node: NodeRef },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub name: String,
    /// Whole attribute, name through value
    pub span: Span,
    pub name_span: Span,
    /// Value token including quotes or braces
    pub value_span: Option<Span>,
    pub value: PropValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub tag: Option<String>,
    pub tag_span: Option<Span>,
    pub span: Span,
    /// `<Tag ...>` of elements and explicit fragments
    pub open: Option<Span>,
    /// `</Tag>`; absent for self-closing and auto-closed elements
    pub close: Option<Span>,
    pub self_closing: bool,
    /// Inner span: element content, text run, or expression code
    pub content: Span,
    pub props: Vec<Prop>,
    pub children: Vec<NodeRef>,
    pub parent: Option<NodeRef>,
    pub slot: Slot,
}

impl Node {
    pub(crate) fn container(kind: NodeKind, span: Span) -> Self {
        Self {
            id: String::new(),
            kind,
            tag: None,
            tag_span: None,
            span,
            open: None,
            close: None,
            self_closing: false,
            content: span,
            props: Vec::new(),
            children: Vec::new(),
            parent: None,
            slot: Slot::Root,
        }
    }

    pub(crate) fn text(span: Span) -> Self {
        Self::container(NodeKind::Text, span)
    }

    pub(crate) fn expression(span: Span) -> Self {
        Self {
            content: Span::new(span.start + 1, span.end - 1),
            ..Self::container(NodeKind::Expression, span)
        }
    }

    pub fn prop(&self, name: &str) -> Option<&Prop> {
        self.props.iter().find(|p| p.name == name)
    }

    pub fn child_index(&self) -> Option<usize> {
        match self.slot {
            Slot::Child(index) => Some(index),
            _ => None,
        }
    }
}

/// Ordered child indices from the root to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<usize>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Option<Path> {
        let (_, init) = self.0.split_last()?;
        Some(Path(init.to_vec()))
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

/// Arena of parsed nodes. The root is always a fragment spanning the whole
/// source.
#[derive(Debug, Clone, Serialize)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeRef,
    seed: String,
    id_counter: u32,
    #[serde(skip)]
    by_id: HashMap<String, NodeRef>,
}

impl Tree {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeRef) -> Self {
        Self {
            nodes,
            root,
            seed: String::new(),
            id_counter: 0,
            by_id: HashMap::new(),
        }
    }

    /// Install ids (one per arena slot) and rebuild the id lookup
    pub(crate) fn set_ids(&mut self, ids: Vec<String>, seed: &str, id_counter: u32) {
        for (node, id) in self.nodes.iter_mut().zip(ids) {
            node.id = id;
        }
        self.seed = seed.to_string();
        self.id_counter = id_counter;
        self.by_id = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), NodeRef(i as u32)))
            .collect();
    }

    pub fn root(&self) -> NodeRef {
        self.root
    }

    pub fn get(&self, node: NodeRef) -> &Node {
        &self.nodes[node.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeRef(i as u32), n))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn id_counter(&self) -> u32 {
        self.id_counter
    }

    pub fn find(&self, id: &str) -> Option<NodeRef> {
        self.by_id.get(id).copied()
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.find(id).map(|r| self.get(r))
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.get(node).parent
    }

    pub fn children(&self, node: NodeRef) -> &[NodeRef] {
        &self.get(node).children
    }

    /// Child-index path from the root. `None` for nodes reachable only
    /// through a property (they have no position among children).
    pub fn path_of(&self, node: NodeRef) -> Option<Path> {
        let mut indices = Vec::new();
        let mut current = node;

        while let Some(parent) = self.get(current).parent {
            indices.push(self.get(current).child_index()?);
            current = parent;
        }

        if current != self.root {
            return None;
        }

        indices.reverse();
        Some(Path(indices))
    }

    pub fn node_at_path(&self, path: &Path) -> Option<NodeRef> {
        let mut current = self.root;
        for &index in &path.0 {
            current = *self.get(current).children.get(index)?;
        }
        Some(current)
    }

    /// True when `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeRef, node: NodeRef) -> bool {
        let mut current = self.get(node).parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(parent).parent;
        }
        false
    }

    /// Pre-order walk of `node` and everything below it, prop-nested nodes
    /// included (after the owner's props, before its children).
    pub fn descendants(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            out.push(current);
            let n = self.get(current);
            for child in n.children.iter().rev() {
                stack.push(*child);
            }
            for prop in n.props.iter().rev() {
                if let PropValue::Node { node } = prop.value {
                    stack.push(node);
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains_and_overlaps() {
        let outer = Span::new(0, 10);
        let inner = Span::new(2, 5);

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.overlaps(&inner));
        assert!(!Span::new(0, 2).overlaps(&Span::new(2, 4)));
    }

    #[test]
    fn test_path_parent_and_child() {
        let path = Path::from(vec![0, 3, 1]);

        assert_eq!(path.parent(), Some(Path::from(vec![0, 3])));
        assert_eq!(path.last(), Some(1));
        assert_eq!(Path::root().parent(), None);
        assert_eq!(Path::root().child(2), Path::from(vec![2]));
    }
}
