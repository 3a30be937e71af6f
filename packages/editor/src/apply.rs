//! # Mutation Applicator
//!
//! Turns a batch of [`Mutation`]s into a new source string by splicing
//! only the spans the mutations touch. Everything else, comments and
//! unsupported syntax included, comes through byte-for-byte.
//!
//! The batch is planned in full against the snapshot before any text
//! changes, so one unresolvable item rejects the whole batch.

use crate::errors::ApplyError;
use crate::mutations::{AttrValue, Mutation};
use crate::text_edit::{apply_edits, TextEdit};
use crate::whitespace::{deletion_range, separator};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use weft_parser::lexer::is_valid_name;
use weft_parser::{Node, NodeKind, NodeRef, ParseResult, Parser, PropValue, Span, Tree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplyOptions {
    /// Reparse the result and reject batches that break the document
    pub verify_output: bool,
    /// Escape `<`, `{` and `}` in text written by `set-text`
    pub escape_text: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            verify_output: true,
            escape_text: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Applicator {
    parser: Parser,
    options: ApplyOptions,
}

impl Applicator {
    pub fn new(parser: Parser, options: ApplyOptions) -> Self {
        Self { parser, options }
    }

    pub fn options(&self) -> &ApplyOptions {
        &self.options
    }

    /// Apply `mutations`, computed against `snapshot`, to `source`
    pub fn apply(
        &self,
        source: &str,
        snapshot: &ParseResult,
        mutations: &[Mutation],
    ) -> Result<String, ApplyError> {
        if !snapshot.matches_source(source) {
            tracing::warn!(
                "[Apply] Snapshot revision {} does not match the given source",
                snapshot.revision
            );
            return Err(ApplyError::StaleSnapshot);
        }
        if mutations.is_empty() {
            return Ok(source.to_string());
        }
        let tree = snapshot.tree().ok_or(ApplyError::NoTree)?;

        let mut planner = EditPlanner::new(source, tree, &self.options);
        for mutation in mutations {
            tracing::debug!(
                "[Apply] Planning {} on {}",
                mutation.kind(),
                mutation.target_id()
            );
            planner.plan(mutation)?;
        }

        let edits = planner.finish()?;
        tracing::debug!("[Apply] {} text edits", edits.len());
        let output = apply_edits(source, edits)?;

        if self.options.verify_output {
            self.verify(&output, snapshot)?;
        }

        tracing::info!(
            "[Apply] Applied {} mutations ({} -> {} bytes)",
            mutations.len(),
            source.len(),
            output.len()
        );
        Ok(output)
    }

    fn verify(&self, output: &str, snapshot: &ParseResult) -> Result<(), ApplyError> {
        let reparsed = self.parser.parse(output);

        if reparsed.is_fatal() {
            let reason = reparsed
                .diagnostics
                .last()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "fatal parse".to_string());
            return Err(ApplyError::MalformedResult(reason));
        }

        if reparsed.diagnostics.len() > snapshot.diagnostics.len() {
            let introduced = reparsed
                .diagnostics
                .iter()
                .find(|d| !snapshot.diagnostics.contains(d))
                .or(reparsed.diagnostics.last())
                .map(|d| d.to_string())
                .unwrap_or_default();
            tracing::warn!("[Apply] Rejecting batch: {}", introduced);
            return Err(ApplyError::MalformedResult(introduced));
        }

        Ok(())
    }
}

/// Apply a batch with default options
pub fn apply_mutations(
    source: &str,
    snapshot: &ParseResult,
    mutations: &[Mutation],
) -> Result<String, ApplyError> {
    Applicator::default().apply(source, snapshot, mutations)
}

pub(crate) fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Pending `<Tag />` -> `<Tag>…</Tag>` rewrite, shared by every insert
/// into the same self-closing element
struct Expansion {
    edit: usize,
    tag: String,
    body: String,
}

/// Insert resolved once the whole batch is planned, so boundaries can step
/// around siblings the batch removes
struct PendingInsert {
    parent: NodeRef,
    index: usize,
    fragment: String,
    seq: usize,
}

struct EditPlanner<'a> {
    source: &'a str,
    tree: &'a Tree,
    options: &'a ApplyOptions,
    edits: Vec<TextEdit>,
    expansions: HashMap<NodeRef, Expansion>,
    inserts: Vec<PendingInsert>,
    deleted: HashSet<NodeRef>,
    moved: HashSet<NodeRef>,
    seq: usize,
}

impl<'a> EditPlanner<'a> {
    fn new(source: &'a str, tree: &'a Tree, options: &'a ApplyOptions) -> Self {
        Self {
            source,
            tree,
            options,
            edits: Vec::new(),
            expansions: HashMap::new(),
            inserts: Vec::new(),
            deleted: HashSet::new(),
            moved: HashSet::new(),
            seq: 0,
        }
    }

    fn finish(mut self) -> Result<Vec<TextEdit>, ApplyError> {
        if let Some(&node) = self.moved.iter().find(|node| self.deleted.contains(*node)) {
            return Err(ApplyError::RemovedInBatch(self.node(node).id.clone()));
        }

        for insert in std::mem::take(&mut self.inserts) {
            if let Some(removed) = self.removed_ancestor(insert.parent) {
                return Err(ApplyError::RemovedInBatch(self.node(removed).id.clone()));
            }
            self.resolve_insert(insert);
        }
        Ok(self.edits)
    }

    fn next_seq(&mut self) -> usize {
        self.seq += 1;
        self.seq
    }

    fn push(&mut self, span: Span, insert: impl Into<String>) {
        let seq = self.next_seq();
        self.push_at(span, insert, seq);
    }

    fn push_at(&mut self, span: Span, insert: impl Into<String>, seq: usize) {
        self.edits.push(TextEdit::replace(span, insert, seq));
    }

    fn is_removed(&self, node: NodeRef) -> bool {
        self.deleted.contains(&node) || self.moved.contains(&node)
    }

    /// `node` itself or its nearest ancestor that the batch deletes or moves
    fn removed_ancestor(&self, node: NodeRef) -> Option<NodeRef> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.is_removed(n) {
                return Some(n);
            }
            current = self.tree.parent(n);
        }
        None
    }

    fn resolve(&self, id: &str) -> Result<NodeRef, ApplyError> {
        self.tree
            .find(id)
            .ok_or_else(|| ApplyError::NodeNotFound(id.to_string()))
    }

    fn node(&self, node: NodeRef) -> &'a Node {
        self.tree.get(node)
    }

    /// Parent and index of a node that sits among its parent's children
    fn position(&self, node: NodeRef) -> Result<(NodeRef, usize), ApplyError> {
        let n = self.node(node);
        match (n.parent, n.child_index()) {
            (Some(parent), Some(index)) => Ok((parent, index)),
            _ => Err(ApplyError::NotAChild(n.id.clone())),
        }
    }

    fn container(&self, id: &str) -> Result<NodeRef, ApplyError> {
        let node = self.resolve(id)?;
        if !self.node(node).kind.is_container() {
            return Err(ApplyError::InvalidParent(id.to_string()));
        }
        Ok(node)
    }

    fn element(&self, id: &str) -> Result<&'a Node, ApplyError> {
        let node = self.node(self.resolve(id)?);
        if node.kind != NodeKind::Element {
            return Err(ApplyError::NotAnElement(id.to_string()));
        }
        Ok(node)
    }

    fn check_boundary(&self, parent: NodeRef, index: usize) -> Result<(), ApplyError> {
        let len = self.tree.children(parent).len();
        if index > len {
            return Err(ApplyError::IndexOutOfBounds {
                parent_id: self.node(parent).id.clone(),
                index,
                len,
            });
        }
        Ok(())
    }

    fn plan(&mut self, mutation: &Mutation) -> Result<(), ApplyError> {
        match mutation {
            Mutation::DeleteNode { id } => self.plan_delete(id),
            Mutation::InsertNode {
                parent_id,
                index,
                fragment,
            } => {
                let parent = self.container(parent_id)?;
                self.check_boundary(parent, *index)?;
                self.insert_at_boundary(parent, *index, fragment);
                Ok(())
            }
            Mutation::MoveNode {
                id,
                new_parent_id,
                new_index,
            } => self.plan_move(id, new_parent_id, *new_index),
            Mutation::SetText { id, text } => self.plan_set_text(id, text),
            Mutation::SetProp { id, name, value } => self.plan_set_prop(id, name, value),
            Mutation::RemoveProp { id, name } => self.plan_remove_prop(id, name),
        }
    }

    fn plan_delete(&mut self, id: &str) -> Result<(), ApplyError> {
        let node = self.resolve(id)?;
        self.position(node)?;

        let range = deletion_range(self.source, self.node(node).span);
        self.push(range, "");
        self.deleted.insert(node);
        Ok(())
    }

    fn plan_move(
        &mut self,
        id: &str,
        new_parent_id: &str,
        new_index: usize,
    ) -> Result<(), ApplyError> {
        let node = self.resolve(id)?;
        let (old_parent, old_index) = self.position(node)?;
        let new_parent = self.container(new_parent_id)?;

        if new_parent == node || self.tree.is_ancestor(node, new_parent) {
            return Err(ApplyError::CycleDetected {
                node: id.to_string(),
                parent: new_parent_id.to_string(),
            });
        }
        self.check_boundary(new_parent, new_index)?;

        if new_parent == old_parent && (new_index == old_index || new_index == old_index + 1) {
            tracing::debug!("[Apply] Move of {} is a no-op", id);
            return Ok(());
        }

        let span = self.node(node).span;
        let text = span.slice(self.source);
        self.push(deletion_range(self.source, span), "");
        self.moved.insert(node);
        self.insert_at_boundary(new_parent, new_index, text);
        Ok(())
    }

    fn plan_set_text(&mut self, id: &str, text: &str) -> Result<(), ApplyError> {
        let node = self.node(self.resolve(id)?);

        match node.kind {
            // Expression bodies are code and are written verbatim
            NodeKind::Expression => self.push(node.content, text),
            NodeKind::Text => {
                let current = node.span.slice(self.source);
                let (prefix, suffix) = common_affixes(current, text);
                if prefix == current.len() && prefix == text.len() {
                    return Ok(());
                }

                let inserted = self.escaped(&text[prefix..text.len() - suffix]);
                self.push(
                    Span::new(node.span.start + prefix, node.span.end - suffix),
                    inserted,
                )
            }
            NodeKind::Element if node.self_closing => {
                let text = self.escaped(text);
                let tag = node.tag.clone().unwrap_or_default();
                self.push(
                    self_closing_tail(self.source, node),
                    format!(">{}</{}>", text, tag),
                );
            }
            NodeKind::Element | NodeKind::Fragment => {
                let text = self.escaped(text);
                self.push(node.content, text)
            }
        }
        Ok(())
    }

    fn plan_set_prop(
        &mut self,
        id: &str,
        name: &str,
        value: &AttrValue,
    ) -> Result<(), ApplyError> {
        let node = self.element(id)?;
        if !is_valid_name(name) {
            return Err(ApplyError::InvalidPropName(name.to_string()));
        }

        let Some(prop) = node.prop(name) else {
            let anchor = node
                .props
                .last()
                .map(|p| p.span.end)
                .or(node.tag_span.map(|s| s.end))
                .unwrap_or(node.span.start);
            let attribute = match value.render('"') {
                Some(rendered) => format!(" {}={}", name, rendered),
                None => format!(" {}", name),
            };
            self.push(Span::new(anchor, anchor), attribute);
            return Ok(());
        };

        let quote = match prop.value {
            PropValue::Literal { quote, .. } => quote,
            _ => '"',
        };

        match (value.render(quote), prop.value_span) {
            (Some(rendered), Some(value_span)) => self.push(value_span, rendered),
            (Some(rendered), None) => {
                let at = prop.name_span.end;
                self.push(Span::new(at, at), format!("={}", rendered));
            }
            (None, Some(value_span)) => {
                self.push(Span::new(prop.name_span.end, value_span.end), "");
            }
            (None, None) => {}
        }
        Ok(())
    }

    fn plan_remove_prop(&mut self, id: &str, name: &str) -> Result<(), ApplyError> {
        let node = self.element(id)?;
        let prop = node.prop(name).ok_or_else(|| ApplyError::PropNotFound {
            id: id.to_string(),
            name: name.to_string(),
        })?;

        let before = &self.source[..prop.span.start];
        let start = before.trim_end().len();
        self.push(Span::new(start, prop.span.end), "");
        Ok(())
    }

    fn escaped(&self, text: &str) -> String {
        if self.options.escape_text {
            escape_text(text)
        } else {
            text.to_string()
        }
    }

    /// Queue `fragment` for child boundary `index` of `parent`
    fn insert_at_boundary(&mut self, parent: NodeRef, index: usize, fragment: &str) {
        let seq = self.next_seq();
        self.inserts.push(PendingInsert {
            parent,
            index,
            fragment: fragment.to_string(),
            seq,
        });
    }

    fn resolve_insert(&mut self, insert: PendingInsert) {
        let PendingInsert {
            parent,
            index,
            fragment,
            seq,
        } = insert;
        let tree = self.tree;
        let children = tree.children(parent);
        let parent_node = tree.get(parent);

        if children.is_empty() {
            if parent_node.self_closing {
                self.expand(parent, &fragment, seq);
            } else {
                let at = parent_node.content.start;
                self.push_at(Span::new(at, at), fragment, seq);
            }
            return;
        }

        let sep = separator(self.source, tree, parent, index);
        let live = |node: &&NodeRef| !self.is_removed(**node);
        let next = children.get(index).filter(live);
        let prev = children[..index].iter().rev().find(live);
        let later = children[index..].iter().find(live);

        match (next, prev, later) {
            (Some(&next), _, _) | (None, None, Some(&next)) => {
                let at = self.node(next).span.start;
                self.push_at(Span::new(at, at), format!("{}{}", fragment, sep), seq);
            }
            (None, Some(&prev), _) => {
                let at = self.node(prev).span.end;
                self.push_at(Span::new(at, at), format!("{}{}", sep, fragment), seq);
            }
            // Every child leaves with this batch
            (None, None, None) => {
                let at = parent_node.content.start;
                self.push_at(Span::new(at, at), fragment, seq);
            }
        }
    }

    fn expand(&mut self, parent: NodeRef, fragment: &str, seq: usize) {
        if let Some(expansion) = self.expansions.get_mut(&parent) {
            expansion.body.push_str(fragment);
            let insert = format!(">{}</{}>", expansion.body, expansion.tag);
            self.edits[expansion.edit].insert = insert;
            return;
        }

        let node = self.node(parent);
        let tag = node.tag.clone().unwrap_or_default();
        let edit = self.edits.len();
        self.push_at(
            self_closing_tail(self.source, node),
            format!(">{}</{}>", fragment, tag),
            seq,
        );
        self.expansions.insert(
            parent,
            Expansion {
                edit,
                tag,
                body: fragment.to_string(),
            },
        );
    }
}

/// Byte lengths of the longest common prefix and, within what remains, the
/// longest common suffix of `a` and `b`
fn common_affixes(a: &str, b: &str) -> (usize, usize) {
    let prefix: usize = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum();

    let suffix = a[prefix..]
        .chars()
        .rev()
        .zip(b[prefix..].chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum();

    (prefix, suffix)
}

/// `/>` of a self-closing element plus the blanks before it
fn self_closing_tail(source: &str, node: &Node) -> Span {
    let open = node.open.unwrap_or(node.span);
    let slash = open.end.saturating_sub(2);
    let start = source[..slash].trim_end().len().max(open.start);
    Span::new(start, open.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_parser::parse;

    fn id_of(result: &ParseResult, slice: &str) -> String {
        let tree = result.tree().unwrap();
        tree.iter()
            .filter(|(node, _)| *node != tree.root())
            .find(|(node, _)| result.slice(*node) == Some(slice))
            .map(|(_, n)| n.id.clone())
            .unwrap_or_else(|| panic!("no node for {:?}", slice))
    }

    fn apply(
        source: &str,
        build: impl Fn(&ParseResult) -> Vec<Mutation>,
    ) -> Result<String, ApplyError> {
        let snapshot = parse(source);
        let mutations = build(&snapshot);
        apply_mutations(source, &snapshot, &mutations)
    }

    #[test]
    fn test_empty_batch_is_identity() {
        let source = "Prose <!-- kept --> <A />\n";
        assert_eq!(apply(source, |_| vec![]).unwrap(), source);
    }

    #[test]
    fn test_stale_snapshot_is_rejected() {
        let snapshot = parse("<A />");
        let result = apply_mutations("<A /> changed", &snapshot, &[]);
        assert_eq!(result, Err(ApplyError::StaleSnapshot));
    }

    #[test]
    fn test_insert_into_self_closing_expands_it() {
        let output = apply("<Card />", |s| {
            let card = id_of(s, "<Card />");
            vec![
                Mutation::InsertNode {
                    parent_id: card.clone(),
                    index: 0,
                    fragment: "<A />".to_string(),
                },
                Mutation::InsertNode {
                    parent_id: card,
                    index: 0,
                    fragment: "<B />".to_string(),
                },
            ]
        })
        .unwrap();

        assert_eq!(output, "<Card><A /><B /></Card>");
    }

    #[test]
    fn test_insert_copies_separator() {
        let source = "<List>\n  <A />\n  <B />\n</List>";
        let output = apply(source, |s| {
            vec![Mutation::InsertNode {
                parent_id: id_of(s, "<List>\n  <A />\n  <B />\n</List>"),
                index: 2,
                fragment: "<C />".to_string(),
            }]
        })
        .unwrap();

        assert_eq!(output, "<List>\n  <A />\n  <B />\n  <C />\n</List>");
    }

    #[test]
    fn test_set_text_escapes_markup() {
        let output = apply("<P>old</P>", |s| {
            vec![Mutation::SetText {
                id: id_of(s, "old"),
                text: "a < b {c}".to_string(),
            }]
        })
        .unwrap();

        assert_eq!(output, "<P>a &lt; b &#123;c&#125;</P>");
    }

    #[test]
    fn test_set_text_rewrites_only_the_changed_run() {
        let cases = [
            ("Hello <!-- keep --> world\n", "Hello! <!-- keep --> world", "Hello! <!-- keep --> world\n"),
            ("a < b", "x a < b", "x a < b"),
            ("a < b", "a < b <", "a < b &lt;"),
            ("héllo", "hello", "hello"),
        ];

        for (source, text, expected) in cases {
            let output = apply(source, |s| {
                vec![Mutation::SetText {
                    id: id_of(s, source.trim_end()),
                    text: text.to_string(),
                }]
            })
            .unwrap();

            assert_eq!(output, expected);
        }
    }

    #[test]
    fn test_set_text_to_same_text_is_identity() {
        let source = "Note: a < b";
        let output = apply(source, |s| {
            vec![Mutation::SetText {
                id: id_of(s, source),
                text: source.to_string(),
            }]
        })
        .unwrap();

        assert_eq!(output, source);
    }

    #[test]
    fn test_set_text_on_expression_keeps_braces() {
        let output = apply("Total: {a + b}", |s| {
            vec![Mutation::SetText {
                id: id_of(s, "{a + b}"),
                text: "a * b".to_string(),
            }]
        })
        .unwrap();

        assert_eq!(output, "Total: {a * b}");
    }

    #[test]
    fn test_set_prop_variants() {
        let source = r#"<Button size='sm' disabled onClick={go}>Go</Button>"#;
        let output = apply(source, |s| {
            let button = id_of(s, source);
            vec![
                Mutation::SetProp {
                    id: button.clone(),
                    name: "size".to_string(),
                    value: AttrValue::Literal("it's".to_string()),
                },
                Mutation::SetProp {
                    id: button.clone(),
                    name: "disabled".to_string(),
                    value: AttrValue::Expression("busy".to_string()),
                },
                Mutation::SetProp {
                    id: button.clone(),
                    name: "onClick".to_string(),
                    value: AttrValue::Flag,
                },
                Mutation::SetProp {
                    id: button,
                    name: "variant".to_string(),
                    value: AttrValue::Literal("primary".to_string()),
                },
            ]
        })
        .unwrap();

        assert_eq!(
            output,
            r#"<Button size='it&#39;s' disabled={busy} onClick variant="primary">Go</Button>"#
        );
    }

    #[test]
    fn test_remove_prop_takes_leading_whitespace() {
        let source = r#"<Input
  name="q"
  required
/>"#;
        let output = apply(source, |s| {
            vec![Mutation::RemoveProp {
                id: id_of(s, source),
                name: "name".to_string(),
            }]
        })
        .unwrap();

        assert_eq!(output, "<Input\n  required\n/>");
    }

    #[test]
    fn test_remove_missing_prop_fails() {
        let result = apply("<A />", |s| {
            vec![Mutation::RemoveProp {
                id: id_of(s, "<A />"),
                name: "nope".to_string(),
            }]
        });

        assert!(matches!(result, Err(ApplyError::PropNotFound { .. })));
    }

    #[test]
    fn test_invalid_prop_name_fails() {
        let result = apply("<A />", |s| {
            vec![Mutation::SetProp {
                id: id_of(s, "<A />"),
                name: "bad name".to_string(),
                value: AttrValue::Flag,
            }]
        });

        assert_eq!(result, Err(ApplyError::InvalidPropName("bad name".to_string())));
    }

    #[test]
    fn test_insert_into_text_fails() {
        let result = apply("<P>text</P>", |s| {
            vec![Mutation::InsertNode {
                parent_id: id_of(s, "text"),
                index: 0,
                fragment: "<A />".to_string(),
            }]
        });

        assert!(matches!(result, Err(ApplyError::InvalidParent(_))));
    }

    #[test]
    fn test_malformed_fragment_is_rejected() {
        let result = apply("<Card></Card>", |s| {
            vec![Mutation::InsertNode {
                parent_id: id_of(s, "<Card></Card>"),
                index: 0,
                fragment: "<Open>".to_string(),
            }]
        });

        assert!(matches!(result, Err(ApplyError::MalformedResult(_))));
    }

    #[test]
    fn test_unverified_output_is_accepted() {
        let source = "<Card></Card>";
        let snapshot = parse(source);
        let applicator = Applicator::new(
            Parser::default(),
            ApplyOptions {
                verify_output: false,
                ..ApplyOptions::default()
            },
        );
        let mutations = vec![Mutation::InsertNode {
            parent_id: id_of(&snapshot, source),
            index: 0,
            fragment: "<Open>".to_string(),
        }];

        assert_eq!(
            applicator.apply(source, &snapshot, &mutations).unwrap(),
            "<Card><Open></Card>"
        );
    }

    #[test]
    fn test_root_cannot_be_deleted() {
        let result = apply("<A />", |s| {
            vec![Mutation::DeleteNode {
                id: s.root().unwrap().id.clone(),
            }]
        });

        assert!(matches!(result, Err(ApplyError::NotAChild(_))));
    }

    const CARD: &str = "<Card>\n  <A />\n</Card>\n<Other />\n";

    #[test]
    fn test_insert_into_deleted_parent_fails() {
        let card = "<Card>\n  <A />\n</Card>";
        let result = apply(CARD, |s| {
            vec![
                Mutation::DeleteNode { id: id_of(s, card) },
                Mutation::InsertNode {
                    parent_id: id_of(s, card),
                    index: 0,
                    fragment: "<X />".to_string(),
                },
            ]
        });

        let expected = parse(CARD);
        assert_eq!(result, Err(ApplyError::RemovedInBatch(id_of(&expected, card))));
    }

    #[test]
    fn test_targets_inside_removed_subtrees_fail() {
        let card = "<Card>\n  <A />\n</Card>";
        let into_child = apply(CARD, |s| {
            vec![
                Mutation::InsertNode {
                    parent_id: id_of(s, "<A />"),
                    index: 0,
                    fragment: "<X />".to_string(),
                },
                Mutation::DeleteNode { id: id_of(s, card) },
            ]
        });
        let into_moved = apply(CARD, |s| {
            vec![
                Mutation::MoveNode {
                    id: id_of(s, card),
                    new_parent_id: s.root().unwrap().id.clone(),
                    new_index: 2,
                },
                Mutation::MoveNode {
                    id: id_of(s, "<Other />"),
                    new_parent_id: id_of(s, card),
                    new_index: 0,
                },
            ]
        });
        let moved_and_deleted = apply(CARD, |s| {
            vec![
                Mutation::MoveNode {
                    id: id_of(s, "<Other />"),
                    new_parent_id: id_of(s, card),
                    new_index: 0,
                },
                Mutation::DeleteNode {
                    id: id_of(s, "<Other />"),
                },
            ]
        });

        assert!(matches!(into_child, Err(ApplyError::RemovedInBatch(_))));
        assert!(matches!(into_moved, Err(ApplyError::RemovedInBatch(_))));
        assert!(matches!(moved_and_deleted, Err(ApplyError::RemovedInBatch(_))));
    }

    #[test]
    fn test_insert_next_to_deleted_sibling_anchors_on_survivor() {
        let source = "<List>\n  <A />\n  <B />\n  <C />\n</List>";
        let output = apply(source, |s| {
            vec![
                Mutation::DeleteNode {
                    id: id_of(s, "<B />"),
                },
                Mutation::InsertNode {
                    parent_id: id_of(s, source),
                    index: 1,
                    fragment: "<X />".to_string(),
                },
            ]
        })
        .unwrap();

        assert_eq!(output, "<List>\n  <A />\n  <X />\n  <C />\n</List>");
    }

    #[test]
    fn test_edit_inside_deleted_node_fails() {
        let result = apply("<Card><A /></Card>", |s| {
            vec![
                Mutation::DeleteNode {
                    id: id_of(s, "<Card><A /></Card>"),
                },
                Mutation::SetProp {
                    id: id_of(s, "<A />"),
                    name: "x".to_string(),
                    value: AttrValue::Flag,
                },
            ]
        });

        assert!(matches!(result, Err(ApplyError::OverlappingEdits { .. })));
    }
}
