//! Node identity across snapshots.
//!
//! A reparse builds a brand-new arena. Ids are then carried over from the
//! previous tree by matching nodes structurally, top-down, and falling back
//! to a global unique-fingerprint pass for nodes that moved.

use crate::ast::{NodeRef, PropValue, Tree};
use crate::id_generator::IDGenerator;
use crc32fast::Hasher;
use std::collections::HashMap;

/// CRC32 over kind, tag and the node's exact source text
pub(crate) fn fingerprint(tree: &Tree, node: NodeRef, source: &str) -> u32 {
    let n = tree.get(node);
    let mut hasher = Hasher::new();
    hasher.update(&[n.kind.code()]);
    hasher.update(n.tag.as_deref().unwrap_or_default().as_bytes());
    hasher.update(&[0]);
    hasher.update(n.span.slice(source).as_bytes());
    hasher.finalize()
}

pub(crate) fn assign_fresh_ids(tree: &mut Tree, ids: &mut IDGenerator) {
    let mut assigned = vec![String::new(); tree.len()];
    for node in tree.descendants(tree.root()) {
        assigned[node.index()] = ids.new_id();
    }
    fill_unassigned(&mut assigned, ids);

    let seed = ids.seed().to_string();
    tree.set_ids(assigned, &seed, ids.count());
}

pub(crate) fn carry_over_ids(
    tree: &mut Tree,
    source: &str,
    previous: &Tree,
    previous_source: &str,
    ids: &mut IDGenerator,
) {
    let matched = Matcher::new(tree, source, previous, previous_source).run();

    let mut assigned = vec![String::new(); tree.len()];
    for node in tree.descendants(tree.root()) {
        assigned[node.index()] = match matched[node.index()] {
            Some(old) => previous.get(old).id.clone(),
            None => ids.new_id(),
        };
    }
    fill_unassigned(&mut assigned, ids);

    let seed = ids.seed().to_string();
    tree.set_ids(assigned, &seed, ids.count());
}

fn fill_unassigned(assigned: &mut [String], ids: &mut IDGenerator) {
    for id in assigned.iter_mut().filter(|id| id.is_empty()) {
        *id = ids.new_id();
    }
}

struct Matcher<'a> {
    new: &'a Tree,
    old: &'a Tree,
    new_prints: Vec<u32>,
    old_prints: Vec<u32>,
    /// new arena index -> matched old node
    matched: Vec<Option<NodeRef>>,
    /// old arena index -> already claimed
    used: Vec<bool>,
    pending: Vec<(NodeRef, NodeRef)>,
}

impl<'a> Matcher<'a> {
    fn new(new: &'a Tree, new_source: &str, old: &'a Tree, old_source: &str) -> Self {
        let new_prints = new
            .iter()
            .map(|(r, _)| fingerprint(new, r, new_source))
            .collect();
        let old_prints = old
            .iter()
            .map(|(r, _)| fingerprint(old, r, old_source))
            .collect();

        Self {
            new,
            old,
            new_prints,
            old_prints,
            matched: vec![None; new.len()],
            used: vec![false; old.len()],
            pending: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Option<NodeRef>> {
        self.link(self.new.root(), self.old.root());

        loop {
            while let Some((new, old)) = self.pending.pop() {
                self.match_children(new, old);
                self.match_props(new, old);
            }
            if !self.global_pass() {
                break;
            }
        }

        self.matched
    }

    fn link(&mut self, new: NodeRef, old: NodeRef) {
        self.matched[new.index()] = Some(old);
        self.used[old.index()] = true;
        self.pending.push((new, old));
    }

    fn is_free(&self, new: NodeRef, old: NodeRef) -> bool {
        self.matched[new.index()].is_none() && !self.used[old.index()]
    }

    fn same_shape(&self, new: NodeRef, old: NodeRef) -> bool {
        let (n, o) = (self.new.get(new), self.old.get(old));
        n.kind == o.kind && n.tag == o.tag
    }

    fn match_children(&mut self, new: NodeRef, old: NodeRef) {
        let (new_tree, old_tree) = (self.new, self.old);
        let new_children = new_tree.children(new);
        let old_children = old_tree.children(old);

        // In order, by fingerprint
        let mut cursor = 0;
        for &child in new_children {
            let print = self.new_prints[child.index()];
            let hit = old_children[cursor..]
                .iter()
                .position(|&c| self.is_free(child, c) && self.old_prints[c.index()] == print);

            if let Some(offset) = hit {
                self.link(child, old_children[cursor + offset]);
                cursor += offset + 1;
            }
        }

        // Same slot, same shape
        for (index, &child) in new_children.iter().enumerate() {
            if let Some(&candidate) = old_children.get(index) {
                if self.is_free(child, candidate) && self.same_shape(child, candidate) {
                    self.link(child, candidate);
                }
            }
        }
    }

    fn match_props(&mut self, new: NodeRef, old: NodeRef) {
        let (new_tree, old_tree) = (self.new, self.old);
        let old_node = old_tree.get(old);

        for prop in &new_tree.get(new).props {
            let PropValue::Node { node: nested } = prop.value else {
                continue;
            };
            let Some(PropValue::Node { node: candidate }) =
                old_node.prop(&prop.name).map(|p| &p.value)
            else {
                continue;
            };
            if self.is_free(nested, *candidate) && self.same_shape(nested, *candidate) {
                self.link(nested, *candidate);
            }
        }
    }

    /// Match leftover nodes whose fingerprint is unique on both sides.
    /// Returns whether anything new was linked.
    fn global_pass(&mut self) -> bool {
        let mut new_counts: HashMap<u32, usize> = HashMap::new();
        for (node, _) in self.new.iter() {
            if self.matched[node.index()].is_none() {
                *new_counts.entry(self.new_prints[node.index()]).or_default() += 1;
            }
        }

        let mut old_free: HashMap<u32, Vec<NodeRef>> = HashMap::new();
        for (node, _) in self.old.iter() {
            if !self.used[node.index()] {
                old_free
                    .entry(self.old_prints[node.index()])
                    .or_default()
                    .push(node);
            }
        }

        let new_tree = self.new;
        let mut linked = false;
        for (node, _) in new_tree.iter() {
            if self.matched[node.index()].is_some() {
                continue;
            }
            let print = self.new_prints[node.index()];
            if new_counts.get(&print) != Some(&1) {
                continue;
            }
            if let Some([candidate]) = old_free.get(&print).map(Vec::as_slice) {
                self.link(node, *candidate);
                linked = true;
            }
        }

        linked
    }
}
