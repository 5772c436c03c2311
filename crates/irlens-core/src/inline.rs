//! `let` inlining and dead binding elimination.
//!
//! Each `$N` whose binding is known is replaced by the binding's (already
//! inlined) definition when the binding is referenced once, is reference-free,
//! or is simple enough and referenced only a few times. Bindings that end up
//! substituted everywhere are dropped from the output.

use crate::config::InlinePolicy;
use crate::scope::RefTables;
use crate::tree::{Node, Sequence};
use std::collections::HashSet;

/// Result of inlining a node list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inlined {
    pub nodes: Vec<Node>,
    /// Binding ids substituted somewhere in `nodes`
    pub replaced: HashSet<u64>,
}

/// A binding form kept back until the rest of its sequence is processed.
struct PendingLet {
    id: u64,
    /// The rebuilt `(let $N value)` head
    head: Sequence,
    /// Ids substituted inside the binding's own definition
    replaced: HashSet<u64>,
}

impl PendingLet {
    fn value(&self) -> &[Node] {
        &self.head.items[2..]
    }
}

/// Inline references in `nodes` using tables collected from the same tree.
pub fn replace_refs(nodes: &[Node], tables: &RefTables<'_>, policy: &InlinePolicy) -> Inlined {
    Inliner { tables, policy }.replace(nodes, &mut Vec::new())
}

struct Inliner<'t, 'a> {
    tables: &'t RefTables<'a>,
    policy: &'t InlinePolicy,
}

impl Inliner<'_, '_> {
    /// A reference-free binding nothing refers to.
    fn is_unused_leaf(&self, id: u64) -> bool {
        self.tables.count(id) == 0 && self.tables.binding(id).is_some_and(|m| m.is_leaf)
    }

    /// `defining` holds the bindings whose definitions are being rebuilt;
    /// references to them are never expanded.
    fn replace(&self, nodes: &[Node], defining: &mut Vec<u64>) -> Inlined {
        let mut rebuilt = Vec::with_capacity(nodes.len());
        let mut replaced = HashSet::new();
        let mut pending = Vec::new();

        for node in nodes {
            match node {
                Node::Seq(seq) => match seq.split_binding() {
                    Some((id, head, scope)) => {
                        defining.push(id);
                        let inner = self.replace(head, defining);
                        defining.pop();
                        pending.push(PendingLet {
                            id,
                            head: seq.with_items(inner.nodes),
                            replaced: inner.replaced,
                        });

                        let scope = self.replace(scope, defining);
                        replaced.extend(scope.replaced);
                        rebuilt.extend(scope.nodes);
                    }
                    None => {
                        let inner = self.replace(&seq.items, defining);
                        replaced.extend(inner.replaced);
                        rebuilt.push(Node::Seq(seq.with_items(inner.nodes)));
                    }
                },
                Node::Ref(id) => match self.tables.binding(*id) {
                    Some(binding) if !defining.contains(id) => {
                        defining.push(*id);
                        let definition = self.replace(binding.definition, defining);
                        // A copy still naming a binding under construction
                        // would leave that reference without its `let`.
                        let cyclic = mentions_any(&definition.nodes, defining);
                        defining.pop();

                        let count = self.tables.count(*id);
                        let substitute = !cyclic
                            && (count == 1
                                || binding.is_leaf
                                || (count <= self.policy.max_simple_refs
                                    && simple_enough(&definition.nodes, self.policy)));

                        if substitute {
                            rebuilt.extend(definition.nodes);
                            replaced.insert(*id);
                            replaced.extend(definition.replaced);
                        } else {
                            rebuilt.push(node.clone());
                        }
                    }
                    _ => rebuilt.push(node.clone()),
                },
                Node::Atom(_) => rebuilt.push(node.clone()),
            }
        }

        // Filter back to front: a kept binding's own substitutions count as
        // downstream for the bindings before it.
        let mut kept = vec![false; pending.len()];
        for (i, binding) in pending.iter().enumerate().rev() {
            if !replaced.contains(&binding.id) && !self.is_unused_leaf(binding.id) {
                replaced.extend(binding.replaced.iter().copied());
                kept[i] = true;
            }
        }

        // Bring back dropped bindings that the output still refers to.
        let mut live = HashSet::new();
        collect_ref_ids(&rebuilt, &mut live);
        for binding in pending.iter().zip(&kept).filter_map(|(b, &k)| k.then_some(b)) {
            collect_ref_ids(binding.value(), &mut live);
        }
        let mut revived = true;
        while revived {
            revived = false;
            for (binding, keep) in pending.iter().zip(kept.iter_mut()) {
                if !*keep && live.contains(&binding.id) {
                    *keep = true;
                    revived = true;
                    replaced.extend(binding.replaced.iter().copied());
                    collect_ref_ids(binding.value(), &mut live);
                }
            }
        }

        let mut nodes: Vec<Node> = pending
            .into_iter()
            .zip(kept)
            .filter_map(|(binding, keep)| keep.then(|| Node::Seq(binding.head)))
            .collect();
        nodes.append(&mut rebuilt);
        Inlined { nodes, replaced }
    }
}

/// Whether any `$N` in `nodes` names one of `ids`.
fn mentions_any(nodes: &[Node], ids: &[u64]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Seq(seq) => mentions_any(&seq.items, ids),
        Node::Ref(id) => ids.contains(id),
        Node::Atom(_) => false,
    })
}

fn collect_ref_ids(nodes: &[Node], ids: &mut HashSet<u64>) {
    for node in nodes {
        match node {
            Node::Seq(seq) => collect_ref_ids(&seq.items, ids),
            Node::Ref(id) => {
                ids.insert(*id);
            }
            Node::Atom(_) => {}
        }
    }
}

/// Whether an inlined definition is cheap enough to duplicate.
pub fn simple_enough(nodes: &[Node], policy: &InlinePolicy) -> bool {
    nodes.iter().all(|node| match node {
        Node::Seq(seq) => match seq.operator() {
            Some(operator @ "lambda") => {
                is_identity_lambda(seq).unwrap_or_else(|| policy.is_trivial(operator))
            }
            Some(operator) => policy.is_trivial(operator),
            None => simple_enough(&seq.items, policy),
        },
        Node::Ref(_) | Node::Atom(_) => true,
    })
}

/// `None` when `seq` has no parameter list, otherwise whether the body is
/// exactly the parameters in order.
fn is_identity_lambda(seq: &Sequence) -> Option<bool> {
    let params = seq.items.get(1)?.as_seq()?;
    let params = params.items.iter().filter(|node| matches!(node, Node::Ref(_)));
    let body = &seq.items[2..];
    Some(body.iter().eq(params))
}
