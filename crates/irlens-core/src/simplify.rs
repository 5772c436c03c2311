//! Block unwrapping.

use crate::tree::{Node, Sequence};

/// Replace every `(block '((return a b c)))` with `a b c`.
///
/// Returns a new node list; children are simplified before their parent is
/// checked, so nested blocks collapse in a single pass.
pub fn simplify_blocks(nodes: &[Node]) -> Vec<Node> {
    let mut result = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Seq(seq) => match returned_values(seq) {
                Some(values) => result.extend(simplify_blocks(values)),
                None => result.push(Node::Seq(seq.with_items(simplify_blocks(&seq.items)))),
            },
            Node::Atom(_) | Node::Ref(_) => result.push(node.clone()),
        }
    }
    result
}

/// The values after `return` if `seq` is a collapsible block.
fn returned_values(seq: &Sequence) -> Option<&[Node]> {
    if seq.quoted || seq.len() != 2 || seq.operator() != Some("block") {
        return None;
    }
    let body = seq.items[1].as_seq()?;
    let [statement] = body.items.as_slice() else {
        return None;
    };
    let statement = statement.as_seq()?;
    (statement.operator() == Some("return")).then(|| &statement.items[1..])
}
