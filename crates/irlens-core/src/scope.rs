//! Binding and reference analysis.
//!
//! A `(let $N value)` sequence binds `$N` to `value` for the rest of the
//! enclosing sequence. The tables built here borrow definitions from the
//! analyzed tree.

use crate::tree::{Node, Sequence};
use std::collections::HashMap;

/// A binding's definition.
#[derive(Debug, Clone, Copy)]
pub struct Macro<'a> {
    pub definition: &'a [Node],
    /// No `$N` anywhere in the definition
    pub is_leaf: bool,
}

/// Bindings and reference counts of one program.
#[derive(Debug, Clone, Default)]
pub struct RefTables<'a> {
    pub bindings: HashMap<u64, Macro<'a>>,
    pub counts: HashMap<u64, usize>,
    pub is_leaf: bool,
}

impl<'a> RefTables<'a> {
    /// Number of `$id` occurrences in the whole program.
    pub fn count(&self, id: u64) -> usize {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    pub fn binding(&self, id: u64) -> Option<&Macro<'a>> {
        self.bindings.get(&id)
    }

    fn absorb(&mut self, other: RefTables<'a>) {
        self.is_leaf &= other.is_leaf;
        // Duplicate ids are undefined upstream; the later definition wins.
        self.bindings.extend(other.bindings);
        for (id, count) in other.counts {
            *self.counts.entry(id).or_insert(0) += count;
        }
    }
}

/// Collect the binding table and reference counts of `seq`.
///
/// For a binding form the definition is its value; any nodes after the value
/// are scanned like siblings that follow the binding.
pub fn collect_refs(seq: &Sequence) -> RefTables<'_> {
    match seq.split_binding() {
        Some((id, head, scope)) => {
            let definition = &head[2..];
            let mut tables = scan(definition);
            tables.bindings.insert(
                id,
                Macro {
                    definition,
                    is_leaf: tables.is_leaf,
                },
            );
            tables.absorb(scan(scope));
            tables
        }
        None => scan(&seq.items),
    }
}

fn scan(nodes: &[Node]) -> RefTables<'_> {
    let mut tables = RefTables {
        is_leaf: true,
        ..Default::default()
    };
    for node in nodes {
        match node {
            Node::Seq(sub) => tables.absorb(collect_refs(sub)),
            Node::Ref(id) => {
                tables.is_leaf = false;
                *tables.counts.entry(*id).or_insert(0) += 1;
            }
            Node::Atom(_) => {}
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_counts_across_nesting() {
        let root = parse("(a $1 (b $1 (c $2)) $1)").unwrap();
        let tables = collect_refs(&root);
        assert_eq!(tables.count(1), 3);
        assert_eq!(tables.count(2), 1);
        assert_eq!(tables.count(3), 0);
        assert!(!tables.is_leaf);
        assert!(tables.bindings.is_empty());
    }

    #[test]
    fn test_binding_definition_and_leafness() {
        let root = parse("(block '((let $1 (Int32 '1)) (let $2 (Add $1 $1)) (return $2)))").unwrap();
        let tables = collect_refs(&root);

        let leaf = tables.binding(1).unwrap();
        assert!(leaf.is_leaf);
        assert_eq!(leaf.definition.len(), 1);
        assert_eq!(leaf.definition[0].operator(), Some("Int32"));

        let non_leaf = tables.binding(2).unwrap();
        assert!(!non_leaf.is_leaf);
        assert_eq!(non_leaf.definition[0].operator(), Some("Add"));

        // The binding's own `$N` is not an occurrence
        assert_eq!(tables.count(1), 2);
        assert_eq!(tables.count(2), 1);
        assert_eq!(tables.bindings.len(), 2);
    }

    #[test]
    fn test_nodes_after_value_are_scope_not_definition() {
        let root = parse("((let $1 (Foo) (Bar $3 $1) Baz))").unwrap();
        let tables = collect_refs(&root);
        let binding = tables.binding(1).unwrap();
        assert_eq!(binding.definition.len(), 1);
        assert!(binding.is_leaf);
        assert_eq!(tables.count(1), 1);
        assert_eq!(tables.count(3), 1);
        assert!(!tables.is_leaf);
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let root = parse("((let $1 (First)) (let $1 (Second)))").unwrap();
        let tables = collect_refs(&root);
        assert_eq!(tables.binding(1).unwrap().definition[0].operator(), Some("Second"));
    }
}
