//! IR dump tree types.

/// The kind of value an [`Atom`] holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomKind {
    /// Bare symbol (`Map`, `let`, `-`, ...)
    Symbol(String),
    /// Run of decimal digits without leading zeros
    Number(String),
    /// Quoted string literal, unescaped
    Str(String),
}

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub kind: AtomKind,
    /// Preceded by `'` in the source
    pub quoted: bool,
}

/// A parenthesized list of nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sequence {
    pub items: Vec<Node>,
    /// Preceded by `'` in the source
    pub quoted: bool,
}

/// A node of the IR dump tree.
///
/// Every pass matches on this exhaustively, so a new variant has to be
/// handled at each traversal site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Seq(Sequence),
    Atom(Atom),
    /// `$N`, a reference to a `let` binding
    Ref(u64),
}

impl Atom {
    /// Creates an unquoted symbol.
    pub fn symbol(text: impl Into<String>) -> Self {
        Atom {
            kind: AtomKind::Symbol(text.into()),
            quoted: false,
        }
    }

    /// Creates an unquoted number.
    pub fn number(digits: impl Into<String>) -> Self {
        Atom {
            kind: AtomKind::Number(digits.into()),
            quoted: false,
        }
    }

    /// Creates an unquoted string literal.
    pub fn string(text: impl Into<String>) -> Self {
        Atom {
            kind: AtomKind::Str(text.into()),
            quoted: false,
        }
    }

    /// Returns a copy marked as quoted.
    pub fn quote(mut self) -> Self {
        self.quoted = true;
        self
    }

    /// Returns the symbol text if this atom can act as an operator.
    pub fn as_operator(&self) -> Option<&str> {
        match &self.kind {
            AtomKind::Symbol(text) if !self.quoted => Some(text),
            _ => None,
        }
    }
}

impl Sequence {
    pub fn new(items: Vec<Node>) -> Self {
        Sequence {
            items,
            quoted: false,
        }
    }

    /// Creates a sequence marked as quoted.
    pub fn new_quoted(items: Vec<Node>) -> Self {
        Sequence {
            items,
            quoted: true,
        }
    }

    /// Returns a sequence with the same quoting but different children.
    pub fn with_items(&self, items: Vec<Node>) -> Self {
        Sequence {
            items,
            quoted: self.quoted,
        }
    }

    /// Returns the operator: the first child if it is an unquoted symbol.
    pub fn operator(&self) -> Option<&str> {
        match self.items.first() {
            Some(Node::Atom(atom)) => atom.as_operator(),
            _ => None,
        }
    }

    /// Returns the binding id if this is a `(let $N value ...)` form.
    pub fn binding_id(&self) -> Option<u64> {
        if self.items.len() <= 2 || self.operator() != Some("let") {
            return None;
        }
        match self.items[1] {
            Node::Ref(id) => Some(id),
            _ => None,
        }
    }

    /// Splits a binding form into its `(let $N value)` head and the nodes
    /// after the value, which behave as siblings following the binding.
    pub fn split_binding(&self) -> Option<(u64, &[Node], &[Node])> {
        let id = self.binding_id()?;
        let (head, scope) = self.items.split_at(3);
        Some((id, head, scope))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Node {
    /// Shorthand for an unquoted symbol node.
    pub fn symbol(text: impl Into<String>) -> Self {
        Node::Atom(Atom::symbol(text))
    }

    /// Shorthand for an unquoted sequence node.
    pub fn seq(items: Vec<Node>) -> Self {
        Node::Seq(Sequence::new(items))
    }

    pub fn as_seq(&self) -> Option<&Sequence> {
        match self {
            Node::Seq(seq) => Some(seq),
            _ => None,
        }
    }

    /// Returns the operator if this node is a sequence with one.
    pub fn operator(&self) -> Option<&str> {
        self.as_seq().and_then(Sequence::operator)
    }
}

impl From<Atom> for Node {
    fn from(atom: Atom) -> Self {
        Node::Atom(atom)
    }
}

impl From<Sequence> for Node {
    fn from(seq: Sequence) -> Self {
        Node::Seq(seq)
    }
}
