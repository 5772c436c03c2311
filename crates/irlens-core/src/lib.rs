//! Pretty-printer for S-expression IR dumps.
//!
//! Turns a compiler or query-plan dump such as
//!
//! ```text
//! (
//! (let $1 (KqpTable '"/Root/t" '"" '"" '1))
//! (let $2 (DqPhyStage '() (lambda '() (KqpReadTable $1)) '()))
//! (return (KqpPhysicalQuery '('(KqpPhysicalTx '($2) '() '())) '()))
//! )
//! ```
//!
//! into an indented listing where single-use and trivial `let` bindings are
//! inlined, `(block '((return ...)))` wrappers are unwrapped and arguments of
//! known callables are labelled with their schema names.
//!
//! The pipeline is [`parse`] -> [`collect_refs`] -> [`replace_refs`] ->
//! [`simplify_blocks`] -> [`Printer`], driven by [`Formatter`].

pub mod config;
mod error;
pub mod inline;
pub mod parser;
mod pipeline;
pub mod print;
pub mod schema;
pub mod scope;
pub mod simplify;
pub mod tree;

pub use config::{ConfigError, FormatConfig, InlinePolicy, PrintConfig, ResolverConfig};
pub use error::Error;
pub use inline::{Inlined, replace_refs, simple_enough};
pub use parser::{ParseError, parse};
pub use pipeline::Formatter;
pub use print::{PrintOptions, Printer};
pub use schema::{CallableIndex, ChildNames, NodeDescriptor, Schema, SchemaError};
pub use scope::{Macro, RefTables, collect_refs};
pub use simplify::simplify_blocks;
pub use tree::{Atom, AtomKind, Node, Sequence};
