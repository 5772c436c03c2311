//! Node schema loading and the callable index.
//!
//! Schema files describe expression node kinds:
//!
//! ```json
//! {"Nodes": [
//!   {"Name": "TCoMap", "Base": "TCoInputBase",
//!    "Match": {"Type": "Callable", "Name": "Map"},
//!    "Children": [{"Index": 1, "Name": "Lambda"}]}
//! ]}
//! ```
//!
//! The printer only needs the resolved [`CallableIndex`]: operator symbol to
//! child names by argument position, with inheritance flattened.

use crate::config::ResolverConfig;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Child names by argument position.
pub type ChildNames = BTreeMap<usize, String>;

/// Errors that can occur while loading a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid schema: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(rename = "Nodes", default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawNode {
    name: Option<String>,
    base: Option<String>,
    #[serde(rename = "Match")]
    matcher: Option<RawMatch>,
    #[serde(default)]
    children: Vec<RawChild>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMatch {
    #[serde(rename = "Type")]
    kind: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawChild {
    index: Option<usize>,
    name: Option<String>,
}

/// One expression node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub name: String,
    /// Parent node kind
    pub base: Option<String>,
    /// Operator symbol this node kind matches
    pub callable: Option<String>,
    pub children: ChildNames,
}

impl NodeDescriptor {
    fn from_raw(raw: RawNode) -> Option<Self> {
        let name = raw.name.filter(|name| !name.is_empty())?;
        let callable = raw
            .matcher
            .filter(|m| m.kind.as_deref() == Some("Callable"))
            .and_then(|m| m.name)
            .filter(|name| !name.is_empty());
        let children = raw
            .children
            .into_iter()
            .filter_map(|child| Some((child.index?, child.name.filter(|n| !n.is_empty())?)))
            .collect();
        Some(Self {
            name,
            base: raw.base.filter(|base| !base.is_empty()),
            callable,
            children,
        })
    }
}

/// Node descriptors by name, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    nodes: Vec<NodeDescriptor>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one schema document. Records without a name are skipped.
    pub fn from_json(contents: &str) -> Result<Self, SchemaError> {
        let raw: RawSchema = serde_json::from_str(contents.trim())?;
        let mut schema = Self::new();
        for node in raw.nodes.into_iter().filter_map(NodeDescriptor::from_raw) {
            schema.insert(node);
        }
        Ok(schema)
    }

    /// Load one schema file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let schema = Self::from_json(&contents)?;
        debug!(path = %path.display(), nodes = schema.len(), "loaded schema");
        Ok(schema)
    }

    /// Add or replace a node. A replaced node keeps its original position.
    pub fn insert(&mut self, node: NodeDescriptor) {
        match self.by_name.get(&node.name) {
            Some(&index) => self.nodes[index] = node,
            None => {
                self.by_name.insert(node.name.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    /// Merge a later source; its nodes override same-named ones.
    pub fn merge(&mut self, other: Schema) {
        for node in other.nodes {
            self.insert(node);
        }
    }

    pub fn get(&self, name: &str) -> Option<&NodeDescriptor> {
        self.by_name.get(name).map(|&index| &self.nodes[index])
    }

    pub fn nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child names of `node` merged with its base chain; nearer entries win.
    pub fn inherited_children(&self, node: &NodeDescriptor) -> ChildNames {
        let mut children = node.children.clone();
        let mut seen = HashSet::from([node.name.as_str()]);
        let mut base = node.base.as_deref();
        while let Some(parent) = base.and_then(|name| self.get(name)) {
            if !seen.insert(parent.name.as_str()) {
                break;
            }
            for (index, name) in &parent.children {
                children.entry(*index).or_insert_with(|| name.clone());
            }
            base = parent.base.as_deref();
        }
        children
    }
}

/// Operator symbol to child names, read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallableIndex {
    callables: HashMap<String, ChildNames>,
}

impl CallableIndex {
    /// Resolve `schema` into an index.
    ///
    /// Hardcoded gap entries are added when missing, inheritance is
    /// flattened, marker-only entries are dropped, then aliases are added.
    pub fn build(schema: &Schema, config: &ResolverConfig) -> Self {
        let mut schema = schema.clone();
        for gap in &config.hardcoded {
            if schema.get(&gap.callable).is_none() {
                schema.insert(NodeDescriptor {
                    name: gap.callable.clone(),
                    base: None,
                    callable: Some(gap.callable.clone()),
                    children: gap.children.iter().cloned().enumerate().collect(),
                });
            }
        }

        let mut callables = HashMap::new();
        for node in schema.nodes() {
            let Some(callable) = &node.callable else {
                continue;
            };
            let children = schema.inherited_children(node);
            if is_marker(&children, config) {
                continue;
            }
            callables.insert(callable.clone(), children);
        }

        for alias in &config.aliases {
            if callables.contains_key(&alias.alias) {
                continue;
            }
            if let Some(children) = callables.get(&alias.original).cloned() {
                callables.insert(alias.alias.clone(), children);
            }
        }

        debug!(nodes = schema.len(), callables = callables.len(), "built callable index");
        Self { callables }
    }

    /// Child names of `operator`'s arguments, by position after the operator.
    pub fn children(&self, operator: &str) -> Option<&ChildNames> {
        self.callables.get(operator)
    }

    pub fn contains(&self, operator: &str) -> bool {
        self.callables.contains_key(operator)
    }

    pub fn len(&self) -> usize {
        self.callables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }
}

/// Entries that only disambiguate type matching and name nothing useful.
fn is_marker(children: &ChildNames, config: &ResolverConfig) -> bool {
    match children.len() {
        1 => children
            .get(&0)
            .is_some_and(|name| config.marker_children.contains(name)),
        2 => children.get(&0).is_some_and(|name| name == "Left"),
        _ => false,
    }
}
