//! Formatting heuristics.
//!
//! The operator allow-lists and thresholds were tuned against one IR dialect
//! (YQL / KQP query plans). They are plain data so they can be swapped per
//! invocation, either in code or from a TOML file:
//!
//! ```toml
//! [inline]
//! max_simple_refs = 2
//! trivial_operators = ["Int32", "String", "+"]
//!
//! [print]
//! long_operators = ["Map", "Filter"]
//!
//! [[schema.hardcoded]]
//! callable = "WideTakeBlocks"
//! children = ["Input", "Count"]
//! ```
//!
//! Every section and field is optional and falls back to the defaults below.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a heuristics file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// All tunable heuristics of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub inline: InlinePolicy,
    pub print: PrintConfig,
    pub schema: ResolverConfig,
}

/// When a multiply-referenced binding may still be inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlinePolicy {
    /// Maximum reference count for inlining a "simple enough" definition
    pub max_simple_refs: usize,
    /// Operators whose calls never make a definition too complex to inline
    pub trivial_operators: BTreeSet<String>,
}

/// Layout heuristics of the printer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Operators laid out one argument per line
    pub long_operators: BTreeSet<String>,
}

/// A callable missing from the schema sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardcodedCallable {
    pub callable: String,
    /// Child names by position
    pub children: Vec<String>,
}

/// An operator that reuses another operator's child names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallableAlias {
    pub alias: String,
    pub original: String,
}

/// Fixups applied while building the callable index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Names that make a single-child entry a pure type marker
    pub marker_children: BTreeSet<String>,
    pub hardcoded: Vec<HardcodedCallable>,
    pub aliases: Vec<CallableAlias>,
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for InlinePolicy {
    fn default() -> Self {
        Self {
            max_simple_refs: 3,
            trivial_operators: names(&[
                "OptionalType",
                "StructType",
                "DataType",
                "ResourceType",
                "TupleType",
                "ListType",
                "CallableType",
                "VoidType",
                "Void",
                "BlockType",
                "Nothing",
                "SafeCast",
                "String",
                "-",
                "+",
                "*",
                "/",
                "Int32",
            ]),
        }
    }
}

impl InlinePolicy {
    pub fn is_trivial(&self, operator: &str) -> bool {
        self.trivial_operators.contains(operator)
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            long_operators: names(&[
                "DqCnHashShuffle",
                "DqCnMerge",
                "DqReplicate",
                "KqpPhysicalQuery",
                "KqpBlockReadOlapTableRanges",
                "KqpPhysicalTx",
                "KqpTxResultBinding",
                "DqPhyStage",
                "DqPhyHashCombine",
                "WideCombiner",
                "BlockHashJoinCore",
                "BlockAsStruct",
                "BlockMergeFinalizeHashed",
                "BlockCombineHashed",
                "TopSort",
                "Map",
                "NarrowMap",
                "WideMap",
                "WideFilter",
                "ExpandMap",
                "Condense",
                "WideCondense",
                "Condense1",
                "WideCondense1",
                "KqpOlapFilter",
                "KqpOlapAnd",
                "StructType",
                "AsStruct",
                "Udf",
                "Apply",
                "List",
                "AsList",
                "RangeCreate",
                "RangeFinalize",
                "RangeMultiply",
                "RangeIntersect",
                "RangeUnion",
                "If",
                "IfPresent",
                "TupleType",
            ]),
        }
    }
}

impl PrintConfig {
    pub fn is_long(&self, operator: &str) -> bool {
        self.long_operators.contains(operator)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            marker_children: names(&[
                "Literal",
                "Type",
                "ItemType",
                "OptionalType",
                "Input",
                "Apply",
                "Callable",
            ]),
            hardcoded: vec![HardcodedCallable {
                callable: "WideTakeBlocks".into(),
                children: vec!["Input".into(), "Count".into()],
            }],
            aliases: vec![CallableAlias {
                alias: "WideCondense1".into(),
                original: "Condense1".into(),
            }],
        }
    }
}

impl FormatConfig {
    /// Parse a heuristics file's contents.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load heuristics from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}
