//! Crate-level error type.

use crate::config::ConfigError;
use crate::parser::ParseError;
use crate::schema::SchemaError;
use thiserror::Error;

/// Any failure of a formatting run. None of them are recoverable.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
