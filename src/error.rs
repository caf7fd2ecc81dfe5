//! Error types for the assembler.

use thiserror::Error;

/// Errors surfaced by the assembly engine and its I/O layer.
///
/// Only the input-validation variants are produced by the graph engine
/// itself; removals of absent nodes or edges are no-ops, never errors.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("invalid k-mer length: expected {expected}, got {found}")]
    InvalidKmerLength { expected: usize, found: usize },

    #[error("invalid node length: expected {expected}, got {found}")]
    InvalidNodeLength { expected: usize, found: usize },

    #[error("graph capacity exceeded: at most {limit} nodes")]
    CapacityExceeded { limit: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AssemblyError {
    pub fn empty_input<S: Into<String>>(message: S) -> Self {
        Self::EmptyInput(message.into())
    }

    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameter(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AssemblyError>;
