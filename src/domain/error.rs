//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Fatal document conditions.
///
/// Any of these means the document cannot be regenerated safely; the run stops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("line {line}: badly formed menu: {reason}")]
    MalformedMenu { line: usize, reason: String },

    #[error("line {line}: unexpected end of input inside menu")]
    UnterminatedMenu { line: usize },

    #[error("line {line}: menu before a node")]
    MenuBeforeNode { line: usize },

    #[error("line {line}: preceding node '{node}' has no inferior nodes")]
    NoInferiorNodes { node: String, line: usize },

    #[error("unknown node '{0}'")]
    UnknownNode(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
