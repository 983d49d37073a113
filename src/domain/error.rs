//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the condition-tree model.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node is not a group: {0}")]
    NotAGroup(String),

    #[error("node is not a condition: {0}")]
    NotALeaf(String),

    #[error("the root group cannot be {0}")]
    RootImmutable(&'static str),

    #[error("invalid node path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unknown combinator '{0}' (expected all or any)")]
    UnknownCombinator(String),

    #[error("condition document root must be an all/any group")]
    RootNotGroup,

    #[error("node at {at} has both 'all' and 'any' keys")]
    AmbiguousCombinator { at: String },

    #[error("node at {at} is neither an all/any group nor a fact condition")]
    UnrecognizedNode { at: String },

    #[error("invalid shape at {at}: {reason}")]
    InvalidShape { at: String, reason: String },

    #[error("invalid condition at {at}: {reason}")]
    InvalidLeaf { at: String, reason: String },

    #[error("invalid rule: {0}")]
    InvalidRule(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
