//! Code generation errors and advisories.
//!
//! Every [`CodegenError`] aborts the session. An [`Advisory`] records a
//! best-effort fallback; generation continues after it is logged.

use arrc_ir::NodeId;
use std::fmt;

/// Fatal code generation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    /// The type catalog has no lowering for this type shape.
    #[error("unsupported type `{ty}`: {reason}")]
    UnsupportedType { ty: String, reason: &'static str },

    /// The node handlers have no lowering for this node.
    #[error("unsupported AST node `{kind}` (node {node:?})")]
    UnsupportedNode { kind: String, node: NodeId },

    #[error("type `{ty}` has {fields} fields (limit {limit}); consider using an array instead")]
    TypeTooComplex {
        ty: String,
        fields: usize,
        limit: usize,
    },

    #[error("text arena exhausted: capacity {capacity} bytes, {requested} bytes requested")]
    ArenaExhausted { capacity: usize, requested: usize },

    /// `continue_tail` was called on a fragment that is not the arena tail.
    #[error("fragment {fragment} is not the arena tail (tail is {tail:?})")]
    InconsistentContinuation { fragment: u32, tail: Option<u32> },

    /// A representative chain loops or exceeds the configured length.
    #[error("representative chain starting at node {node:?} does not terminate after {steps} steps")]
    InconsistentAlias { node: NodeId, steps: usize },

    #[error("symbol `{name}` has no declared type (node {node:?})")]
    UnresolvedSymbol { name: String, node: NodeId },

    #[error("no function is being lowered")]
    NoCurrentFunction,

    #[error("internal code generator error: {message}")]
    Internal { message: String },
}

impl CodegenError {
    pub fn internal(message: impl Into<String>) -> Self {
        CodegenError::Internal {
            message: message.into(),
        }
    }
}

/// A logged, non-fatal fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    /// Offending node, when the fallback was taken for a specific node.
    pub node: Option<NodeId>,
    pub message: String,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "warning: {} (node {:?})", self.message, node),
            None => write!(f, "warning: {}", self.message),
        }
    }
}
