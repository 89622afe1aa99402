//! Error types for rendering and batch execution.

use std::sync::Arc;

/// Errors raised while composing, rendering, or executing statements.
///
/// The type is `Clone` so the outcome of a deferred batch can be handed to
/// every handle that observes it. Errors coming from collaborators (the
/// executor, row decoding) are kept behind an `Arc`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A required sub-element was not supplied.
    #[error("{clause}: missing {element}")]
    MissingElement {
        /// The clause or statement being rendered.
        clause: &'static str,
        /// The element that is missing.
        element: &'static str,
    },

    /// An operator was given the wrong number of operands.
    #[error("operator `{operator}` expects {expected} operands, found {found}")]
    OperatorArity {
        /// The operator symbol.
        operator: &'static str,
        /// Human readable arity ("exactly 2", "at least 2").
        expected: &'static str,
        /// Number of operands actually supplied.
        found: usize,
    },

    /// The active dialect cannot express the requested feature.
    #[error("dialect `{dialect}` does not support {feature}")]
    UnsupportedFeature {
        /// Name of the dialect.
        dialect: String,
        /// The feature that was requested.
        feature: &'static str,
    },

    /// An element is present but malformed.
    #[error("{clause}: {reason}")]
    InvalidElement {
        /// The clause or statement being rendered.
        clause: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Two combined outputs bind the same parameter name to different values.
    #[error("parameter `{name}` is bound to different values in combined statements")]
    ParameterCollision {
        /// The colliding parameter name.
        name: String,
    },

    /// An expression node was supplied where a plain value was expected.
    #[error("expected a plain value but found {found}")]
    ParameterMisuse {
        /// The kind of node that was supplied.
        found: &'static str,
    },

    /// The executor returned a different number of result sets than the
    /// number of statements that were queued.
    #[error("executor returned {actual} result sets for {expected} queued statements")]
    ResultCountMismatch {
        /// Result sets expected from the combined statement text.
        expected: usize,
        /// Result sets actually returned.
        actual: usize,
    },

    /// Work was queued against a batch that has already executed.
    #[error("deferred batch has already executed")]
    BatchCompleted,

    /// Work was queued against a batch that is currently executing.
    #[error("deferred batch is executing")]
    BatchExecuting,

    /// The batch execution was dropped before results were delivered.
    #[error("deferred batch was cancelled before results were delivered")]
    Cancelled,

    /// A column could not be read from a row.
    #[error("column `{column}`: {reason}")]
    Column {
        /// Column name or ordinal.
        column: String,
        /// Why the read failed.
        reason: String,
    },

    /// A result processor rejected its row-set.
    #[error("result processor failed: {0}")]
    Processor(String),

    /// The executor failed.
    #[error("executor error: {0}")]
    Executor(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an executor-side error.
    pub fn executor(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Executor(Arc::new(err))
    }

    /// Returns whether this is a structural error in the composed tree or
    /// a capability the dialect lacks.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingElement { .. }
                | Self::OperatorArity { .. }
                | Self::UnsupportedFeature { .. }
                | Self::InvalidElement { .. }
                | Self::ParameterCollision { .. }
        )
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        let err = Error::MissingElement {
            clause: "INSERT",
            element: "target table",
        };
        assert!(err.is_structural());
        assert_eq!(err.to_string(), "INSERT: missing target table");
        assert!(!Error::BatchCompleted.is_structural());
    }

    #[test]
    fn test_executor_error_is_cloneable() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let err = Error::executor(io);
        let copy = err.clone();
        assert_eq!(copy.to_string(), "executor error: connection reset");
    }
}
