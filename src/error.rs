//! Errors raised by statement semantics and abstract domains.
//!
//! Only *unsupported constructs* are reported as errors: a statement or expression shape
//! that a domain cannot interpret. Broken invariants (e.g. combining stores over different
//! variables) are programming errors and panic instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("assignment to `{target}` is not supported, the left-hand side must be a variable")]
    UnsupportedAssignment { target: String },

    #[error("call to user-defined function `{name}` is not supported")]
    UnsupportedCall { name: String },

    #[error("built-in `{callee}` expects {expected} argument(s), got {found}")]
    InvalidArity {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("{domain} cannot evaluate expression `{expression}`")]
    UnsupportedExpression {
        domain: &'static str,
        expression: String,
    },

    #[error("{domain} does not support {operation}")]
    UnsupportedOperation {
        domain: &'static str,
        operation: &'static str,
    },

    #[error("empty intervals cannot be compared")]
    EmptyInterval,

    #[error("`{expression}` is not a linear form")]
    NotLinear { expression: String },
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
