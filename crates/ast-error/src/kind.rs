//! Error kinds for ast-core operations.

use strum_macros::{Display, IntoStaticStr};

/// The kind of error that occurred.
///
/// Mirrors the error taxonomy of the AST framework: most of it is *reported*
/// through the [`crate::Error`] channel for diagnostics that the `Logger`
/// carries per-node, but the handful of core APIs that return `Result`
/// directly (constant parsing, coercion, instruction resolution) use these
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Catch-all for unhandled cases.
    Unexpected,
    /// Requested feature or operation is not supported.
    Unsupported,
    /// Feature or operation not yet implemented.
    NotImplemented,
    /// Invalid argument passed to an API.
    InvalidArgument,
    /// An assertion about internal state failed.
    AssertionFailed,

    /// A pass rejected a node for semantic reasons.
    ValidationFailed,
    /// A requested coercion is not permitted by the contract.
    CoercionFailed,
    /// More than one instruction matched an operand list.
    ResolutionAmbiguous,
    /// No instruction matched an operand list.
    ResolutionFailed,
    /// A graph or node invariant was violated (broken DAG, missing
    /// back-reference, unexpected node kind).
    InvariantViolation,
    /// A constant literal could not be parsed from its source text.
    ConstantParseFailed,
    /// An explicit fatal diagnostic was raised, unwinding the current pass.
    FatalLoggerError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// None of the AST error kinds are retryable; they are all deterministic
    /// consequences of the input AST, not transient environment failures.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_variant_name() {
        assert_eq!(ErrorKind::ValidationFailed.to_string(), "ValidationFailed");
        assert_eq!(ErrorKind::ConstantParseFailed.to_string(), "ConstantParseFailed");
    }

    #[test]
    fn nothing_is_retryable() {
        assert!(!ErrorKind::ResolutionAmbiguous.is_retryable());
        assert!(!ErrorKind::Unexpected.is_retryable());
    }
}
