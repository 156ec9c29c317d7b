//! Errors raised while parsing or rendering templates.

use thiserror::Error;

/// Errors raised by the template renderer. Every variant is fatal to the
/// render call that produced it.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RenderError {
    /// Raised when an interpolation or condition names an absent key.
    #[error("line {line}: missing fixture key `{key}`")]
    MissingKey {
        /// Key referenced by the template.
        key: String,
        /// One-based line of the offending action.
        line: usize,
    },
    /// Raised for unbalanced blocks, unknown actions, or bad syntax.
    #[error("line {line}: malformed template: {message}")]
    Malformed {
        /// One-based line of the offending action.
        line: usize,
        /// Description of the problem.
        message: String,
    },
    /// Raised when `range` is applied to a scalar value.
    #[error("line {line}: `{key}` is not a list and cannot be ranged over")]
    NotIterable {
        /// Key passed to `range`.
        key: String,
        /// One-based line of the `range` action.
        line: usize,
    },
    /// Raised when a list value is interpolated directly.
    #[error("line {line}: `{key}` is a list and cannot be interpolated")]
    NotScalar {
        /// Key holding the list.
        key: String,
        /// One-based line of the interpolation.
        line: usize,
    },
    /// Raised when the template engine rejects the rewritten source or fails
    /// while evaluating it.
    #[error("line {line}: template evaluation failed: {message}")]
    Engine {
        /// One-based line reported by the engine.
        line: usize,
        /// Engine diagnostic.
        message: String,
    },
    /// Raised when `{{.}}` appears outside a `range` body.
    #[error("line {line}: `.` used outside of a range block")]
    DotOutsideRange {
        /// One-based line of the action.
        line: usize,
    },
}

impl RenderError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}
