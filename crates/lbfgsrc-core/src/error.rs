//! Error types for the L-BFGS minimizer and its line search.
//!
//! Fatal conditions are reported through [`LbfgsError`]. Recoverable
//! conditions (tolerance resets, rejected search directions) are not errors;
//! they are recorded in the optimizer's diagnostic log instead.

use crate::line_search::LineSearchStatus;
use thiserror::Error;

/// Errors that can occur during minimization.
#[derive(Debug, Clone, Error)]
pub enum LbfgsError {
    /// Invalid optimizer configuration.
    ///
    /// Raised on the first call when the problem size or the history depth
    /// is not positive, and when the line search rejects its parameters.
    #[error("Invalid optimizer configuration: {reason} ({parameter} = {value})")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// A caller-supplied diagonal preconditioner entry is not positive.
    #[error(
        "The {index}-th diagonal element of the inverse Hessian approximation is not positive (got {value})"
    )]
    DiagonalNotPositive {
        /// Index of the offending element
        index: usize,
        /// Value that was supplied
        value: f64,
    },

    /// The line search terminated without satisfying the Wolfe conditions.
    #[error(
        "Line search failed ({status}): info = {info}. Possible causes: function or gradient are incorrect, or incorrect tolerances"
    )]
    LineSearchFailed {
        /// Terminal status reported by the line search
        status: LineSearchStatus,
        /// Numeric code of the terminal status
        info: i32,
    },

    /// A vector does not have the problem dimension.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which vector was wrong
        what: String,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// The objective or its gradient could not be evaluated.
    #[error("Objective evaluation failed: {reason}")]
    Evaluation {
        /// Description of the evaluation failure
        reason: String,
    },

    /// The optimizer was called again after a fatal error.
    #[error("Optimizer halted after a fatal error (iflag = {code}); construct a new instance")]
    Halted {
        /// Status code recorded when the optimizer halted
        code: i32,
    },
}

impl LbfgsError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create a DiagonalNotPositive error for element `index`.
    pub fn diagonal_not_positive(index: usize, value: f64) -> Self {
        Self::DiagonalNotPositive { index, value }
    }

    /// Create a LineSearchFailed error from a terminal line search status.
    pub fn line_search_failed(status: LineSearchStatus) -> Self {
        Self::LineSearchFailed {
            status,
            info: status.code(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S: Into<String>>(what: S, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Create an Evaluation error with a custom reason.
    pub fn evaluation<S: Into<String>>(reason: S) -> Self {
        Self::Evaluation {
            reason: reason.into(),
        }
    }
}

/// Result type alias for minimizer operations.
pub type Result<T> = std::result::Result<T, LbfgsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LbfgsError::invalid_configuration("must be positive", "n", "0");
        assert!(matches!(err, LbfgsError::InvalidConfiguration { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid optimizer configuration: must be positive (n = 0)"
        );

        let err = LbfgsError::dimension_mismatch("gradient", 3, 4);
        assert_eq!(
            err.to_string(),
            "Dimension mismatch for gradient: expected 3, got 4"
        );
    }

    #[test]
    fn test_diagonal_error_names_index() {
        let err = LbfgsError::diagonal_not_positive(7, -1.0);
        assert!(err.to_string().starts_with("The 7-th diagonal element"));

        if let LbfgsError::DiagonalNotPositive { index, value } = err {
            assert_eq!(index, 7);
            assert_eq!(value, -1.0);
        } else {
            panic!("Expected DiagonalNotPositive variant");
        }
    }

    #[test]
    fn test_line_search_failure_carries_code() {
        let err = LbfgsError::line_search_failed(LineSearchStatus::MaxEvaluations);
        assert!(matches!(err, LbfgsError::LineSearchFailed { info: 3, .. }));
        let message = err.to_string();
        assert!(message.contains("info = 3"));
        assert!(message.contains("function or gradient are incorrect"));
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            LbfgsError::invalid_configuration("not positive", "m", "0"),
            LbfgsError::diagonal_not_positive(0, 0.0),
            LbfgsError::line_search_failed(LineSearchStatus::RoundingErrors),
            LbfgsError::dimension_mismatch("x", 2, 1),
            LbfgsError::evaluation("NaN in residual"),
            LbfgsError::Halted { code: -1 },
        ];

        for err in errors {
            // Ensure Display trait is implemented and produces non-empty strings
            assert!(!err.to_string().is_empty());
        }
    }
}
