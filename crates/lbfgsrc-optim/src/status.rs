//! Reverse-communication status of the minimizer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fatal conditions that stop the minimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Failure {
    /// The line search terminated without an acceptable step
    LineSearch,
    /// A caller-supplied diagonal entry was not positive
    NonPositiveDiagonal,
    /// Problem size, history depth or line search parameters are invalid
    InvalidInput,
}

impl Failure {
    /// Negative status code.
    pub fn code(self) -> i32 {
        match self {
            Self::LineSearch => -1,
            Self::NonPositiveDiagonal => -2,
            Self::InvalidInput => -3,
        }
    }
}

/// What the caller has to do after a call to [`Lbfgs::step`](crate::Lbfgs::step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    /// No call has been made yet
    NotStarted,
    /// `||g|| / max(1, ||x||) ≤ eps` at the last accepted point
    Converged,
    /// Evaluate f and g at the updated `x` and call again
    NeedEvaluation,
    /// Fill the diagonal preconditioner and call again
    NeedDiagonal,
    /// The search direction was not a descent direction; nothing was searched
    DescentRejected,
    /// A fatal condition stopped the run
    Failed(Failure),
}

impl Status {
    /// Integer status code: 0 converged or not started, 1 evaluation
    /// requested, 2 diagonal requested, 3 direction rejected, negative on
    /// failure.
    pub fn code(self) -> i32 {
        match self {
            Self::NotStarted | Self::Converged => 0,
            Self::NeedEvaluation => 1,
            Self::NeedDiagonal => 2,
            Self::DescentRejected => 3,
            Self::Failed(failure) => failure.code(),
        }
    }

    /// Whether the caller is expected to call again with new data.
    pub fn needs_input(self) -> bool {
        matches!(self, Self::NeedEvaluation | Self::NeedDiagonal)
    }

    /// Whether the run has ended, successfully or not.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Converged | Self::DescentRejected | Self::Failed(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::Converged => f.write_str("converged"),
            Self::NeedEvaluation => f.write_str("function and gradient evaluation requested"),
            Self::NeedDiagonal => f.write_str("diagonal preconditioner requested"),
            Self::DescentRejected => f.write_str("search direction rejected"),
            Self::Failed(failure) => write!(f, "failed ({failure:?}, iflag = {})", failure.code()),
        }
    }
}
